//! # Core Service 設定
//!
//! 環境変数から Core Service サーバーの設定を読み込む。

use std::env;

use anyhow::Context as _;

/// 接続プールの既定の最大接続数
const DEFAULT_MAX_CONNECTIONS: u32 = 10;

/// Core Service サーバーの設定
#[derive(Debug, Clone)]
pub struct CoreConfig {
    /// バインドアドレス
    pub host: String,
    /// ポート番号
    pub port: u16,
    /// データベース接続 URL
    pub database_url: String,
    /// 接続プールの最大接続数
    pub max_connections: u32,
    /// 取消フローの設定
    pub cancellation: CancellationConfig,
}

/// 取消フローの設定
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CancellationConfig {
    /// 取消申請の却下も操作履歴に記録するか（`CANCELLATION_AUDIT_REJECTIONS`）
    pub audit_rejections: bool,
}

impl CoreConfig {
    /// 環境変数から設定を読み込む
    pub fn from_env() -> anyhow::Result<Self> {
        let port = env::var("CORE_PORT")
            .context("CORE_PORT が設定されていません")?
            .parse()
            .context("CORE_PORT は有効なポート番号である必要があります")?;
        let max_connections = match env::var("DATABASE_MAX_CONNECTIONS") {
            Ok(value) => value
                .parse()
                .context("DATABASE_MAX_CONNECTIONS は正の整数である必要があります")?,
            Err(_) => DEFAULT_MAX_CONNECTIONS,
        };

        Ok(Self {
            host: env::var("CORE_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port,
            database_url: env::var("DATABASE_URL").context("DATABASE_URL が設定されていません")?,
            max_connections,
            cancellation: CancellationConfig::from_env(),
        })
    }
}

impl CancellationConfig {
    fn from_env() -> Self {
        Self {
            audit_rejections: env::var("CANCELLATION_AUDIT_REJECTIONS")
                .map(|v| parse_flag(&v))
                .unwrap_or(false),
        }
    }
}

/// `true` / `1` / `yes` / `on` を真として扱う（大文字小文字は区別しない）
fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "true" | "1" | "yes" | "on"
    )
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("true", true)]
    #[case("TRUE", true)]
    #[case(" 1 ", true)]
    #[case("yes", true)]
    #[case("on", true)]
    #[case("false", false)]
    #[case("0", false)]
    #[case("", false)]
    #[case("si", false)]
    fn test_フラグの解釈(#[case] value: &str, #[case] expected: bool) {
        assert_eq!(parse_flag(value), expected);
    }

    #[test]
    fn test_取消フロー設定の既定値は却下を記録しない() {
        assert!(!CancellationConfig::default().audit_rejections);
    }
}
