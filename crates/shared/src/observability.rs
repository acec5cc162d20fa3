//! # Observability 基盤
//!
//! トレーシング初期化とログ出力形式の設定を提供する。
//! 環境変数 `LOG_FORMAT` による JSON / Pretty 出力の切り替えに対応する。

/// `RUST_LOG` 未設定時のフィルタ
pub const DEFAULT_ENV_FILTER: &str = "info,aleya=debug";

/// ログ出力形式
///
/// 値が未設定または不正な場合は [`Pretty`](LogFormat::Pretty) にフォールバックする。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// JSON 形式（本番環境向け）
    Json,
    /// 人間が読みやすい形式（開発環境向け）
    #[default]
    Pretty,
}

impl LogFormat {
    /// 文字列からログ形式をパースする
    ///
    /// トレーシング初期化前に呼ばれるため、不正値の警告は stderr に直接出す。
    pub fn parse(s: &str) -> Self {
        match s {
            "json" => Self::Json,
            "pretty" => Self::Pretty,
            other => {
                eprintln!("WARNING: unknown LOG_FORMAT={other:?}, falling back to pretty");
                Self::Pretty
            }
        }
    }

    /// 環境変数 `LOG_FORMAT` から読み取る
    pub fn from_env() -> Self {
        std::env::var("LOG_FORMAT")
            .map(|val| Self::parse(&val))
            .unwrap_or_default()
    }
}

/// トレーシング初期化設定
#[derive(Debug, Clone)]
pub struct TracingConfig {
    /// サービス名（起動ログとルートスパンに使う）
    pub service_name: String,
    pub log_format:   LogFormat,
}

impl TracingConfig {
    pub fn new(service_name: impl Into<String>, log_format: LogFormat) -> Self {
        Self {
            service_name: service_name.into(),
            log_format,
        }
    }

    /// 環境変数 `LOG_FORMAT` から設定を読み取る
    pub fn from_env(service_name: impl Into<String>) -> Self {
        Self::new(service_name, LogFormat::from_env())
    }
}

/// トレーシングを初期化する
///
/// `RUST_LOG` でログレベルを制御する。未設定なら [`DEFAULT_ENV_FILTER`]。
/// `ErrorLayer` を登録し、`InfraError` が捕捉する SpanTrace を有効にする。
#[cfg(feature = "observability")]
pub fn init_tracing(config: TracingConfig) {
    use tracing_subscriber::{Layer as _, layer::SubscriberExt, util::SubscriberInitExt};

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| DEFAULT_ENV_FILTER.into());

    let fmt_layer = match config.log_format {
        LogFormat::Json => tracing_subscriber::fmt::layer()
            .json()
            .flatten_event(true)
            .with_target(true)
            .with_current_span(true)
            .with_span_list(false)
            .boxed(),
        LogFormat::Pretty => tracing_subscriber::fmt::layer().boxed(),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .with(tracing_error::ErrorLayer::default())
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parseはjsonとprettyを認識する() {
        assert_eq!(LogFormat::parse("json"), LogFormat::Json);
        assert_eq!(LogFormat::parse("pretty"), LogFormat::Pretty);
    }

    #[test]
    fn test_parseは不正な値でprettyにフォールバックする() {
        assert_eq!(LogFormat::parse("JSON"), LogFormat::Pretty);
        assert_eq!(LogFormat::parse(""), LogFormat::Pretty);
    }

    #[test]
    fn test_tracing_configのフィールド() {
        let config = TracingConfig::new("core-service", LogFormat::Json);

        assert_eq!(config.service_name, "core-service");
        assert_eq!(config.log_format, LogFormat::Json);
    }
}
