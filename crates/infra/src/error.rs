//! # インフラ層エラー定義
//!
//! データベースとの通信や、保存データの復元で発生するエラーを表現する。
//!
//! ## 構造
//!
//! `std::io::Error` と同じ struct + enum パターンを採用:
//! - [`InfraError`]: エラー種別（[`InfraErrorKind`]）と [`SpanTrace`] を保持するラッパー
//! - [`InfraErrorKind`]: エラーの具体的な種別
//!
//! `From` 実装や convenience constructor でエラーを生成すると、
//! その時点のスパン（リポジトリメソッドの `#[tracing::instrument]`）が記録される。

use std::fmt;

use derive_more::Display;
use thiserror::Error;
use tracing_error::SpanTrace;

/// インフラ層で発生するエラー
#[derive(Display)]
#[display("{kind}")]
pub struct InfraError {
    kind:       InfraErrorKind,
    span_trace: SpanTrace,
}

/// インフラ層エラーの種別
#[derive(Debug, Error)]
pub enum InfraErrorKind {
    /// データベースエラー
    ///
    /// 接続失敗、タイムアウト、SQL 実行エラー、制約違反など。
    #[error("データベースエラー: {0}")]
    Database(#[source] sqlx::Error),

    /// シリアライズ/デシリアライズエラー
    ///
    /// JSONB カラム（通知メタデータ、操作履歴の詳細）の変換に失敗した場合。
    #[error("シリアライズエラー: {0}")]
    Serialization(#[source] serde_json::Error),

    /// 保存データの不整合
    ///
    /// DB の行をドメインモデルに復元できなかった場合
    /// （例: cancelled なのに cancellation_reason が NULL）。
    #[error("不正な保存データ: {0}")]
    InvalidData(String),

    /// 予期しないエラー
    #[error("予期しないエラー: {0}")]
    Unexpected(String),
}

impl InfraError {
    pub fn kind(&self) -> &InfraErrorKind {
        &self.kind
    }

    pub fn span_trace(&self) -> &SpanTrace {
        &self.span_trace
    }

    /// 保存データの不整合エラーを生成する
    pub fn invalid_data(msg: impl Into<String>) -> Self {
        Self {
            kind:       InfraErrorKind::InvalidData(msg.into()),
            span_trace: SpanTrace::capture(),
        }
    }

    /// 予期しないエラーを生成する
    pub fn unexpected(msg: impl Into<String>) -> Self {
        Self {
            kind:       InfraErrorKind::Unexpected(msg.into()),
            span_trace: SpanTrace::capture(),
        }
    }
}

impl fmt::Debug for InfraError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InfraError")
            .field("kind", &self.kind)
            .field("span_trace", &self.span_trace)
            .finish()
    }
}

impl std::error::Error for InfraError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.kind.source()
    }
}

// ===== From 実装（SpanTrace 自動キャプチャ） =====

impl From<sqlx::Error> for InfraError {
    fn from(source: sqlx::Error) -> Self {
        Self {
            kind:       InfraErrorKind::Database(source),
            span_trace: SpanTrace::capture(),
        }
    }
}

impl From<serde_json::Error> for InfraError {
    fn from(source: serde_json::Error) -> Self {
        Self {
            kind:       InfraErrorKind::Serialization(source),
            span_trace: SpanTrace::capture(),
        }
    }
}

impl From<aleya_domain::DomainError> for InfraError {
    fn from(source: aleya_domain::DomainError) -> Self {
        Self::invalid_data(source.to_string())
    }
}

#[cfg(test)]
mod tests {
    use tracing_subscriber::layer::SubscriberExt as _;

    use super::*;

    /// テスト用に ErrorLayer 付き subscriber を設定する
    fn with_error_layer(f: impl FnOnce()) {
        let subscriber = tracing_subscriber::registry().with(tracing_error::ErrorLayer::default());
        let _guard = tracing::subscriber::set_default(subscriber);
        f();
    }

    #[test]
    fn test_from_sqlx_errorでspan_traceがキャプチャされる() {
        with_error_layer(|| {
            let span = tracing::info_span!("expense_repo_cancel");
            let _enter = span.enter();

            let err: InfraError = sqlx::Error::PoolTimedOut.into();

            assert!(matches!(err.kind(), InfraErrorKind::Database(_)));
            let trace_str = format!("{}", err.span_trace());
            assert!(
                trace_str.contains("expense_repo_cancel"),
                "SpanTrace がスパン名を含むこと: {trace_str}",
            );
        });
    }

    #[test]
    fn test_from_serde_json_errorはserializationになる() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();

        let err: InfraError = json_err.into();

        assert!(matches!(err.kind(), InfraErrorKind::Serialization(_)));
    }

    #[test]
    fn test_domain_errorは不正な保存データとして扱う() {
        let domain_err =
            aleya_domain::DomainError::Validation("取消済みの経費には cancelled_at が必要です".into());

        let err: InfraError = domain_err.into();

        assert!(matches!(err.kind(), InfraErrorKind::InvalidData(_)));
        assert!(format!("{err}").starts_with("不正な保存データ"));
    }

    #[test]
    fn test_sourceがinfra_error_kindに委譲する() {
        use std::error::Error;

        let err: InfraError = sqlx::Error::RowNotFound.into();

        assert!(err.source().is_some());
    }
}
