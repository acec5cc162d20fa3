//! # Core Service エラー定義
//!
//! Core Service 固有のエラーと、HTTP レスポンスへの変換を定義する。

use aleya_domain::DomainError;
use aleya_infra::InfraError;
use aleya_shared::{ErrorResponse, event_log::error as log_error};
use axum::{
    Json,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// Core Service で発生するエラー
#[derive(Debug, Error)]
pub enum CoreError {
    /// リソースが見つからない
    #[error("リソースが見つかりません: {0}")]
    NotFound(String),

    /// 不正なリクエスト（バリデーションエラーを含む）
    #[error("不正なリクエスト: {0}")]
    BadRequest(String),

    /// 権限不足
    #[error("権限がありません: {0}")]
    Forbidden(String),

    /// 競合（取消済み・条件付き更新が適用されなかった）
    #[error("競合が発生しました: {0}")]
    Conflict(String),

    /// データベースエラー
    #[error("データベースエラー: {0}")]
    Database(#[from] InfraError),

    /// 内部エラー
    #[error("内部エラー: {0}")]
    Internal(String),
}

impl From<DomainError> for CoreError {
    fn from(e: DomainError) -> Self {
        match e {
            DomainError::Validation(msg) => Self::BadRequest(msg),
            DomainError::NotFound { entity_type, id } => {
                Self::NotFound(format!("{entity_type} が見つかりません: {id}"))
            }
            DomainError::Conflict(msg) => Self::Conflict(msg),
            DomainError::Forbidden(msg) => Self::Forbidden(msg),
        }
    }
}

impl IntoResponse for CoreError {
    fn into_response(self) -> Response {
        let body = match &self {
            CoreError::NotFound(msg) => ErrorResponse::not_found(msg.clone()),
            CoreError::BadRequest(msg) => ErrorResponse::validation_error(msg.clone()),
            CoreError::Forbidden(msg) => ErrorResponse::forbidden(msg.clone()),
            CoreError::Conflict(msg) => ErrorResponse::conflict(msg.clone()),
            CoreError::Database(e) => {
                tracing::error!(
                    error.category = log_error::category::INFRASTRUCTURE,
                    error.kind = log_error::kind::DATABASE,
                    span_trace = %e.span_trace(),
                    "データベースエラー: {}",
                    e
                );
                ErrorResponse::internal_error()
            }
            CoreError::Internal(msg) => {
                tracing::error!(
                    error.category = log_error::category::INFRASTRUCTURE,
                    error.kind = log_error::kind::INTERNAL,
                    "内部エラー: {}",
                    msg
                );
                ErrorResponse::internal_error()
            }
        };

        let status =
            StatusCode::from_u16(body.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (
            status,
            [(header::CONTENT_TYPE, "application/problem+json")],
            Json(body),
        )
            .into_response()
    }
}
