//! # エラーレスポンス（RFC 7807 Problem Details）
//!
//! - `ErrorResponse` は純粋なデータ構造（`Serialize` / `Deserialize` のみ）
//! - axum の `IntoResponse` 変換は core-service の責務
//! - よく使うエラー種別は便利コンストラクタで提供する

use serde::{Deserialize, Serialize};

/// error_type URI のベースパス
const ERROR_TYPE_BASE: &str = "https://aleya-shop.example.com/errors";

/// エラーレスポンス
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    #[serde(rename = "type")]
    pub error_type: String,
    pub title:      String,
    pub status:     u16,
    pub detail:     String,
}

impl ErrorResponse {
    /// 汎用コンストラクタ
    ///
    /// `error_type_suffix` はベース URI に付加される（例: `"cancellation-not-applied"`）。
    pub fn new(
        error_type_suffix: &str,
        title: impl Into<String>,
        status: u16,
        detail: impl Into<String>,
    ) -> Self {
        Self {
            error_type: format!("{ERROR_TYPE_BASE}/{error_type_suffix}"),
            title: title.into(),
            status,
            detail: detail.into(),
        }
    }

    /// 400 Bad Request
    pub fn bad_request(detail: impl Into<String>) -> Self {
        Self::new("bad-request", "Bad Request", 400, detail)
    }

    /// 400 Validation Error
    pub fn validation_error(detail: impl Into<String>) -> Self {
        Self::new("validation-error", "Validation Error", 400, detail)
    }

    /// 403 Forbidden
    pub fn forbidden(detail: impl Into<String>) -> Self {
        Self::new("forbidden", "Forbidden", 403, detail)
    }

    /// 404 Not Found
    pub fn not_found(detail: impl Into<String>) -> Self {
        Self::new("not-found", "Not Found", 404, detail)
    }

    /// 409 Conflict
    pub fn conflict(detail: impl Into<String>) -> Self {
        Self::new("conflict", "Conflict", 409, detail)
    }

    /// 500 Internal Server Error
    ///
    /// detail は固定値（内部情報を漏らさないため）。
    pub fn internal_error() -> Self {
        Self::new(
            "internal-error",
            "Internal Server Error",
            500,
            "内部エラーが発生しました",
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_jsonではerror_typeがtypeキーになる() {
        let error = ErrorResponse::conflict("取消を適用できませんでした");
        let json = serde_json::to_value(&error).unwrap();

        assert_eq!(
            json,
            serde_json::json!({
                "type": "https://aleya-shop.example.com/errors/conflict",
                "title": "Conflict",
                "status": 409,
                "detail": "取消を適用できませんでした",
            })
        );
    }

    #[test]
    fn test_便利コンストラクタのstatus() {
        assert_eq!(ErrorResponse::bad_request("").status, 400);
        assert_eq!(ErrorResponse::validation_error("").status, 400);
        assert_eq!(ErrorResponse::forbidden("").status, 403);
        assert_eq!(ErrorResponse::not_found("").status, 404);
        assert_eq!(ErrorResponse::conflict("").status, 409);
        assert_eq!(ErrorResponse::internal_error().status, 500);
    }

    #[test]
    fn test_internal_errorのdetailは固定文言() {
        assert_eq!(
            ErrorResponse::internal_error().detail,
            "内部エラーが発生しました"
        );
    }
}
