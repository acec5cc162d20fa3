//! # API レスポンスエンベロープ
//!
//! 成功レスポンスの統一形式 `{ "data": T }` を提供する。

use serde::{Deserialize, Serialize};

/// 統一レスポンス型
///
/// Core Service の全エンドポイントは成功時に `{ "data": T }` 形式で返す。
///
/// ```
/// use aleya_shared::ApiResponse;
///
/// let response = ApiResponse::new(vec!["Arriendo", "Flete"]);
/// assert_eq!(response.data.len(), 2);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub data: T,
}

impl<T> ApiResponse<T> {
    pub fn new(data: T) -> Self {
        Self { data }
    }
}
