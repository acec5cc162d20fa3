//! # Aleya 共有ユーティリティ
//!
//! ワークスペース全体で使う共通ユーティリティを提供する。
//!
//! ## 設計方針
//!
//! - 他のすべてのクレート（domain, infra, core-service）から依存される
//! - ビジネスロジックを含まない純粋なユーティリティのみを配置
//! - axum などの Web フレームワークには依存しない

pub mod api_response;
pub mod error_response;
pub mod event_log;
pub mod health;
pub mod observability;

pub use api_response::ApiResponse;
pub use error_response::ErrorResponse;
pub use health::{CheckStatus, HealthResponse, ReadinessResponse, ReadinessStatus};
