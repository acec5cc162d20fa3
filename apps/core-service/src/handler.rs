//! # HTTP リクエストハンドラ
//!
//! axum のルートに対応するハンドラ関数を定義する。
//!
//! ## 設計方針
//!
//! - 各ハンドラはサブモジュールに配置
//! - 親モジュール（この `handler.rs`）で re-export し、フラットな API を提供
//! - ハンドラは薄く保ち、ビジネスロジックはユースケース層に委譲

pub mod expense;
pub mod health;
pub mod notification;

pub use expense::{
    ExpenseState,
    cancel_expense,
    create_expense,
    get_expense,
    list_expense_categories,
    list_expenses,
    list_pending_cancellation_requests,
    reject_cancellation_request,
    request_cancellation,
    update_expense,
};
pub use health::{ReadinessState, health_check, readiness_check};
pub use notification::{
    NotificationState,
    list_notifications,
    mark_all_notifications_as_read,
    mark_notification_as_read,
};
