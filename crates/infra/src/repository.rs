//! # リポジトリ実装
//!
//! 永続化のトレイトと、その PostgreSQL 実装を提供する。
//!
//! ## 設計方針
//!
//! - **トレイト境界**: ユースケース層は `Arc<dyn XxxRepository>` に依存し、テストではモックに差し替える
//! - **条件付き更新**: 経費の状態を変える書き込みは `WHERE id = $1 AND status = 'active'` に限定し、
//!   影響行数で適用されたかどうかを返す。ロックやバージョン番号は使わない

pub mod activity_log_repository;
pub mod expense_repository;
pub mod notification_repository;

pub use activity_log_repository::{ActivityLogRepository, PostgresActivityLogRepository};
pub use expense_repository::{ExpenseRepository, PostgresExpenseRepository};
pub use notification_repository::{NotificationRepository, PostgresNotificationRepository};
