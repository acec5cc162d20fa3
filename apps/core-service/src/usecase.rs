//! # ユースケース層
//!
//! Core Service のビジネスロジックを実装する。
//!
//! ## 設計方針
//!
//! - **依存性注入**: リポジトリと時刻プロバイダを `Arc<dyn Trait>` で外部から注入
//! - **薄いハンドラ**: ハンドラは薄く保ち、ロジックはユースケースに集約
//! - **副作用は fire-and-forget**: 操作履歴と通知の失敗は主処理の結果に影響しない
//!
//! ## モジュール構成
//!
//! - `expense`: 経費の登録・編集・参照と取消フロー
//! - `notification`: 取消フローの通知と受信箱
//! - `activity`: 操作履歴の記録

pub(crate) mod helpers;

pub mod activity;
pub mod expense;
pub mod notification;

pub use activity::ActivityLogger;
pub use expense::{
    CancelExpenseInput,
    CreateExpenseInput,
    ExpenseUseCaseImpl,
    RejectCancellationInput,
    RequestCancellationInput,
    UpdateExpenseInput,
};
pub use notification::{NotificationInboxUseCaseImpl, NotificationService};
