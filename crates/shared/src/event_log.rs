//! # ビジネスイベントログとエラーコンテキストの構造化ヘルパー
//!
//! `jq` で調査しやすいよう、ログフィールドの命名規約とヘルパーマクロを提供する。
//!
//! ## ビジネスイベント
//!
//! [`log_business_event!`] マクロで出力する。`event.kind = "business_event"` が
//! 自動付与され、`jq 'select(.["event.kind"] == "business_event")'` でフィルタできる。
//!
//! ## エラーコンテキスト
//!
//! `tracing::error!` に `error.category` と `error.kind` フィールドを直接追加する。
//! 定数は [`error`] モジュールで提供。

/// ビジネスイベントを構造化ログとして出力する。
///
/// `event.kind = "business_event"` マーカーを自動付与し、`tracing::info!` レベルで出力する。
/// 呼び出し側のクレートが `tracing` に依存している必要がある。
///
/// ## 必須フィールド（慣例）
///
/// - `event.category`: [`event::category`] の定数
/// - `event.action`: [`event::action`] の定数
/// - `event.result`: [`event::result`] の定数
///
/// ## 推奨フィールド
///
/// - `event.entity_type` / `event.entity_id`: 対象エンティティ
/// - `event.actor_id`: 操作者 ID
#[macro_export]
macro_rules! log_business_event {
    ($($args:tt)*) => {
        ::tracing::info!(
            event.kind = "business_event",
            $($args)*
        )
    };
}

/// イベントフィールドの定数
pub mod event {
    /// イベントカテゴリ
    pub mod category {
        pub const EXPENSE: &str = "expense";
        pub const NOTIFICATION: &str = "notification";
        pub const ACTIVITY: &str = "activity";
    }

    /// イベントアクション
    pub mod action {
        // 経費
        pub const EXPENSE_CREATED: &str = "expense.created";
        pub const EXPENSE_UPDATED: &str = "expense.updated";
        pub const CANCELLATION_REQUESTED: &str = "expense.cancellation_requested";
        pub const EXPENSE_CANCELLED: &str = "expense.cancelled";
        pub const CANCELLATION_REJECTED: &str = "expense.cancellation_rejected";

        // 通知
        pub const NOTIFICATION_CREATED: &str = "notification.created";
        pub const NOTIFICATION_FAILED: &str = "notification.failed";

        // 操作履歴
        pub const ACTIVITY_RECORDED: &str = "activity.recorded";
        pub const ACTIVITY_FAILED: &str = "activity.failed";
    }

    /// エンティティ種別
    pub mod entity_type {
        pub const EXPENSE: &str = "expense";
        pub const NOTIFICATION: &str = "notification";
        pub const ACTIVITY_LOG: &str = "activity_log";
    }

    /// イベント結果
    pub mod result {
        pub const SUCCESS: &str = "success";
        pub const FAILURE: &str = "failure";
        /// 条件付き更新が 0 行だった（既に取消済み・競合で負けた等）
        pub const NOT_APPLIED: &str = "not_applied";
    }
}

/// エラーコンテキストフィールドの定数
pub mod error {
    /// エラーカテゴリ
    pub mod category {
        /// インフラストラクチャ（DB）
        pub const INFRASTRUCTURE: &str = "infrastructure";
        /// 副作用（通知・操作履歴）
        pub const SIDE_EFFECT: &str = "side_effect";
    }

    /// エラー種別
    pub mod kind {
        pub const DATABASE: &str = "database";
        pub const NOTIFICATION: &str = "notification";
        pub const ACTIVITY_LOG: &str = "activity_log";
        pub const INTERNAL: &str = "internal";
    }
}
