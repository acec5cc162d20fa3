//! テスト共通フィクスチャ
//!
//! DB を使用する統合テストで共通利用する固定値・エンティティ生成ヘルパー。
//! Rust の統合テスト規約に従い `tests/common/mod.rs` に配置。

// 各テストファイルが独立したクレートとしてコンパイルされるため、
// 使用しない関数に dead_code 警告が出る。モジュール全体で抑制する。
#![allow(dead_code)]

use aleya_domain::{
    expense::{
        Cancellation,
        CancellationReason,
        CancellationRequest,
        Expense,
        ExpenseAmount,
        ExpenseCategory,
        ExpenseId,
        NewExpense,
        PaymentMethod,
    },
    user::{ActorName, UserId},
};
use chrono::{DateTime, Duration, NaiveDate, Utc};

/// テスト用の固定日時
pub fn test_now() -> DateTime<Utc> {
    DateTime::from_timestamp(1_736_000_000, 0).unwrap()
}

/// `test_now()` から `minutes` 分後
pub fn minutes_later(minutes: i64) -> DateTime<Utc> {
    test_now() + Duration::minutes(minutes)
}

pub fn date(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 1, day).unwrap()
}

/// デフォルト値で有効な経費を作成
pub fn create_test_expense(date: NaiveDate, now: DateTime<Utc>) -> Expense {
    Expense::new(NewExpense {
        id: ExpenseId::new(),
        store_id: None,
        category: ExpenseCategory::new("Arriendo").unwrap(),
        amount: ExpenseAmount::new(500_000).unwrap(),
        date,
        payment_method: PaymentMethod::Transfer,
        notes: Some("Local principal".to_string()),
        now,
    })
}

pub fn create_test_request(requested_by: &UserId, at: DateTime<Utc>) -> CancellationRequest {
    CancellationRequest {
        requested_at:      at,
        requested_by:      requested_by.clone(),
        requested_by_name: ActorName::new("Laura").unwrap(),
        reason:            CancellationReason::new("Pagado dos veces por error").unwrap(),
    }
}

pub fn create_test_cancellation(cancelled_by: &UserId, at: DateTime<Utc>) -> Cancellation {
    Cancellation {
        cancelled_at:      at,
        cancelled_by:      cancelled_by.clone(),
        cancelled_by_name: Some("Admin".to_string()),
        reason:            CancellationReason::new("Confirmado duplicado, se anula").unwrap(),
    }
}
