//! # 経費ユースケース
//!
//! 経費の登録・編集・参照と、取消フロー（申請・承認・却下）を実装する。
//!
//! ## モジュール構成
//!
//! - `command`: 登録・編集
//! - `cancellation`: 取消申請・取消確定・申請の却下
//! - `query`: 参照系（一覧・承認待ち一覧）
//!
//! ## 書き込みの方針
//!
//! 取消フローの書き込みは `status = 'active'` を条件にした単一の UPDATE で行い、
//! 0 行だった場合やインフラエラーの場合は `Ok(false)` を返す。
//! `Err` は入力のバリデーションエラーに限る。
//! 操作履歴と通知は書き込みが成功した後に fire-and-forget で行う。

mod cancellation;
mod command;
mod query;

use std::sync::Arc;

use aleya_domain::{clock::Clock, store::StoreId, user::UserId};
use aleya_infra::repository::ExpenseRepository;
use chrono::NaiveDate;

use super::{activity::ActivityLogger, notification::NotificationService};
use crate::config::CancellationConfig;

/// 経費登録の入力
#[derive(Debug, Clone)]
pub struct CreateExpenseInput {
    pub store_id:       Option<StoreId>,
    pub category:       String,
    pub amount:         i64,
    pub date:           NaiveDate,
    pub payment_method: String,
    pub notes:          Option<String>,
    /// 操作者（指定した場合のみ操作履歴を記録する）
    pub actor_id:       Option<UserId>,
}

/// 経費編集の入力
///
/// `None` のフィールドは変更しない。`store_id` と `notes` は `Some(None)` で消去する。
#[derive(Debug, Clone, Default)]
pub struct UpdateExpenseInput {
    pub store_id:       Option<Option<StoreId>>,
    pub category:       Option<String>,
    pub amount:         Option<i64>,
    pub date:           Option<NaiveDate>,
    pub payment_method: Option<String>,
    pub notes:          Option<Option<String>>,
    pub actor_id:       Option<UserId>,
}

/// 取消申請の入力
#[derive(Debug, Clone)]
pub struct RequestCancellationInput {
    pub reason:         String,
    pub requester_id:   UserId,
    pub requester_name: String,
}

/// 取消確定の入力（直接取消・申請の承認）
#[derive(Debug, Clone)]
pub struct CancelExpenseInput {
    pub reason:     String,
    pub actor_id:   UserId,
    pub actor_name: Option<String>,
}

/// 取消申請の却下の入力
#[derive(Debug, Clone, Default)]
pub struct RejectCancellationInput {
    /// 却下した操作者（却下の操作履歴を有効にしている場合に記録する）
    pub actor_id: Option<UserId>,
}

/// 経費ユースケース実装
pub struct ExpenseUseCaseImpl {
    expense_repo: Arc<dyn ExpenseRepository>,
    activity:     ActivityLogger,
    notification: NotificationService,
    clock:        Arc<dyn Clock>,
    config:       CancellationConfig,
}

impl ExpenseUseCaseImpl {
    pub fn new(
        expense_repo: Arc<dyn ExpenseRepository>,
        activity: ActivityLogger,
        notification: NotificationService,
        clock: Arc<dyn Clock>,
        config: CancellationConfig,
    ) -> Self {
        Self {
            expense_repo,
            activity,
            notification,
            clock,
            config,
        }
    }
}
