//! # 操作履歴（アクティビティログ）
//!
//! 誰がどの経費に何をしたかを追記専用で記録する。
//!
//! | アクション | 記録タイミング |
//! |-----------|---------------|
//! | `expense_create` | 経費の登録 |
//! | `expense_update` | 経費の編集 |
//! | `expense_cancel` | 取消の確定（直接取消・申請の承認） |
//! | `expense_cancellation_reject` | 申請の却下（設定で有効化した場合のみ） |

use chrono::{DateTime, Utc};
use serde_json::Value as JsonValue;
use strum::IntoStaticStr;

use crate::{DomainError, user::UserId};

define_uuid_id! {
    /// 操作履歴 ID
    pub struct ActivityLogId;
}

/// 経費モジュールを表すモジュールタグ
pub const EXPENSES_MODULE: &str = "egresos";

/// 記録対象のアクション
#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoStaticStr, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum ActivityAction {
    ExpenseCreate,
    ExpenseUpdate,
    ExpenseCancel,
    ExpenseCancellationReject,
}

impl std::str::FromStr for ActivityAction {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "expense_create" => Ok(Self::ExpenseCreate),
            "expense_update" => Ok(Self::ExpenseUpdate),
            "expense_cancel" => Ok(Self::ExpenseCancel),
            "expense_cancellation_reject" => Ok(Self::ExpenseCancellationReject),
            _ => Err(DomainError::Validation(format!("不明な操作履歴アクション: {s}"))),
        }
    }
}

/// 操作履歴エンティティ
///
/// 一度作成されたら変更されない。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivityLog {
    pub id: ActivityLogId,
    /// 操作者
    pub user_id: UserId,
    pub action: ActivityAction,
    pub module: String,
    /// 人が読める `description` と対象の `expenseId` を必ず含む
    pub details: JsonValue,
    pub created_at: DateTime<Utc>,
}

impl ActivityLog {
    /// 経費モジュールの操作履歴を作成する
    pub fn for_expenses(
        user_id: UserId,
        action: ActivityAction,
        details: JsonValue,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: ActivityLogId::new(),
            user_id,
            action,
            module: EXPENSES_MODULE.to_string(),
            details,
            created_at: now,
        }
    }
}
