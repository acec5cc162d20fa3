//! # 通知
//!
//! アプリ内通知（ベルアイコンの受信箱）のドメインモデル。
//!
//! 取消フローでは、申請の承認・却下のタイミングで申請者に通知する。
//! 申請時点では通知しない。
//!
//! ## 設計方針
//!
//! - **enum による通知イベント**: [`ExpenseNotification`] の各バリアントが通知種別に対応
//! - **fire-and-forget**: 通知作成の失敗は取消操作の結果に影響しない
//! - **文面はドメインで生成**: 店舗スタッフ向けのスペイン語の文面をここで組み立てる

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Value as JsonValue, json};
use strum::IntoStaticStr;

use crate::{
    DomainError,
    expense::{ExpenseAmount, ExpenseId},
    user::UserId,
};

define_uuid_id! {
    /// 通知 ID
    pub struct NotificationId;
}

/// 通知種別
///
/// notifications テーブルの `type` カラムに格納される値。
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, IntoStaticStr, strum::Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum NotificationType {
    /// 取消申請が承認された
    ExpenseCancellationApproved,
    /// 取消申請が却下された
    ExpenseCancellationRejected,
}

impl std::str::FromStr for NotificationType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "expense_cancellation_approved" => Ok(Self::ExpenseCancellationApproved),
            "expense_cancellation_rejected" => Ok(Self::ExpenseCancellationRejected),
            _ => Err(DomainError::Validation(format!("不正な通知種別: {s}"))),
        }
    }
}

/// 通知エンティティ
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub id: NotificationId,
    /// 受信者
    pub user_id: UserId,
    pub notification_type: NotificationType,
    pub title: String,
    pub message: Option<String>,
    pub metadata: Option<JsonValue>,
    /// 未読の間は `None`
    pub read_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// 通知の作成パラメータ
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewNotification {
    pub user_id: UserId,
    pub notification_type: NotificationType,
    pub title: String,
    pub message: Option<String>,
    pub metadata: Option<JsonValue>,
}

impl Notification {
    /// 未読の通知を作成する
    pub fn new(id: NotificationId, params: NewNotification, now: DateTime<Utc>) -> Self {
        Self {
            id,
            user_id: params.user_id,
            notification_type: params.notification_type,
            title: params.title,
            message: params.message,
            metadata: params.metadata,
            read_at: None,
            created_at: now,
        }
    }

    pub fn is_read(&self) -> bool {
        self.read_at.is_some()
    }

    /// 既読にした通知を返す。既読済みなら既読日時は変えない。
    pub fn marked_as_read(self, now: DateTime<Utc>) -> Self {
        Self {
            read_at: self.read_at.or(Some(now)),
            ..self
        }
    }
}

/// 取消フローの通知イベント
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExpenseNotification {
    /// 承認: 取消が確定した → 申請者に送信
    CancellationApproved {
        expense_id:   ExpenseId,
        category:     String,
        amount:       ExpenseAmount,
        requester_id: UserId,
    },
    /// 却下: 申請が取り下げられ経費は有効のまま → 申請者に送信
    CancellationRejected {
        expense_id:   ExpenseId,
        category:     String,
        amount:       ExpenseAmount,
        requester_id: UserId,
    },
}

impl ExpenseNotification {
    pub fn notification_type(&self) -> NotificationType {
        match self {
            Self::CancellationApproved { .. } => NotificationType::ExpenseCancellationApproved,
            Self::CancellationRejected { .. } => NotificationType::ExpenseCancellationRejected,
        }
    }

    /// 受信者（取消申請者）
    pub fn recipient(&self) -> &UserId {
        match self {
            Self::CancellationApproved { requester_id, .. }
            | Self::CancellationRejected { requester_id, .. } => requester_id,
        }
    }

    pub fn expense_id(&self) -> &ExpenseId {
        match self {
            Self::CancellationApproved { expense_id, .. }
            | Self::CancellationRejected { expense_id, .. } => expense_id,
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Self::CancellationApproved { .. } => "Anulación de egreso aprobada",
            Self::CancellationRejected { .. } => "Solicitud de anulación rechazada",
        }
    }

    pub fn message(&self) -> String {
        match self {
            Self::CancellationApproved {
                category, amount, ..
            } => format!(
                "Tu solicitud de anulación del egreso \"{category}\" ({}) fue aprobada.",
                format_cop(*amount)
            ),
            Self::CancellationRejected {
                category, amount, ..
            } => format!(
                "Tu solicitud de anulación del egreso \"{category}\" ({}) fue rechazada.",
                format_cop(*amount)
            ),
        }
    }

    /// 通知に添えるメタデータ（画面から経費へ遷移するために使う）
    pub fn metadata(&self) -> JsonValue {
        match self {
            Self::CancellationApproved {
                expense_id,
                category,
                amount,
                ..
            } => json!({
                "expenseId": expense_id,
                "category": category,
                "amount": amount,
            }),
            Self::CancellationRejected { expense_id, .. } => json!({
                "expenseId": expense_id,
            }),
        }
    }

    /// 永続化用の作成パラメータに変換する
    pub fn to_new_notification(&self) -> NewNotification {
        NewNotification {
            user_id: self.recipient().clone(),
            notification_type: self.notification_type(),
            title: self.title().to_string(),
            message: Some(self.message()),
            metadata: Some(self.metadata()),
        }
    }
}

/// 金額をコロンビアペソ表記（es-CO）に整形する
///
/// `$` + ノーブレークスペース + `.` 区切りの整数。例: `$ 500.000`
pub fn format_cop(amount: ExpenseAmount) -> String {
    let digits: Vec<char> = amount.as_i64().to_string().chars().collect();
    let groups: Vec<String> = digits
        .rchunks(3)
        .rev()
        .map(|group| group.iter().collect())
        .collect();
    format!("$\u{a0}{}", groups.join("."))
}
