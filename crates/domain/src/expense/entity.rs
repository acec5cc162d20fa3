//! # 経費エンティティ
//!
//! 取消フローの状態は ADT（代数的データ型）で表現し、
//! 「取消理由があるのは取消済みのときだけ」といった不変条件を型で保証する。
//!
//! 永続化されるステータスは `active` / `cancelled` の 2 値のみで、
//! 「取消申請中」は有効な経費に申請情報が付いている状態として表す。

use std::cmp::Ordering;

use chrono::{DateTime, NaiveDate, Utc};

use super::{
    Cancellation,
    CancellationReason,
    CancellationRequest,
    ExpenseAmount,
    ExpenseCategory,
    ExpenseStatus,
    PaymentMethod,
};
use crate::{
    DomainError,
    store::StoreId,
    user::{ActorName, UserId},
};

define_uuid_id! {
    /// 経費 ID
    pub struct ExpenseId;
}

/// 経費の取消フロー状態（ADT ベースステートマシン）
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExpenseState {
    /// 有効（取消申請なし）
    Active,
    /// 有効だが取消申請中
    PendingCancellation(CancellationRequest),
    /// 取消済み（終端）
    Cancelled(CancelledState),
}

/// Cancelled 状態の固有フィールド
///
/// 申請を経た取消では申請側の記録を履歴として残す。直接取消では `request` は `None`。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CancelledState {
    pub request:      Option<CancellationRequest>,
    pub cancellation: Cancellation,
}

/// 経費エンティティ
///
/// 共通フィールドを外側に、取消フロー固有のフィールドを `state` に分離している。
/// 状態遷移メソッドは `self` を消費して新しいインスタンスを返す。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expense {
    id: ExpenseId,
    store_id: Option<StoreId>,
    category: ExpenseCategory,
    amount: ExpenseAmount,
    date: NaiveDate,
    payment_method: PaymentMethod,
    notes: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    state: ExpenseState,
}

/// 経費の新規作成パラメータ
pub struct NewExpense {
    pub id: ExpenseId,
    pub store_id: Option<StoreId>,
    pub category: ExpenseCategory,
    pub amount: ExpenseAmount,
    pub date: NaiveDate,
    pub payment_method: PaymentMethod,
    pub notes: Option<String>,
    pub now: DateTime<Utc>,
}

/// 経費の部分更新内容
///
/// `None` のフィールドは変更しない。`store_id` と `notes` は
/// `Some(None)` で値を消去する。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExpenseChanges {
    pub store_id: Option<Option<StoreId>>,
    pub category: Option<ExpenseCategory>,
    pub amount: Option<ExpenseAmount>,
    pub date: Option<NaiveDate>,
    pub payment_method: Option<PaymentMethod>,
    pub notes: Option<Option<String>>,
}

impl ExpenseChanges {
    pub fn is_empty(&self) -> bool {
        self.changed_fields().is_empty()
    }

    /// 変更対象のフィールド名（API の JSON キー名）
    pub fn changed_fields(&self) -> Vec<&'static str> {
        [
            ("storeId", self.store_id.is_some()),
            ("category", self.category.is_some()),
            ("amount", self.amount.is_some()),
            ("date", self.date.is_some()),
            ("paymentMethod", self.payment_method.is_some()),
            ("notes", self.notes.is_some()),
        ]
        .into_iter()
        .filter_map(|(name, changed)| changed.then_some(name))
        .collect()
    }
}

/// 経費の DB 復元パラメータ
///
/// DB スキーマのフラット構造を表現する。`from_db()` で不変条件を検証して ADT に変換する。
pub struct ExpenseRecord {
    pub id: ExpenseId,
    pub store_id: Option<StoreId>,
    pub category: ExpenseCategory,
    pub amount: ExpenseAmount,
    pub date: NaiveDate,
    pub payment_method: PaymentMethod,
    pub notes: Option<String>,
    pub status: ExpenseStatus,
    pub cancellation_requested_at: Option<DateTime<Utc>>,
    pub cancellation_requested_by: Option<UserId>,
    pub cancellation_requested_by_name: Option<String>,
    pub cancellation_request_reason: Option<String>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub cancelled_by: Option<UserId>,
    pub cancelled_by_name: Option<String>,
    pub cancellation_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// 空白のみのメモは「メモなし」として扱う
pub fn normalize_notes(notes: Option<String>) -> Option<String> {
    notes.filter(|n| !n.trim().is_empty())
}

fn cancelled_conflict() -> DomainError {
    DomainError::Conflict("取消済みの経費は変更できません".to_string())
}

impl Expense {
    /// 新しい経費を作成する（有効・申請なし）
    pub fn new(params: NewExpense) -> Self {
        Self {
            id: params.id,
            store_id: params.store_id,
            category: params.category,
            amount: params.amount,
            date: params.date,
            payment_method: params.payment_method,
            notes: normalize_notes(params.notes),
            created_at: params.now,
            updated_at: params.now,
            state: ExpenseState::Active,
        }
    }

    /// 既存のデータから復元する
    ///
    /// # Errors
    ///
    /// - `DomainError::Validation`: 不変条件違反
    ///   （例: cancelled なのに cancellation_reason が無い、active なのに cancelled_at がある）
    pub fn from_db(record: ExpenseRecord) -> Result<Self, DomainError> {
        let request = match record.cancellation_requested_at {
            Some(requested_at) => {
                let requested_by = record.cancellation_requested_by.ok_or_else(|| {
                    DomainError::Validation(
                        "取消申請中の経費には cancellation_requested_by が必要です".to_string(),
                    )
                })?;
                let requested_by_name = record
                    .cancellation_requested_by_name
                    .ok_or_else(|| {
                        DomainError::Validation(
                            "取消申請中の経費には cancellation_requested_by_name が必要です"
                                .to_string(),
                        )
                    })
                    .and_then(ActorName::new)?;
                let reason = record
                    .cancellation_request_reason
                    .ok_or_else(|| {
                        DomainError::Validation(
                            "取消申請中の経費には cancellation_request_reason が必要です"
                                .to_string(),
                        )
                    })
                    .and_then(CancellationReason::new)?;
                Some(CancellationRequest {
                    requested_at,
                    requested_by,
                    requested_by_name,
                    reason,
                })
            }
            None => None,
        };

        let state = match record.status {
            ExpenseStatus::Active => {
                if record.cancelled_at.is_some()
                    || record.cancelled_by.is_some()
                    || record.cancellation_reason.is_some()
                {
                    return Err(DomainError::Validation(
                        "有効な経費に取消確定の情報が含まれています".to_string(),
                    ));
                }
                match request {
                    Some(request) => ExpenseState::PendingCancellation(request),
                    None => ExpenseState::Active,
                }
            }
            ExpenseStatus::Cancelled => {
                let cancelled_at = record.cancelled_at.ok_or_else(|| {
                    DomainError::Validation(
                        "取消済みの経費には cancelled_at が必要です".to_string(),
                    )
                })?;
                let cancelled_by = record.cancelled_by.ok_or_else(|| {
                    DomainError::Validation(
                        "取消済みの経費には cancelled_by が必要です".to_string(),
                    )
                })?;
                let reason = record
                    .cancellation_reason
                    .ok_or_else(|| {
                        DomainError::Validation(
                            "取消済みの経費には cancellation_reason が必要です".to_string(),
                        )
                    })
                    .and_then(CancellationReason::new)?;
                ExpenseState::Cancelled(CancelledState {
                    request,
                    cancellation: Cancellation {
                        cancelled_at,
                        cancelled_by,
                        cancelled_by_name: record
                            .cancelled_by_name
                            .filter(|name| !name.trim().is_empty()),
                        reason,
                    },
                })
            }
        };

        Ok(Self {
            id: record.id,
            store_id: record.store_id,
            category: record.category,
            amount: record.amount,
            date: record.date,
            payment_method: record.payment_method,
            notes: normalize_notes(record.notes),
            created_at: record.created_at,
            updated_at: record.updated_at,
            state,
        })
    }

    // Getter メソッド

    pub fn id(&self) -> &ExpenseId {
        &self.id
    }

    pub fn store_id(&self) -> Option<&StoreId> {
        self.store_id.as_ref()
    }

    pub fn category(&self) -> &ExpenseCategory {
        &self.category
    }

    pub fn amount(&self) -> ExpenseAmount {
        self.amount
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn payment_method(&self) -> PaymentMethod {
        self.payment_method
    }

    pub fn notes(&self) -> Option<&str> {
        self.notes.as_deref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// 状態への直接アクセス（パターンマッチ用）
    pub fn state(&self) -> &ExpenseState {
        &self.state
    }

    pub fn status(&self) -> ExpenseStatus {
        match &self.state {
            ExpenseState::Active | ExpenseState::PendingCancellation(_) => ExpenseStatus::Active,
            ExpenseState::Cancelled(_) => ExpenseStatus::Cancelled,
        }
    }

    /// 取消申請の記録
    ///
    /// 申請中の経費に加え、申請を経て取消された経費でも履歴として返す。
    pub fn cancellation_request(&self) -> Option<&CancellationRequest> {
        match &self.state {
            ExpenseState::Active => None,
            ExpenseState::PendingCancellation(request) => Some(request),
            ExpenseState::Cancelled(cancelled) => cancelled.request.as_ref(),
        }
    }

    /// 取消確定の記録（取消済みのときのみ）
    pub fn cancellation(&self) -> Option<&Cancellation> {
        match &self.state {
            ExpenseState::Cancelled(cancelled) => Some(&cancelled.cancellation),
            _ => None,
        }
    }

    /// 取消申請者（通知先）
    pub fn requester(&self) -> Option<&UserId> {
        self.cancellation_request()
            .map(|request| &request.requested_by)
    }

    /// 承認待ちの取消申請があるか
    ///
    /// 「申請中」の判定はこのメソッドに一本化する。
    pub fn has_pending_request(&self) -> bool {
        matches!(self.state, ExpenseState::PendingCancellation(_))
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self.state, ExpenseState::Cancelled(_))
    }

    // ビジネスロジックメソッド

    /// 取消申請を記録した新しいインスタンスを返す
    ///
    /// 申請中の経費に再申請した場合は、既存の申請を置き換える。
    ///
    /// # Errors
    ///
    /// - `DomainError::Conflict`: 取消済みの経費
    pub fn request_cancellation(self, request: CancellationRequest) -> Result<Self, DomainError> {
        match self.state {
            ExpenseState::Active | ExpenseState::PendingCancellation(_) => Ok(Self {
                updated_at: request.requested_at,
                state: ExpenseState::PendingCancellation(request),
                ..self
            }),
            ExpenseState::Cancelled(_) => Err(cancelled_conflict()),
        }
    }

    /// 取消を確定した新しいインスタンスを返す
    ///
    /// 特権ユーザーによる直接取消と申請の承認の両方に使う。
    /// 申請中だった場合、申請側の記録はそのまま残す。
    ///
    /// # Errors
    ///
    /// - `DomainError::Conflict`: 既に取消済み
    pub fn cancel(self, cancellation: Cancellation) -> Result<Self, DomainError> {
        let request = match self.state {
            ExpenseState::Active => None,
            ExpenseState::PendingCancellation(request) => Some(request),
            ExpenseState::Cancelled(_) => return Err(cancelled_conflict()),
        };

        Ok(Self {
            updated_at: cancellation.cancelled_at,
            state: ExpenseState::Cancelled(CancelledState {
                request,
                cancellation,
            }),
            ..self
        })
    }

    /// 取消申請を却下した新しいインスタンスを返す
    ///
    /// 申請情報を消去して有効な状態に戻す。申請が無い場合も有効なまま成功する。
    ///
    /// # Errors
    ///
    /// - `DomainError::Conflict`: 既に取消済み
    pub fn reject_cancellation_request(self, now: DateTime<Utc>) -> Result<Self, DomainError> {
        match self.state {
            ExpenseState::Active | ExpenseState::PendingCancellation(_) => Ok(Self {
                state: ExpenseState::Active,
                updated_at: now,
                ..self
            }),
            ExpenseState::Cancelled(_) => Err(cancelled_conflict()),
        }
    }

    /// 内容を部分更新した新しいインスタンスを返す
    ///
    /// # Errors
    ///
    /// - `DomainError::Conflict`: 取消済みの経費
    pub fn update_details(
        self,
        changes: ExpenseChanges,
        now: DateTime<Utc>,
    ) -> Result<Self, DomainError> {
        if self.is_cancelled() {
            return Err(cancelled_conflict());
        }

        Ok(Self {
            store_id: changes.store_id.unwrap_or(self.store_id),
            category: changes.category.unwrap_or(self.category),
            amount: changes.amount.unwrap_or(self.amount),
            date: changes.date.unwrap_or(self.date),
            payment_method: changes.payment_method.unwrap_or(self.payment_method),
            notes: match changes.notes {
                Some(notes) => normalize_notes(notes),
                None => self.notes,
            },
            updated_at: now,
            ..self
        })
    }
}

/// 一覧表示の並び順（日付の新しい順、同日内は登録の新しい順）
pub fn compare_for_listing(a: &Expense, b: &Expense) -> Ordering {
    b.date
        .cmp(&a.date)
        .then_with(|| b.created_at.cmp(&a.created_at))
}

/// 承認待ちの取消申請だけを抽出し、申請日時の新しい順に並べる
pub fn pending_cancellation_requests(expenses: impl IntoIterator<Item = Expense>) -> Vec<Expense> {
    let mut pending: Vec<Expense> = expenses
        .into_iter()
        .filter(Expense::has_pending_request)
        .collect();
    pending.sort_by(|a, b| {
        let requested_at = |e: &Expense| e.cancellation_request().map(|r| r.requested_at);
        requested_at(b).cmp(&requested_at(a))
    });
    pending
}
