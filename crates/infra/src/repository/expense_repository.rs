//! # ExpenseRepository
//!
//! 経費の永続化を担当するリポジトリ。
//!
//! ## 条件付き更新
//!
//! 取消フローの書き込み（申請・取消・却下）と内容の編集は、すべて
//! `WHERE id = $1 AND status = 'active'` を条件にした単一の UPDATE で行う。
//! 並行して取消された経費には一致せず 0 行となり、`Ok(false)` を返す。
//! 「存在しない」「取消済み」「競合に負けた」は区別しない。
//!
//! 取消と却下は、同じ UPDATE 内で `SELECT ... FOR UPDATE` した更新直前の行を
//! `RETURNING` で返す（[`ExpenseRepository::cancel`] /
//! [`ExpenseRepository::clear_cancellation_request`]）。通知先は書き込みと同じ行ロックの下で
//! 読んだこの値から決める。

use aleya_domain::expense::{
    Cancellation,
    CancellationRequest,
    Expense,
    ExpenseAmount,
    ExpenseCategory,
    ExpenseChanges,
    ExpenseId,
    ExpenseRecord,
    ExpenseStatus,
};
use aleya_domain::{store::StoreId, user::UserId};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::InfraError;

/// 経費リポジトリトレイト
#[async_trait]
pub trait ExpenseRepository: Send + Sync {
    /// 経費を挿入する
    async fn insert(&self, expense: &Expense) -> Result<(), InfraError>;

    /// ID で経費を検索する
    async fn find_by_id(&self, id: &ExpenseId) -> Result<Option<Expense>, InfraError>;

    /// 全経費を日付の新しい順（同日内は登録の新しい順）で取得する
    async fn find_all(&self) -> Result<Vec<Expense>, InfraError>;

    /// 日付範囲（両端を含む）の経費を `find_all` と同じ順で取得する
    async fn find_by_date_range(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<Expense>, InfraError>;

    /// 承認待ちの取消申請を申請日時の新しい順で取得する
    async fn find_pending_cancellation_requests(&self) -> Result<Vec<Expense>, InfraError>;

    /// 有効な経費の内容を部分更新する
    ///
    /// 0 行だった場合は `Ok(false)`。
    async fn update_details(
        &self,
        id: &ExpenseId,
        changes: &ExpenseChanges,
        now: DateTime<Utc>,
    ) -> Result<bool, InfraError>;

    /// 有効な経費に取消申請を記録する
    ///
    /// 0 行だった場合は `Ok(false)`。
    async fn request_cancellation(
        &self,
        id: &ExpenseId,
        request: &CancellationRequest,
    ) -> Result<bool, InfraError>;

    /// 有効な経費を取消済みにする（申請側の記録は残す）
    ///
    /// 適用した場合は更新直前の経費を返す。0 行だった場合は `Ok(None)`。
    async fn cancel(
        &self,
        id: &ExpenseId,
        cancellation: &Cancellation,
    ) -> Result<Option<Expense>, InfraError>;

    /// 有効な経費の取消申請を消去する
    ///
    /// 適用した場合は更新直前の経費を返す。0 行だった場合は `Ok(None)`。
    async fn clear_cancellation_request(
        &self,
        id: &ExpenseId,
        now: DateTime<Utc>,
    ) -> Result<Option<Expense>, InfraError>;
}

/// SELECT 句（列の並びは [`ExpenseRow`] と一致させる）
///
/// 2 引数の形は SELECT の前に `$head` を置く（更新直前の行を返す UPDATE 用）。
macro_rules! select_expenses {
    ($tail:literal) => {
        select_expenses!("", $tail)
    };
    ($head:literal, $tail:literal) => {
        concat!(
            $head,
            r#"
            SELECT
                id, store_id, category, amount, date, payment_method, notes, status,
                cancellation_requested_at, cancellation_requested_by,
                cancellation_requested_by_name, cancellation_request_reason,
                cancelled_at, cancelled_by, cancelled_by_name, cancellation_reason,
                created_at, updated_at
            FROM expenses
            "#,
            $tail
        )
    };
}

/// expenses テーブルの行
#[derive(Debug, sqlx::FromRow)]
struct ExpenseRow {
    id: Uuid,
    store_id: Option<Uuid>,
    category: String,
    amount: i64,
    date: NaiveDate,
    payment_method: String,
    notes: Option<String>,
    status: String,
    cancellation_requested_at: Option<DateTime<Utc>>,
    cancellation_requested_by: Option<Uuid>,
    cancellation_requested_by_name: Option<String>,
    cancellation_request_reason: Option<String>,
    cancelled_at: Option<DateTime<Utc>>,
    cancelled_by: Option<Uuid>,
    cancelled_by_name: Option<String>,
    cancellation_reason: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ExpenseRow> for Expense {
    type Error = InfraError;

    fn try_from(row: ExpenseRow) -> Result<Self, Self::Error> {
        let expense = Expense::from_db(ExpenseRecord {
            id: ExpenseId::from_uuid(row.id),
            store_id: row.store_id.map(StoreId::from_uuid),
            category: ExpenseCategory::new(row.category)?,
            amount: ExpenseAmount::new(row.amount)?,
            date: row.date,
            payment_method: row.payment_method.parse()?,
            notes: row.notes,
            status: row.status.parse::<ExpenseStatus>()?,
            cancellation_requested_at: row.cancellation_requested_at,
            cancellation_requested_by: row.cancellation_requested_by.map(UserId::from_uuid),
            cancellation_requested_by_name: row.cancellation_requested_by_name,
            cancellation_request_reason: row.cancellation_request_reason,
            cancelled_at: row.cancelled_at,
            cancelled_by: row.cancelled_by.map(UserId::from_uuid),
            cancelled_by_name: row.cancelled_by_name,
            cancellation_reason: row.cancellation_reason,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })?;
        Ok(expense)
    }
}

fn into_expenses(rows: Vec<ExpenseRow>) -> Result<Vec<Expense>, InfraError> {
    rows.into_iter().map(Expense::try_from).collect()
}

/// PostgreSQL 実装の ExpenseRepository
#[derive(Debug, Clone)]
pub struct PostgresExpenseRepository {
    pool: PgPool,
}

impl PostgresExpenseRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ExpenseRepository for PostgresExpenseRepository {
    #[tracing::instrument(skip_all, level = "debug", fields(expense_id = %expense.id()))]
    async fn insert(&self, expense: &Expense) -> Result<(), InfraError> {
        let status: &str = expense.status().into();
        let payment_method: &str = expense.payment_method().into();

        sqlx::query(
            r#"
            INSERT INTO expenses (
                id, store_id, category, amount, date, payment_method, notes, status,
                created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(expense.id().as_uuid())
        .bind(expense.store_id().map(|s| *s.as_uuid()))
        .bind(expense.category().as_str())
        .bind(expense.amount().as_i64())
        .bind(expense.date())
        .bind(payment_method)
        .bind(expense.notes())
        .bind(status)
        .bind(expense.created_at())
        .bind(expense.updated_at())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    #[tracing::instrument(skip_all, level = "debug", fields(expense_id = %id))]
    async fn find_by_id(&self, id: &ExpenseId) -> Result<Option<Expense>, InfraError> {
        let row = sqlx::query_as::<_, ExpenseRow>(select_expenses!("WHERE id = $1"))
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;

        row.map(Expense::try_from).transpose()
    }

    #[tracing::instrument(skip_all, level = "debug")]
    async fn find_all(&self) -> Result<Vec<Expense>, InfraError> {
        let rows = sqlx::query_as::<_, ExpenseRow>(select_expenses!(
            "ORDER BY date DESC, created_at DESC"
        ))
        .fetch_all(&self.pool)
        .await?;

        into_expenses(rows)
    }

    #[tracing::instrument(skip_all, level = "debug", fields(%from, %to))]
    async fn find_by_date_range(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<Expense>, InfraError> {
        let rows = sqlx::query_as::<_, ExpenseRow>(select_expenses!(
            "WHERE date >= $1 AND date <= $2 ORDER BY date DESC, created_at DESC"
        ))
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await?;

        into_expenses(rows)
    }

    #[tracing::instrument(skip_all, level = "debug")]
    async fn find_pending_cancellation_requests(&self) -> Result<Vec<Expense>, InfraError> {
        let rows = sqlx::query_as::<_, ExpenseRow>(select_expenses!(
            r#"
            WHERE status = 'active' AND cancellation_requested_at IS NOT NULL
            ORDER BY cancellation_requested_at DESC
            "#
        ))
        .fetch_all(&self.pool)
        .await?;

        into_expenses(rows)
    }

    #[tracing::instrument(skip_all, level = "debug", fields(expense_id = %id))]
    async fn update_details(
        &self,
        id: &ExpenseId,
        changes: &ExpenseChanges,
        now: DateTime<Utc>,
    ) -> Result<bool, InfraError> {
        let payment_method: Option<&str> = changes.payment_method.map(Into::into);

        // store_id / notes は「変更しない」と「NULL にする」を区別するためフラグを渡す
        let result = sqlx::query(
            r#"
            UPDATE expenses SET
                store_id = CASE WHEN $2 THEN $3 ELSE store_id END,
                category = COALESCE($4, category),
                amount = COALESCE($5, amount),
                date = COALESCE($6, date),
                payment_method = COALESCE($7, payment_method),
                notes = CASE WHEN $8 THEN $9 ELSE notes END,
                updated_at = $10
            WHERE id = $1 AND status = 'active'
            "#,
        )
        .bind(id.as_uuid())
        .bind(changes.store_id.is_some())
        .bind(changes.store_id.clone().flatten().map(|s| *s.as_uuid()))
        .bind(changes.category.as_ref().map(|c| c.as_str()))
        .bind(changes.amount.map(|a| a.as_i64()))
        .bind(changes.date)
        .bind(payment_method)
        .bind(changes.notes.is_some())
        .bind(changes.notes.clone().flatten())
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    #[tracing::instrument(skip_all, level = "debug", fields(expense_id = %id))]
    async fn request_cancellation(
        &self,
        id: &ExpenseId,
        request: &CancellationRequest,
    ) -> Result<bool, InfraError> {
        let result = sqlx::query(
            r#"
            UPDATE expenses SET
                cancellation_requested_at = $2,
                cancellation_requested_by = $3,
                cancellation_requested_by_name = $4,
                cancellation_request_reason = $5,
                updated_at = $2
            WHERE id = $1 AND status = 'active'
            "#,
        )
        .bind(id.as_uuid())
        .bind(request.requested_at)
        .bind(request.requested_by.as_uuid())
        .bind(request.requested_by_name.as_str())
        .bind(request.reason.as_str())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    #[tracing::instrument(skip_all, level = "debug", fields(expense_id = %id))]
    async fn cancel(
        &self,
        id: &ExpenseId,
        cancellation: &Cancellation,
    ) -> Result<Option<Expense>, InfraError> {
        let row = sqlx::query_as::<_, ExpenseRow>(select_expenses!(
            r#"
            UPDATE expenses AS e SET
                status = 'cancelled',
                cancelled_at = $2,
                cancelled_by = $3,
                cancelled_by_name = $4,
                cancellation_reason = $5,
                updated_at = $2
            FROM (
            "#,
            r#"
                WHERE id = $1 AND status = 'active'
                FOR UPDATE
            ) AS prior
            WHERE e.id = prior.id
            RETURNING prior.*
            "#
        ))
        .bind(id.as_uuid())
        .bind(cancellation.cancelled_at)
        .bind(cancellation.cancelled_by.as_uuid())
        .bind(cancellation.cancelled_by_name.as_deref())
        .bind(cancellation.reason.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Expense::try_from).transpose()
    }

    #[tracing::instrument(skip_all, level = "debug", fields(expense_id = %id))]
    async fn clear_cancellation_request(
        &self,
        id: &ExpenseId,
        now: DateTime<Utc>,
    ) -> Result<Option<Expense>, InfraError> {
        let row = sqlx::query_as::<_, ExpenseRow>(select_expenses!(
            r#"
            UPDATE expenses AS e SET
                cancellation_requested_at = NULL,
                cancellation_requested_by = NULL,
                cancellation_requested_by_name = NULL,
                cancellation_request_reason = NULL,
                updated_at = $2
            FROM (
            "#,
            r#"
                WHERE id = $1 AND status = 'active'
                FOR UPDATE
            ) AS prior
            WHERE e.id = prior.id
            RETURNING prior.*
            "#
        ))
        .bind(id.as_uuid())
        .bind(now)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Expense::try_from).transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_トレイトはsendとsyncを実装している() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<PostgresExpenseRepository>();
        assert_send_sync::<Box<dyn ExpenseRepository>>();
    }

    fn row() -> ExpenseRow {
        let now = Utc::now();
        ExpenseRow {
            id: Uuid::now_v7(),
            store_id: None,
            category: "Arriendo".to_string(),
            amount: 500_000,
            date: NaiveDate::from_ymd_opt(2025, 1, 5).unwrap(),
            payment_method: "transfer".to_string(),
            notes: None,
            status: "active".to_string(),
            cancellation_requested_at: None,
            cancellation_requested_by: None,
            cancellation_requested_by_name: None,
            cancellation_request_reason: None,
            cancelled_at: None,
            cancelled_by: None,
            cancelled_by_name: None,
            cancellation_reason: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_申請情報付きの行は申請中として復元される() {
        let row = ExpenseRow {
            cancellation_requested_at: Some(Utc::now()),
            cancellation_requested_by: Some(Uuid::now_v7()),
            cancellation_requested_by_name: Some("Laura".to_string()),
            cancellation_request_reason: Some("Pagado dos veces por error".to_string()),
            ..row()
        };

        let expense = Expense::try_from(row).unwrap();

        assert!(expense.has_pending_request());
    }

    #[test]
    fn test_不明な支払方法の行は不正な保存データ() {
        let row = ExpenseRow {
            payment_method: "card".to_string(),
            ..row()
        };

        let err = Expense::try_from(row).unwrap_err();

        assert!(matches!(
            err.kind(),
            crate::error::InfraErrorKind::InvalidData(_)
        ));
    }

    #[test]
    fn test_取消済みで理由のない行は不正な保存データ() {
        let row = ExpenseRow {
            status: "cancelled".to_string(),
            cancelled_at: Some(Utc::now()),
            cancelled_by: Some(Uuid::now_v7()),
            ..row()
        };

        assert!(Expense::try_from(row).is_err());
    }
}
