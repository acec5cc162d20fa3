//! # テスト用モックリポジトリ
//!
//! ユースケーステストで使用するインメモリモックリポジトリ。
//! `test-utils` feature を有効にすることで、他クレートからも利用可能。
//!
//! ```toml
//! [dev-dependencies]
//! aleya-infra = { workspace = true, features = ["test-utils"] }
//! ```
//!
//! 条件付き更新は PostgreSQL 実装と同じく、取消済みまたは存在しない経費には
//! 何もせず `Ok(false)`（取消・却下は `Ok(None)`）を返す。`set_failing(true)` で以降の呼び出しを
//! すべてインフラエラーにできる。

use std::sync::{
    Arc,
    Mutex,
    atomic::{AtomicBool, Ordering},
};

use aleya_domain::{
    DomainError,
    activity_log::ActivityLog,
    expense::{
        Cancellation,
        CancellationRequest,
        Expense,
        ExpenseChanges,
        ExpenseId,
        compare_for_listing,
        pending_cancellation_requests,
    },
    notification::{Notification, NotificationId},
    user::UserId,
};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};

use crate::{
    error::InfraError,
    repository::{ActivityLogRepository, ExpenseRepository, NotificationRepository},
};

fn check_failing(failing: &AtomicBool) -> Result<(), InfraError> {
    if failing.load(Ordering::SeqCst) {
        return Err(InfraError::unexpected("モックで注入したエラー"));
    }
    Ok(())
}

// ===== MockExpenseRepository =====

#[derive(Clone, Default)]
pub struct MockExpenseRepository {
    expenses: Arc<Mutex<Vec<Expense>>>,
    failing:  Arc<AtomicBool>,
}

impl MockExpenseRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_expense(&self, expense: Expense) {
        self.expenses.lock().unwrap().push(expense);
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// 保存されている経費を直接参照する（テストの検証用）
    pub fn get(&self, id: &ExpenseId) -> Option<Expense> {
        self.expenses
            .lock()
            .unwrap()
            .iter()
            .find(|e| e.id() == id)
            .cloned()
    }

    /// 有効な経費にだけ遷移を適用し、適用前の経費を返す
    fn apply(
        &self,
        id: &ExpenseId,
        transition: impl FnOnce(Expense) -> Result<Expense, DomainError>,
    ) -> Result<Option<Expense>, InfraError> {
        check_failing(&self.failing)?;
        let mut expenses = self.expenses.lock().unwrap();
        let Some(pos) = expenses.iter().position(|e| e.id() == id) else {
            return Ok(None);
        };
        let prior = expenses[pos].clone();
        match transition(prior.clone()) {
            Ok(updated) => {
                expenses[pos] = updated;
                Ok(Some(prior))
            }
            Err(_) => Ok(None),
        }
    }

    fn sorted(&self, filter: impl Fn(&Expense) -> bool) -> Vec<Expense> {
        let mut expenses: Vec<Expense> = self
            .expenses
            .lock()
            .unwrap()
            .iter()
            .filter(|e| filter(e))
            .cloned()
            .collect();
        expenses.sort_by(compare_for_listing);
        expenses
    }
}

#[async_trait]
impl ExpenseRepository for MockExpenseRepository {
    async fn insert(&self, expense: &Expense) -> Result<(), InfraError> {
        check_failing(&self.failing)?;
        self.expenses.lock().unwrap().push(expense.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &ExpenseId) -> Result<Option<Expense>, InfraError> {
        check_failing(&self.failing)?;
        Ok(self.get(id))
    }

    async fn find_all(&self) -> Result<Vec<Expense>, InfraError> {
        check_failing(&self.failing)?;
        Ok(self.sorted(|_| true))
    }

    async fn find_by_date_range(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<Expense>, InfraError> {
        check_failing(&self.failing)?;
        Ok(self.sorted(|e| from <= e.date() && e.date() <= to))
    }

    async fn find_pending_cancellation_requests(&self) -> Result<Vec<Expense>, InfraError> {
        check_failing(&self.failing)?;
        let expenses = self.expenses.lock().unwrap().clone();
        Ok(pending_cancellation_requests(expenses))
    }

    async fn update_details(
        &self,
        id: &ExpenseId,
        changes: &ExpenseChanges,
        now: DateTime<Utc>,
    ) -> Result<bool, InfraError> {
        self.apply(id, |e| e.update_details(changes.clone(), now))
            .map(|prior| prior.is_some())
    }

    async fn request_cancellation(
        &self,
        id: &ExpenseId,
        request: &CancellationRequest,
    ) -> Result<bool, InfraError> {
        self.apply(id, |e| e.request_cancellation(request.clone()))
            .map(|prior| prior.is_some())
    }

    async fn cancel(
        &self,
        id: &ExpenseId,
        cancellation: &Cancellation,
    ) -> Result<Option<Expense>, InfraError> {
        self.apply(id, |e| e.cancel(cancellation.clone()))
    }

    async fn clear_cancellation_request(
        &self,
        id: &ExpenseId,
        now: DateTime<Utc>,
    ) -> Result<Option<Expense>, InfraError> {
        self.apply(id, |e| e.reject_cancellation_request(now))
    }
}

// ===== MockNotificationRepository =====

#[derive(Clone, Default)]
pub struct MockNotificationRepository {
    notifications: Arc<Mutex<Vec<Notification>>>,
    failing:       Arc<AtomicBool>,
}

impl MockNotificationRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// 作成された通知（作成順）
    pub fn notifications(&self) -> Vec<Notification> {
        self.notifications.lock().unwrap().clone()
    }

    fn newest_first(&self, filter: impl Fn(&Notification) -> bool, limit: i64) -> Vec<Notification> {
        let mut found: Vec<Notification> = self
            .notifications
            .lock()
            .unwrap()
            .iter()
            .filter(|n| filter(n))
            .cloned()
            .collect();
        found.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        found.truncate(usize::try_from(limit).unwrap_or(0));
        found
    }
}

#[async_trait]
impl NotificationRepository for MockNotificationRepository {
    async fn insert(&self, notification: &Notification) -> Result<(), InfraError> {
        check_failing(&self.failing)?;
        self.notifications
            .lock()
            .unwrap()
            .push(notification.clone());
        Ok(())
    }

    async fn find_unread_by_user(
        &self,
        user_id: &UserId,
        limit: i64,
    ) -> Result<Vec<Notification>, InfraError> {
        check_failing(&self.failing)?;
        Ok(self.newest_first(|n| &n.user_id == user_id && !n.is_read(), limit))
    }

    async fn find_by_user(
        &self,
        user_id: &UserId,
        limit: i64,
    ) -> Result<Vec<Notification>, InfraError> {
        check_failing(&self.failing)?;
        Ok(self.newest_first(|n| &n.user_id == user_id, limit))
    }

    async fn mark_as_read(
        &self,
        id: &NotificationId,
        now: DateTime<Utc>,
    ) -> Result<bool, InfraError> {
        check_failing(&self.failing)?;
        let mut notifications = self.notifications.lock().unwrap();
        let Some(pos) = notifications.iter().position(|n| &n.id == id) else {
            return Ok(false);
        };
        notifications[pos] = notifications[pos].clone().marked_as_read(now);
        Ok(true)
    }

    async fn mark_all_as_read(
        &self,
        user_id: &UserId,
        now: DateTime<Utc>,
    ) -> Result<u64, InfraError> {
        check_failing(&self.failing)?;
        let mut count = 0;
        for n in self.notifications.lock().unwrap().iter_mut() {
            if &n.user_id == user_id && !n.is_read() {
                n.read_at = Some(now);
                count += 1;
            }
        }
        Ok(count)
    }
}

// ===== MockActivityLogRepository =====

#[derive(Clone, Default)]
pub struct MockActivityLogRepository {
    logs:    Arc<Mutex<Vec<ActivityLog>>>,
    failing: Arc<AtomicBool>,
}

impl MockActivityLogRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// 記録された操作履歴（記録順）
    pub fn logs(&self) -> Vec<ActivityLog> {
        self.logs.lock().unwrap().clone()
    }
}

#[async_trait]
impl ActivityLogRepository for MockActivityLogRepository {
    async fn record(&self, log: &ActivityLog) -> Result<(), InfraError> {
        check_failing(&self.failing)?;
        self.logs.lock().unwrap().push(log.clone());
        Ok(())
    }
}
