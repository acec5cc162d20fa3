//! # 通知サービス
//!
//! 取消申請の承認・却下を申請者のアプリ内通知として保存する。
//!
//! ## 設計方針
//!
//! - **fire-and-forget**: `notify()` は保存に失敗してもエラーを返さない
//! - **依存性注入**: `NotificationRepository` と `Clock` は trait で抽象化

use std::sync::Arc;

use aleya_domain::{
    clock::Clock,
    notification::{ExpenseNotification, Notification, NotificationId},
};
use aleya_infra::repository::NotificationRepository;
use aleya_shared::{
    event_log::{error as log_error, event},
    log_business_event,
};

/// 通知サービス
pub struct NotificationService {
    repo:  Arc<dyn NotificationRepository>,
    clock: Arc<dyn Clock>,
}

impl NotificationService {
    pub fn new(repo: Arc<dyn NotificationRepository>, clock: Arc<dyn Clock>) -> Self {
        Self { repo, clock }
    }

    /// 通知を作成する（fire-and-forget）
    pub async fn notify(&self, expense_notification: ExpenseNotification) {
        let notification = Notification::new(
            NotificationId::new(),
            expense_notification.to_new_notification(),
            self.clock.now(),
        );
        let notification_type: &str = notification.notification_type.into();

        match self.repo.insert(&notification).await {
            Ok(()) => {
                log_business_event!(
                    event.category = event::category::NOTIFICATION,
                    event.action = event::action::NOTIFICATION_CREATED,
                    event.entity_type = event::entity_type::NOTIFICATION,
                    event.entity_id = %notification.id,
                    event.result = event::result::SUCCESS,
                    notification.kind = notification_type,
                    notification.recipient = %notification.user_id,
                    expense_id = %expense_notification.expense_id(),
                    "通知を作成"
                );
            }
            Err(e) => {
                log_business_event!(
                    event.category = event::category::NOTIFICATION,
                    event.action = event::action::NOTIFICATION_FAILED,
                    event.entity_type = event::entity_type::NOTIFICATION,
                    event.result = event::result::FAILURE,
                    notification.kind = notification_type,
                    notification.recipient = %notification.user_id,
                    expense_id = %expense_notification.expense_id(),
                    "通知の作成に失敗"
                );
                tracing::error!(
                    error.category = log_error::category::SIDE_EFFECT,
                    error.kind = log_error::kind::NOTIFICATION,
                    error = %e,
                    "通知の保存に失敗"
                );
            }
        }
    }
}
