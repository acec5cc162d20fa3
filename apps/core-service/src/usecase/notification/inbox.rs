//! # 通知受信箱ユースケース
//!
//! ユーザーごとの通知一覧と既読化。

use std::sync::Arc;

use aleya_domain::{
    clock::Clock,
    notification::{Notification, NotificationId},
    user::UserId,
};
use aleya_infra::repository::NotificationRepository;

use crate::error::CoreError;

/// 未読一覧の最大件数
pub const UNREAD_LIMIT: i64 = 50;
/// 全件一覧の既定件数
pub const DEFAULT_LIST_LIMIT: i64 = 30;
/// 全件一覧で指定できる最大件数
pub const MAX_LIST_LIMIT: i64 = 100;

/// 通知受信箱ユースケース
pub struct NotificationInboxUseCaseImpl {
    repo:  Arc<dyn NotificationRepository>,
    clock: Arc<dyn Clock>,
}

impl NotificationInboxUseCaseImpl {
    pub fn new(repo: Arc<dyn NotificationRepository>, clock: Arc<dyn Clock>) -> Self {
        Self { repo, clock }
    }

    /// 未読通知を新しい順に最大 50 件取得する
    pub async fn unread_for_user(&self, user_id: &UserId) -> Result<Vec<Notification>, CoreError> {
        Ok(self.repo.find_unread_by_user(user_id, UNREAD_LIMIT).await?)
    }

    /// 通知を新しい順に取得する
    ///
    /// `limit` 未指定は 30 件。1〜100 の範囲に丸める。
    pub async fn all_for_user(
        &self,
        user_id: &UserId,
        limit: Option<i64>,
    ) -> Result<Vec<Notification>, CoreError> {
        let limit = limit
            .unwrap_or(DEFAULT_LIST_LIMIT)
            .clamp(1, MAX_LIST_LIMIT);
        Ok(self.repo.find_by_user(user_id, limit).await?)
    }

    /// 通知を既読にする
    ///
    /// 通知が存在しなければ `Ok(false)`。
    pub async fn mark_as_read(&self, id: &NotificationId) -> Result<bool, CoreError> {
        Ok(self.repo.mark_as_read(id, self.clock.now()).await?)
    }

    /// ユーザーの未読通知をすべて既読にする
    pub async fn mark_all_as_read(&self, user_id: &UserId) -> Result<bool, CoreError> {
        let count = self
            .repo
            .mark_all_as_read(user_id, self.clock.now())
            .await?;
        tracing::debug!(%user_id, count, "未読通知を既読化");
        Ok(true)
    }
}
