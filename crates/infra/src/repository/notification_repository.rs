//! # NotificationRepository
//!
//! アプリ内通知（受信箱）の永続化を担当する。
//!
//! 既読化は `read_at` が NULL のときだけ値を入れるため、
//! 既読済みの通知を何度既読にしても最初の既読日時が残る。

use aleya_domain::{
    notification::{Notification, NotificationId},
    user::UserId,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value as JsonValue;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::InfraError;

/// 通知リポジトリトレイト
#[async_trait]
pub trait NotificationRepository: Send + Sync {
    /// 通知を挿入する
    async fn insert(&self, notification: &Notification) -> Result<(), InfraError>;

    /// ユーザーの未読通知を新しい順に最大 `limit` 件取得する
    async fn find_unread_by_user(
        &self,
        user_id: &UserId,
        limit: i64,
    ) -> Result<Vec<Notification>, InfraError>;

    /// ユーザーの通知（既読を含む）を新しい順に最大 `limit` 件取得する
    async fn find_by_user(
        &self,
        user_id: &UserId,
        limit: i64,
    ) -> Result<Vec<Notification>, InfraError>;

    /// 通知を既読にする
    ///
    /// 通知が存在しなければ `Ok(false)`。
    async fn mark_as_read(
        &self,
        id: &NotificationId,
        now: DateTime<Utc>,
    ) -> Result<bool, InfraError>;

    /// ユーザーの未読通知をすべて既読にし、更新件数を返す
    async fn mark_all_as_read(
        &self,
        user_id: &UserId,
        now: DateTime<Utc>,
    ) -> Result<u64, InfraError>;
}

#[derive(Debug, sqlx::FromRow)]
struct NotificationRow {
    id: Uuid,
    user_id: Uuid,
    #[sqlx(rename = "type")]
    notification_type: String,
    title: String,
    message: Option<String>,
    metadata: Option<JsonValue>,
    read_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl TryFrom<NotificationRow> for Notification {
    type Error = InfraError;

    fn try_from(row: NotificationRow) -> Result<Self, Self::Error> {
        Ok(Notification {
            id: NotificationId::from_uuid(row.id),
            user_id: UserId::from_uuid(row.user_id),
            notification_type: row.notification_type.parse()?,
            title: row.title,
            message: row.message,
            metadata: row.metadata,
            read_at: row.read_at,
            created_at: row.created_at,
        })
    }
}

/// PostgreSQL 実装の NotificationRepository
#[derive(Debug, Clone)]
pub struct PostgresNotificationRepository {
    pool: PgPool,
}

impl PostgresNotificationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl NotificationRepository for PostgresNotificationRepository {
    #[tracing::instrument(skip_all, level = "debug", fields(notification_id = %notification.id))]
    async fn insert(&self, notification: &Notification) -> Result<(), InfraError> {
        let notification_type: &str = notification.notification_type.into();

        sqlx::query(
            r#"
            INSERT INTO notifications (
                id, user_id, type, title, message, metadata, read_at, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(notification.id.as_uuid())
        .bind(notification.user_id.as_uuid())
        .bind(notification_type)
        .bind(&notification.title)
        .bind(notification.message.as_deref())
        .bind(notification.metadata.as_ref())
        .bind(notification.read_at)
        .bind(notification.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    #[tracing::instrument(skip_all, level = "debug", fields(user_id = %user_id))]
    async fn find_unread_by_user(
        &self,
        user_id: &UserId,
        limit: i64,
    ) -> Result<Vec<Notification>, InfraError> {
        let rows = sqlx::query_as::<_, NotificationRow>(
            r#"
            SELECT id, user_id, type, title, message, metadata, read_at, created_at
            FROM notifications
            WHERE user_id = $1 AND read_at IS NULL
            ORDER BY created_at DESC
            LIMIT $2
            "#,
        )
        .bind(user_id.as_uuid())
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Notification::try_from).collect()
    }

    #[tracing::instrument(skip_all, level = "debug", fields(user_id = %user_id))]
    async fn find_by_user(
        &self,
        user_id: &UserId,
        limit: i64,
    ) -> Result<Vec<Notification>, InfraError> {
        let rows = sqlx::query_as::<_, NotificationRow>(
            r#"
            SELECT id, user_id, type, title, message, metadata, read_at, created_at
            FROM notifications
            WHERE user_id = $1
            ORDER BY created_at DESC
            LIMIT $2
            "#,
        )
        .bind(user_id.as_uuid())
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Notification::try_from).collect()
    }

    #[tracing::instrument(skip_all, level = "debug", fields(notification_id = %id))]
    async fn mark_as_read(
        &self,
        id: &NotificationId,
        now: DateTime<Utc>,
    ) -> Result<bool, InfraError> {
        let result = sqlx::query(
            r#"
            UPDATE notifications SET read_at = COALESCE(read_at, $2)
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    #[tracing::instrument(skip_all, level = "debug", fields(user_id = %user_id))]
    async fn mark_all_as_read(
        &self,
        user_id: &UserId,
        now: DateTime<Utc>,
    ) -> Result<u64, InfraError> {
        let result = sqlx::query(
            r#"
            UPDATE notifications SET read_at = $2
            WHERE user_id = $1 AND read_at IS NULL
            "#,
        )
        .bind(user_id.as_uuid())
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}
