//! # ActivityLogRepository
//!
//! 操作履歴を追記する。更新・削除の操作は持たない。

use aleya_domain::activity_log::ActivityLog;
use async_trait::async_trait;
use sqlx::PgPool;

use crate::error::InfraError;

/// 操作履歴リポジトリトレイト
#[async_trait]
pub trait ActivityLogRepository: Send + Sync {
    /// 操作履歴を 1 件追記する
    async fn record(&self, log: &ActivityLog) -> Result<(), InfraError>;
}

/// PostgreSQL 実装の ActivityLogRepository
#[derive(Debug, Clone)]
pub struct PostgresActivityLogRepository {
    pool: PgPool,
}

impl PostgresActivityLogRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ActivityLogRepository for PostgresActivityLogRepository {
    #[tracing::instrument(skip_all, level = "debug", fields(action = %log.action))]
    async fn record(&self, log: &ActivityLog) -> Result<(), InfraError> {
        let action: &str = log.action.into();

        sqlx::query(
            r#"
            INSERT INTO activity_logs (id, user_id, action, module, details, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(log.id.as_uuid())
        .bind(log.user_id.as_uuid())
        .bind(action)
        .bind(&log.module)
        .bind(&log.details)
        .bind(log.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn トレイトはsendとsyncを実装している() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<PostgresActivityLogRepository>();
    }
}
