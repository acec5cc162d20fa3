//! # ヘルスチェックハンドラ
//!
//! Core Service の稼働状態を確認するためのエンドポイント。
//!
//! - `/health`: Liveness Check（常に `"healthy"` を返す）
//! - `/health/ready`: Readiness Check（データベースの接続状態を確認）
//!
//! レスポンス型は [`aleya_shared::HealthResponse`] / [`aleya_shared::ReadinessResponse`] を参照。

use std::{collections::HashMap, sync::Arc, time::Duration};

use aleya_infra::db;
use aleya_shared::{CheckStatus, HealthResponse, ReadinessResponse, ReadinessStatus};
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use sqlx::PgPool;

/// データベース疎通確認のタイムアウト
const DATABASE_CHECK_TIMEOUT: Duration = Duration::from_secs(5);

/// Core Service のヘルスチェックエンドポイント
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse::healthy(env!("CARGO_PKG_VERSION")))
}

/// Readiness Check 用の State
pub struct ReadinessState {
    pub pool: PgPool,
}

/// Core Service の Readiness Check エンドポイント
///
/// 全チェック OK → 200、1 つでも失敗 → 503。
#[tracing::instrument(skip_all)]
pub async fn readiness_check(State(state): State<Arc<ReadinessState>>) -> impl IntoResponse {
    let checks = HashMap::from([("database".to_string(), check_database(&state.pool).await)]);
    let response = ReadinessResponse::from_checks(checks);

    let http_status = match response.status {
        ReadinessStatus::Ready => StatusCode::OK,
        ReadinessStatus::NotReady => StatusCode::SERVICE_UNAVAILABLE,
    };

    (http_status, Json(response))
}

async fn check_database(pool: &PgPool) -> CheckStatus {
    match tokio::time::timeout(DATABASE_CHECK_TIMEOUT, db::ping(pool)).await {
        Ok(Ok(())) => CheckStatus::Ok,
        Ok(Err(e)) => {
            tracing::warn!(error = %e, "readiness check: database ping failed");
            CheckStatus::Error
        }
        Err(_) => {
            tracing::warn!("readiness check: database check timed out");
            CheckStatus::Error
        }
    }
}
