//! # 通知ハンドラ
//!
//! 取消フローで作成されたアプリ内通知の受信箱 API を提供する。
//!
//! ## エンドポイント
//!
//! - `GET /internal/users/{user_id}/notifications?unreadOnly&limit` - 通知一覧
//! - `POST /internal/notifications/{notification_id}/read` - 既読化
//! - `POST /internal/users/{user_id}/notifications/read-all` - 一括既読化

use std::sync::Arc;

use aleya_domain::{
    notification::{Notification, NotificationId, NotificationType},
    user::UserId,
};
use aleya_shared::ApiResponse;
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use uuid::Uuid;

use crate::{error::CoreError, usecase::NotificationInboxUseCaseImpl};

/// 通知 API の共有状態
pub struct NotificationState {
    pub usecase: NotificationInboxUseCaseImpl,
}

/// 通知一覧のクエリパラメータ
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationListQuery {
    #[serde(default)]
    pub unread_only: bool,
    pub limit:       Option<i64>,
}

/// 通知 DTO
#[derive(Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NotificationDto {
    pub id:         Uuid,
    pub user_id:    Uuid,
    #[serde(rename = "type")]
    pub notification_type: NotificationType,
    pub title:      String,
    pub message:    Option<String>,
    pub metadata:   Option<JsonValue>,
    pub read_at:    Option<String>,
    pub created_at: String,
}

impl From<&Notification> for NotificationDto {
    fn from(n: &Notification) -> Self {
        Self {
            id:                *n.id.as_uuid(),
            user_id:           *n.user_id.as_uuid(),
            notification_type: n.notification_type,
            title:             n.title.clone(),
            message:           n.message.clone(),
            metadata:          n.metadata.clone(),
            read_at:           n.read_at.map(|t| t.to_rfc3339()),
            created_at:        n.created_at.to_rfc3339(),
        }
    }
}

/// GET /internal/users/{user_id}/notifications
///
/// `unreadOnly=true` のときは未読のみ（最大 50 件）、それ以外は既読を含めて
/// `limit` 件（既定 30、最大 100）を新しい順に返す。
#[tracing::instrument(skip_all, fields(%user_id))]
pub async fn list_notifications(
    State(state): State<Arc<NotificationState>>,
    Path(user_id): Path<Uuid>,
    Query(query): Query<NotificationListQuery>,
) -> Result<impl IntoResponse, CoreError> {
    let user_id = UserId::from_uuid(user_id);

    let notifications = if query.unread_only {
        state.usecase.unread_for_user(&user_id).await?
    } else {
        state.usecase.all_for_user(&user_id, query.limit).await?
    };

    let items: Vec<NotificationDto> = notifications.iter().map(NotificationDto::from).collect();
    Ok((StatusCode::OK, Json(ApiResponse::new(items))))
}

/// POST /internal/notifications/{notification_id}/read
///
/// ## レスポンス
///
/// - `204 No Content`: 既読にした（既読済みを含む）
/// - `404 Not Found`: 通知が存在しない
#[tracing::instrument(skip_all, fields(%notification_id))]
pub async fn mark_notification_as_read(
    State(state): State<Arc<NotificationState>>,
    Path(notification_id): Path<Uuid>,
) -> Result<impl IntoResponse, CoreError> {
    let found = state
        .usecase
        .mark_as_read(&NotificationId::from_uuid(notification_id))
        .await?;

    if !found {
        return Err(CoreError::NotFound("通知が見つかりません".to_string()));
    }
    Ok(StatusCode::NO_CONTENT)
}

/// POST /internal/users/{user_id}/notifications/read-all
#[tracing::instrument(skip_all, fields(%user_id))]
pub async fn mark_all_notifications_as_read(
    State(state): State<Arc<NotificationState>>,
    Path(user_id): Path<Uuid>,
) -> Result<impl IntoResponse, CoreError> {
    state
        .usecase
        .mark_all_as_read(&UserId::from_uuid(user_id))
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
