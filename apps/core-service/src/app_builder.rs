//! # アプリケーション構築
//!
//! DI コンテナの構築とルーター定義を行う。
//! main.rs はインフラ初期化（DB 接続・マイグレーション・サーバー起動）に専念する。

use std::sync::Arc;

use aleya_domain::clock::{Clock, SystemClock};
use aleya_infra::repository::{
    ActivityLogRepository,
    ExpenseRepository,
    NotificationRepository,
    PostgresActivityLogRepository,
    PostgresExpenseRepository,
    PostgresNotificationRepository,
};
use axum::{
    Router,
    body::Body,
    http::Request,
    routing::{get, post},
};
use sqlx::PgPool;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use tracing::Span;

use crate::{
    config::CancellationConfig,
    handler::{
        ExpenseState,
        NotificationState,
        ReadinessState,
        cancel_expense,
        create_expense,
        get_expense,
        health_check,
        list_expense_categories,
        list_expenses,
        list_notifications,
        list_pending_cancellation_requests,
        mark_all_notifications_as_read,
        mark_notification_as_read,
        readiness_check,
        reject_cancellation_request,
        request_cancellation,
        update_expense,
    },
    usecase::{
        ActivityLogger,
        ExpenseUseCaseImpl,
        NotificationInboxUseCaseImpl,
        NotificationService,
    },
};

/// ルーターに注入する依存
///
/// 本番では [`AppDependencies::postgres`] で組み立て、テストではモックを差し込む。
pub struct AppDependencies {
    pub expense_repo:      Arc<dyn ExpenseRepository>,
    pub notification_repo: Arc<dyn NotificationRepository>,
    pub activity_log_repo: Arc<dyn ActivityLogRepository>,
    pub clock:             Arc<dyn Clock>,
    pub cancellation:      CancellationConfig,
}

impl AppDependencies {
    /// PostgreSQL 実装のリポジトリと実時刻で依存を組み立てる
    pub fn postgres(pool: &PgPool, cancellation: CancellationConfig) -> Self {
        Self {
            expense_repo: Arc::new(PostgresExpenseRepository::new(pool.clone())),
            notification_repo: Arc::new(PostgresNotificationRepository::new(pool.clone())),
            activity_log_repo: Arc::new(PostgresActivityLogRepository::new(pool.clone())),
            clock: Arc::new(SystemClock),
            cancellation,
        }
    }
}

/// DI コンテナの構築とルーター定義を行う
///
/// リポジトリ → サービス → ユースケース → State → Router の順に組み立てる。
pub fn build_app(deps: AppDependencies, readiness_state: Arc<ReadinessState>) -> Router {
    // 副作用サービス（fire-and-forget）
    let activity = ActivityLogger::new(deps.activity_log_repo, deps.clock.clone());
    let notification =
        NotificationService::new(deps.notification_repo.clone(), deps.clock.clone());

    let expense_state = Arc::new(ExpenseState {
        usecase: ExpenseUseCaseImpl::new(
            deps.expense_repo,
            activity,
            notification,
            deps.clock.clone(),
            deps.cancellation,
        ),
    });

    let notification_state = Arc::new(NotificationState {
        usecase: NotificationInboxUseCaseImpl::new(deps.notification_repo, deps.clock),
    });

    // Request ID レイヤー（下に書いたものが外側）
    // 1. SetRequestIdLayer（最外）: リクエスト受信時に UUID を生成（またはクライアント提供値を使用）
    // 2. TraceLayer: スパンに request_id を含め、全ログに自動注入
    // 3. PropagateRequestIdLayer: レスポンスヘッダーに X-Request-Id をコピー
    Router::new()
        .route("/health", get(health_check))
        .merge(
            Router::new()
                .route("/health/ready", get(readiness_check))
                .with_state(readiness_state),
        )
        // 経費 API
        .merge(
            Router::new()
                .route(
                    "/internal/expenses",
                    get(list_expenses).post(create_expense),
                )
                .route(
                    "/internal/expenses/cancellation-requests/pending",
                    get(list_pending_cancellation_requests),
                )
                .route(
                    "/internal/expenses/{expense_id}",
                    get(get_expense).patch(update_expense),
                )
                .route(
                    "/internal/expenses/{expense_id}/cancellation-request",
                    post(request_cancellation),
                )
                .route(
                    "/internal/expenses/{expense_id}/cancellation-request/reject",
                    post(reject_cancellation_request),
                )
                .route(
                    "/internal/expenses/{expense_id}/cancel",
                    post(cancel_expense),
                )
                .route("/internal/expense-categories", get(list_expense_categories))
                .with_state(expense_state),
        )
        // 通知 API
        .merge(
            Router::new()
                .route(
                    "/internal/users/{user_id}/notifications",
                    get(list_notifications),
                )
                .route(
                    "/internal/users/{user_id}/notifications/read-all",
                    post(mark_all_notifications_as_read),
                )
                .route(
                    "/internal/notifications/{notification_id}/read",
                    post(mark_notification_as_read),
                )
                .with_state(notification_state),
        )
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http().make_span_with(make_request_span))
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
}

/// HTTP リクエストのスパンを作る
fn make_request_span(request: &Request<Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("-");

    tracing::info_span!(
        "http_request",
        method = %request.method(),
        uri = %request.uri(),
        request_id = %request_id,
    )
}
