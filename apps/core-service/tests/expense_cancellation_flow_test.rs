//! 経費取消フロー統合テスト
//!
//! 本番と同じルーター（`build_app`）にインメモリのモックリポジトリを差し込み、
//! 登録 → 申請 → 承認/却下 の一連の操作を HTTP 経由で検証する。
//!
//! ## ハンドラテストとの違い
//!
//! - ハンドラテスト: 個別エンドポイントのステータスコードを検証
//! - 本テスト: 複数操作を横断した経費・通知・操作履歴の整合性を検証
//!
//! ## テストケース
//!
//! - 申請 → 承認: 取消済みになり、申請者と承認者の両方が残り、申請者に承認通知
//! - 申請 → 却下: 有効のまま申請が消え、申請者に却下通知
//! - 直接取消: 申請者なしで取消済みになり、通知は送られない
//! - 取消済みの経費には申請・取消・却下・編集のいずれも適用されない
//! - 承認待ち一覧は申請中の経費だけを申請日時の新しい順に返す

use std::sync::{
    Arc,
    atomic::{AtomicI64, Ordering},
};

use aleya_core_service::{
    app_builder::{AppDependencies, build_app},
    config::CancellationConfig,
    handler::ReadinessState,
};
use aleya_domain::{activity_log::ActivityAction, clock::Clock, notification::NotificationType};
use aleya_infra::mock::{
    MockActivityLogRepository,
    MockExpenseRepository,
    MockNotificationRepository,
};
use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode},
};
use chrono::{DateTime, Duration, Utc};
use pretty_assertions::assert_eq;
use serde_json::{Value as JsonValue, json};
use sqlx::postgres::PgPoolOptions;
use tower::ServiceExt;
use uuid::Uuid;

// --- テストヘルパー ---

/// 呼ばれるたびに 1 分進む時計
struct SteppingClock {
    base:  DateTime<Utc>,
    steps: AtomicI64,
}

impl Clock for SteppingClock {
    fn now(&self) -> DateTime<Utc> {
        let step = self.steps.fetch_add(1, Ordering::SeqCst);
        self.base + Duration::minutes(step)
    }
}

struct TestApp {
    router:        Router,
    notifications: MockNotificationRepository,
    activity:      MockActivityLogRepository,
}

fn create_test_app(cancellation: CancellationConfig) -> TestApp {
    let notifications = MockNotificationRepository::new();
    let activity = MockActivityLogRepository::new();
    let clock = Arc::new(SteppingClock {
        base:  DateTime::from_timestamp(1_736_000_000, 0).unwrap(),
        steps: AtomicI64::new(0),
    });

    let deps = AppDependencies {
        expense_repo: Arc::new(MockExpenseRepository::new()),
        notification_repo: Arc::new(notifications.clone()),
        activity_log_repo: Arc::new(activity.clone()),
        clock,
        cancellation,
    };
    // readiness は叩かないので接続しないプールで足りる
    let pool = PgPoolOptions::new()
        .connect_lazy("postgres://localhost/unused")
        .unwrap();

    TestApp {
        router: build_app(deps, Arc::new(ReadinessState { pool })),
        notifications,
        activity,
    }
}

async fn send(
    app: &TestApp,
    method: Method,
    uri: &str,
    body: Option<JsonValue>,
) -> (StatusCode, JsonValue) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        JsonValue::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

async fn create_expense(app: &TestApp, category: &str, amount: i64) -> String {
    let (status, body) = send(
        app,
        Method::POST,
        "/internal/expenses",
        Some(json!({
            "category": category,
            "amount": amount,
            "date": "2025-01-03",
            "paymentMethod": "cash",
            "actorId": Uuid::now_v7(),
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body["data"]["id"].as_str().unwrap().to_string()
}

async fn request_cancellation(app: &TestApp, expense_id: &str, requester: Uuid) -> StatusCode {
    send(
        app,
        Method::POST,
        &format!("/internal/expenses/{expense_id}/cancellation-request"),
        Some(json!({
            "reason": "Se registró en la tienda equivocada",
            "requesterId": requester,
            "requesterName": "Laura",
        })),
    )
    .await
    .0
}

async fn cancel(app: &TestApp, expense_id: &str, approver: Uuid, reason: &str) -> StatusCode {
    send(
        app,
        Method::POST,
        &format!("/internal/expenses/{expense_id}/cancel"),
        Some(json!({
            "reason": reason,
            "actorId": approver,
            "actorName": "Carlos",
            "actorRole": "superadmin",
        })),
    )
    .await
    .0
}

async fn reject(app: &TestApp, expense_id: &str, approver: Uuid) -> StatusCode {
    send(
        app,
        Method::POST,
        &format!("/internal/expenses/{expense_id}/cancellation-request/reject"),
        Some(json!({ "actorId": approver, "actorRole": "Super Admin" })),
    )
    .await
    .0
}

async fn get_expense(app: &TestApp, expense_id: &str) -> JsonValue {
    let (status, body) = send(
        app,
        Method::GET,
        &format!("/internal/expenses/{expense_id}"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    body["data"].clone()
}

// --- テストケース ---

#[tokio::test]
async fn test_申請を承認すると取消済みになり申請者に承認通知が届く() {
    // Given
    let app = create_test_app(CancellationConfig::default());
    let requester = Uuid::now_v7();
    let approver = Uuid::now_v7();
    let expense_id = create_expense(&app, "Arriendo", 500_000).await;
    assert_eq!(
        request_cancellation(&app, &expense_id, requester).await,
        StatusCode::NO_CONTENT
    );

    // When
    let status = cancel(&app, &expense_id, approver, "Aprobado, pago duplicado").await;

    // Then
    assert_eq!(status, StatusCode::NO_CONTENT);
    let expense = get_expense(&app, &expense_id).await;
    assert_eq!(expense["status"], "cancelled");
    assert_eq!(expense["hasPendingRequest"], false);
    assert_eq!(expense["cancelledBy"], json!(approver));
    assert_eq!(expense["cancelledByName"], "Carlos");
    assert_eq!(expense["cancellationReason"], "Aprobado, pago duplicado");
    assert_eq!(expense["cancellationRequestedBy"], json!(requester));
    assert_eq!(
        expense["cancellationRequestReason"],
        "Se registró en la tienda equivocada"
    );

    let notifications = app.notifications.notifications();
    assert_eq!(notifications.len(), 1);
    assert_eq!(*notifications[0].user_id.as_uuid(), requester);
    assert_eq!(
        notifications[0].notification_type,
        NotificationType::ExpenseCancellationApproved
    );
    assert_eq!(
        notifications[0].message.as_deref(),
        Some("Tu solicitud de anulación del egreso \"Arriendo\" ($\u{a0}500.000) fue aprobada.")
    );

    let actions: Vec<ActivityAction> = app.activity.logs().iter().map(|l| l.action).collect();
    assert_eq!(
        actions,
        vec![ActivityAction::ExpenseCreate, ActivityAction::ExpenseCancel]
    );

    // 受信箱からも見える
    let (status, inbox) = send(
        &app,
        Method::GET,
        &format!("/internal/users/{requester}/notifications?unreadOnly=true"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(inbox["data"][0]["type"], "expense_cancellation_approved");
    assert_eq!(inbox["data"][0]["metadata"]["expenseId"], json!(expense_id));
}

#[tokio::test]
async fn test_申請を却下すると有効のまま申請が消え申請者に却下通知が届く() {
    // Given
    let app = create_test_app(CancellationConfig::default());
    let requester = Uuid::now_v7();
    let expense_id = create_expense(&app, "Flete", 120_000).await;
    request_cancellation(&app, &expense_id, requester).await;

    // When
    let status = reject(&app, &expense_id, Uuid::now_v7()).await;

    // Then
    assert_eq!(status, StatusCode::NO_CONTENT);
    let expense = get_expense(&app, &expense_id).await;
    assert_eq!(expense["status"], "active");
    assert_eq!(expense["hasPendingRequest"], false);
    for field in [
        "cancellationRequestedAt",
        "cancellationRequestedBy",
        "cancellationRequestedByName",
        "cancellationRequestReason",
        "cancelledAt",
        "cancelledBy",
        "cancellationReason",
    ] {
        assert_eq!(expense[field], JsonValue::Null, "{field}");
    }

    let notifications = app.notifications.notifications();
    assert_eq!(notifications.len(), 1);
    assert_eq!(*notifications[0].user_id.as_uuid(), requester);
    assert_eq!(
        notifications[0].notification_type,
        NotificationType::ExpenseCancellationRejected
    );

    // 却下は既定では操作履歴に残らない
    let actions: Vec<ActivityAction> = app.activity.logs().iter().map(|l| l.action).collect();
    assert_eq!(actions, vec![ActivityAction::ExpenseCreate]);
}

#[tokio::test]
async fn test_却下の操作履歴は設定で有効にできる() {
    let app = create_test_app(CancellationConfig {
        audit_rejections: true,
    });
    let expense_id = create_expense(&app, "Flete", 120_000).await;
    request_cancellation(&app, &expense_id, Uuid::now_v7()).await;

    reject(&app, &expense_id, Uuid::now_v7()).await;

    let actions: Vec<ActivityAction> = app.activity.logs().iter().map(|l| l.action).collect();
    assert_eq!(
        actions,
        vec![
            ActivityAction::ExpenseCreate,
            ActivityAction::ExpenseCancellationReject
        ]
    );
}

#[tokio::test]
async fn test_申請なしの直接取消では申請者が残らず通知も送られない() {
    // Given
    let app = create_test_app(CancellationConfig::default());
    let approver = Uuid::now_v7();
    let expense_id = create_expense(&app, "Publicidad", 75_000).await;

    // When
    let status = cancel(
        &app,
        &expense_id,
        approver,
        "Campaña cancelada por el proveedor",
    )
    .await;

    // Then
    assert_eq!(status, StatusCode::NO_CONTENT);
    let expense = get_expense(&app, &expense_id).await;
    assert_eq!(expense["status"], "cancelled");
    assert_eq!(expense["cancelledBy"], json!(approver));
    assert_eq!(expense["cancellationRequestedBy"], JsonValue::Null);
    assert!(app.notifications.notifications().is_empty());
}

#[tokio::test]
async fn test_取消済みの経費にはどの操作も適用されず取消情報は変わらない() {
    // Given
    let app = create_test_app(CancellationConfig::default());
    let expense_id = create_expense(&app, "Arriendo", 500_000).await;
    cancel(
        &app,
        &expense_id,
        Uuid::now_v7(),
        "Gasto duplicado en el sistema",
    )
    .await;
    let cancelled = get_expense(&app, &expense_id).await;

    // When
    let second_cancel = cancel(
        &app,
        &expense_id,
        Uuid::now_v7(),
        "Otro motivo suficientemente largo",
    )
    .await;
    let request = request_cancellation(&app, &expense_id, Uuid::now_v7()).await;
    let rejection = reject(&app, &expense_id, Uuid::now_v7()).await;
    let (update, _) = send(
        &app,
        Method::PATCH,
        &format!("/internal/expenses/{expense_id}"),
        Some(json!({ "amount": 1 })),
    )
    .await;

    // Then
    assert_eq!(second_cancel, StatusCode::CONFLICT);
    assert_eq!(request, StatusCode::CONFLICT);
    assert_eq!(rejection, StatusCode::CONFLICT);
    assert_eq!(update, StatusCode::CONFLICT);
    assert_eq!(get_expense(&app, &expense_id).await, cancelled);
    assert!(app.notifications.notifications().is_empty());
}

#[tokio::test]
async fn test_申請のない経費の却下は何も変えず通知もしない() {
    let app = create_test_app(CancellationConfig::default());
    let expense_id = create_expense(&app, "Flete", 120_000).await;
    let before = get_expense(&app, &expense_id).await;

    let status = reject(&app, &expense_id, Uuid::now_v7()).await;

    assert_eq!(status, StatusCode::NO_CONTENT);
    let after = get_expense(&app, &expense_id).await;
    assert_eq!(after["status"], "active");
    assert_eq!(after["cancelledAt"], JsonValue::Null);
    assert_eq!(after["cancellationReason"], before["cancellationReason"]);
    assert!(app.notifications.notifications().is_empty());
}

#[tokio::test]
async fn test_承認待ち一覧は申請中の経費だけを申請の新しい順に返す() {
    // Given
    let app = create_test_app(CancellationConfig::default());
    let first = create_expense(&app, "Arriendo", 500_000).await;
    let second = create_expense(&app, "Flete", 120_000).await;
    let untouched = create_expense(&app, "Publicidad", 75_000).await;
    let cancelled = create_expense(&app, "Domicilios Propios", 20_000).await;
    request_cancellation(&app, &first, Uuid::now_v7()).await;
    request_cancellation(&app, &second, Uuid::now_v7()).await;
    request_cancellation(&app, &cancelled, Uuid::now_v7()).await;
    cancel(&app, &cancelled, Uuid::now_v7(), "Aprobado, pago duplicado").await;

    // When
    let (status, body) = send(
        &app,
        Method::GET,
        "/internal/expenses/cancellation-requests/pending?actorRole=superadmin",
        None,
    )
    .await;

    // Then
    assert_eq!(status, StatusCode::OK);
    let ids: Vec<&str> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec![second.as_str(), first.as_str()]);
    assert!(!ids.contains(&untouched.as_str()));
}

#[tokio::test]
async fn test_理由は前後の空白を除いて10文字以上が必要() {
    let app = create_test_app(CancellationConfig::default());
    let expense_id = create_expense(&app, "Arriendo", 500_000).await;
    let before = get_expense(&app, &expense_id).await;

    let too_short = cancel(&app, &expense_id, Uuid::now_v7(), "   123456789   ").await;
    let after_rejected = get_expense(&app, &expense_id).await;
    let exactly_ten = cancel(&app, &expense_id, Uuid::now_v7(), "   1234567890   ").await;

    assert_eq!(too_short, StatusCode::BAD_REQUEST);
    assert_eq!(after_rejected, before);
    assert_eq!(exactly_ten, StatusCode::NO_CONTENT);
    assert_eq!(
        get_expense(&app, &expense_id).await["cancellationReason"],
        "1234567890"
    );
}
