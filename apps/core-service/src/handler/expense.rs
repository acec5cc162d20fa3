//! # 経費ハンドラ
//!
//! Core Service の経費管理・取消フロー内部 API を提供する。
//!
//! ## エンドポイント
//!
//! - `POST /internal/expenses` - 経費登録
//! - `GET /internal/expenses?from&to` - 経費一覧（期間指定または全件）
//! - `GET /internal/expenses/{expense_id}` - 経費詳細
//! - `PATCH /internal/expenses/{expense_id}` - 経費編集
//! - `GET /internal/expense-categories` - 既定カテゴリ一覧
//! - `POST /internal/expenses/{expense_id}/cancellation-request` - 取消申請
//! - `POST /internal/expenses/{expense_id}/cancel` - 取消確定（特権）
//! - `POST /internal/expenses/{expense_id}/cancellation-request/reject` - 取消申請の却下（特権）
//! - `GET /internal/expenses/cancellation-requests/pending?actorRole` - 承認待ち一覧（特権）
//!
//! ## 特権チェック
//!
//! ロールの判定はこの層だけで行う。ユースケースは呼び出し元が特権を
//! 確認済みであることを前提にしている。

use std::sync::Arc;

use aleya_domain::{
    expense::{Expense, ExpenseId, ExpenseStatus, PaymentMethod},
    role::is_privileged,
    store::StoreId,
    user::UserId,
};
use aleya_shared::ApiResponse;
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use crate::{
    error::CoreError,
    usecase::{
        CancelExpenseInput,
        CreateExpenseInput,
        ExpenseUseCaseImpl,
        RejectCancellationInput,
        RequestCancellationInput,
        UpdateExpenseInput,
    },
};

/// 経費 API の共有状態
pub struct ExpenseState {
    pub usecase: ExpenseUseCaseImpl,
}

// --- リクエスト/レスポンス型 ---

/// 経費一覧の期間指定
///
/// `from` と `to` は両方指定するか、両方省略する。
#[derive(Debug, Deserialize)]
pub struct ListExpensesQuery {
    pub from: Option<NaiveDate>,
    pub to:   Option<NaiveDate>,
}

/// 操作者ロールのクエリパラメータ
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActorRoleQuery {
    #[serde(default)]
    pub actor_role: String,
}

/// 経費登録リクエスト
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateExpenseRequest {
    pub store_id:       Option<Uuid>,
    pub category:       String,
    pub amount:         i64,
    pub date:           NaiveDate,
    pub payment_method: String,
    pub notes:          Option<String>,
    pub actor_id:       Option<Uuid>,
}

/// 経費編集リクエスト
///
/// 省略したフィールドは変更しない。`storeId` と `notes` は `null` で消去する。
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateExpenseRequest {
    #[serde(default, deserialize_with = "double_option")]
    pub store_id:       Option<Option<Uuid>>,
    pub category:       Option<String>,
    pub amount:         Option<i64>,
    pub date:           Option<NaiveDate>,
    pub payment_method: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub notes:          Option<Option<String>>,
    pub actor_id:       Option<Uuid>,
}

/// 取消申請リクエスト
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CancellationRequestBody {
    pub reason:         String,
    pub requester_id:   Uuid,
    pub requester_name: String,
}

/// 取消確定リクエスト
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelExpenseRequest {
    pub reason:     String,
    pub actor_id:   Uuid,
    pub actor_name: Option<String>,
    #[serde(default)]
    pub actor_role: String,
}

/// 取消申請の却下リクエスト
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RejectCancellationRequest {
    pub actor_id:   Option<Uuid>,
    #[serde(default)]
    pub actor_role: String,
}

/// 経費 DTO
#[derive(Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseDto {
    pub id: Uuid,
    pub store_id: Option<Uuid>,
    pub category: String,
    pub amount: i64,
    pub date: NaiveDate,
    pub payment_method: PaymentMethod,
    pub notes: Option<String>,
    pub status: ExpenseStatus,
    pub has_pending_request: bool,
    pub cancellation_requested_at: Option<String>,
    pub cancellation_requested_by: Option<Uuid>,
    pub cancellation_requested_by_name: Option<String>,
    pub cancellation_request_reason: Option<String>,
    pub cancelled_at: Option<String>,
    pub cancelled_by: Option<Uuid>,
    pub cancelled_by_name: Option<String>,
    pub cancellation_reason: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<&Expense> for ExpenseDto {
    fn from(expense: &Expense) -> Self {
        let request = expense.cancellation_request();
        let cancellation = expense.cancellation();

        Self {
            id: *expense.id().as_uuid(),
            store_id: expense.store_id().map(|s| *s.as_uuid()),
            category: expense.category().as_str().to_string(),
            amount: expense.amount().as_i64(),
            date: expense.date(),
            payment_method: expense.payment_method(),
            notes: expense.notes().map(str::to_string),
            status: expense.status(),
            has_pending_request: expense.has_pending_request(),
            cancellation_requested_at: request.map(|r| r.requested_at.to_rfc3339()),
            cancellation_requested_by: request.map(|r| *r.requested_by.as_uuid()),
            cancellation_requested_by_name: request
                .map(|r| r.requested_by_name.as_str().to_string()),
            cancellation_request_reason: request.map(|r| r.reason.as_str().to_string()),
            cancelled_at: cancellation.map(|c| c.cancelled_at.to_rfc3339()),
            cancelled_by: cancellation.map(|c| *c.cancelled_by.as_uuid()),
            cancelled_by_name: cancellation.and_then(|c| c.cancelled_by_name.clone()),
            cancellation_reason: cancellation.map(|c| c.reason.as_str().to_string()),
            created_at: expense.created_at().to_rfc3339(),
            updated_at: expense.updated_at().to_rfc3339(),
        }
    }
}

/// フィールドの省略と `null` を区別して受け取る
///
/// 省略時は `#[serde(default)]` により `None`、`null` は `Some(None)` になる。
fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// 特権ロールでなければ 403 にする
fn ensure_privileged(actor_role: &str, action: &str) -> Result<(), CoreError> {
    if is_privileged(actor_role) {
        return Ok(());
    }
    Err(CoreError::Forbidden(format!(
        "{action}はスーパー管理者のみ実行できます"
    )))
}

/// 条件付き更新が適用されなかった場合は 409 にする
fn ensure_applied(applied: bool, message: &str) -> Result<StatusCode, CoreError> {
    if applied {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(CoreError::Conflict(message.to_string()))
    }
}

// --- ハンドラ ---

/// POST /internal/expenses
///
/// 経費を登録する。
///
/// ## レスポンス
///
/// - `201 Created`: 登録された経費
/// - `400 Bad Request`: バリデーションエラー
#[tracing::instrument(skip_all)]
pub async fn create_expense(
    State(state): State<Arc<ExpenseState>>,
    Json(req): Json<CreateExpenseRequest>,
) -> Result<impl IntoResponse, CoreError> {
    let input = CreateExpenseInput {
        store_id:       req.store_id.map(StoreId::from_uuid),
        category:       req.category,
        amount:         req.amount,
        date:           req.date,
        payment_method: req.payment_method,
        notes:          req.notes,
        actor_id:       req.actor_id.map(UserId::from_uuid),
    };

    let expense = state.usecase.create_expense(input).await?;

    let response = ApiResponse::new(ExpenseDto::from(&expense));
    Ok((StatusCode::CREATED, Json(response)))
}

/// GET /internal/expenses
///
/// 経費一覧を日付の新しい順に取得する。`from` と `to` を指定すると両端を含む期間で絞り込む。
#[tracing::instrument(skip_all)]
pub async fn list_expenses(
    State(state): State<Arc<ExpenseState>>,
    Query(query): Query<ListExpensesQuery>,
) -> Result<impl IntoResponse, CoreError> {
    let range = match (query.from, query.to) {
        (Some(from), Some(to)) => Some((from, to)),
        (None, None) => None,
        _ => {
            return Err(CoreError::BadRequest(
                "from と to は両方指定してください".to_string(),
            ));
        }
    };

    let expenses = state.usecase.list_expenses(range).await?;

    let items: Vec<ExpenseDto> = expenses.iter().map(ExpenseDto::from).collect();
    Ok((StatusCode::OK, Json(ApiResponse::new(items))))
}

/// GET /internal/expenses/{expense_id}
///
/// ## レスポンス
///
/// - `200 OK`: 経費
/// - `404 Not Found`: 経費が存在しない
#[tracing::instrument(skip_all, fields(%expense_id))]
pub async fn get_expense(
    State(state): State<Arc<ExpenseState>>,
    Path(expense_id): Path<Uuid>,
) -> Result<impl IntoResponse, CoreError> {
    let expense = state
        .usecase
        .get_expense(&ExpenseId::from_uuid(expense_id))
        .await?;

    Ok((
        StatusCode::OK,
        Json(ApiResponse::new(ExpenseDto::from(&expense))),
    ))
}

/// PATCH /internal/expenses/{expense_id}
///
/// 有効な経費の内容を編集する。
///
/// ## レスポンス
///
/// - `204 No Content`: 更新成功
/// - `400 Bad Request`: バリデーションエラー、変更項目なし
/// - `409 Conflict`: 経費が取消済みまたは存在しない
#[tracing::instrument(skip_all, fields(%expense_id))]
pub async fn update_expense(
    State(state): State<Arc<ExpenseState>>,
    Path(expense_id): Path<Uuid>,
    Json(req): Json<UpdateExpenseRequest>,
) -> Result<impl IntoResponse, CoreError> {
    let input = UpdateExpenseInput {
        store_id:       req.store_id.map(|s| s.map(StoreId::from_uuid)),
        category:       req.category,
        amount:         req.amount,
        date:           req.date,
        payment_method: req.payment_method,
        notes:          req.notes,
        actor_id:       req.actor_id.map(UserId::from_uuid),
    };

    let updated = state
        .usecase
        .update_expense(&ExpenseId::from_uuid(expense_id), input)
        .await?;

    ensure_applied(updated, "経費を更新できませんでした（取消済みまたは存在しません）")
}

/// GET /internal/expense-categories
///
/// 登録フォームに表示する既定カテゴリを表示順で返す。
pub async fn list_expense_categories(
    State(state): State<Arc<ExpenseState>>,
) -> impl IntoResponse {
    Json(ApiResponse::new(state.usecase.default_categories().to_vec()))
}

/// POST /internal/expenses/{expense_id}/cancellation-request
///
/// 取消を申請する。特権は不要。
///
/// ## レスポンス
///
/// - `204 No Content`: 申請を記録した
/// - `400 Bad Request`: 理由が短い、申請者名が空
/// - `409 Conflict`: 経費が取消済みまたは存在しない
#[tracing::instrument(skip_all, fields(%expense_id))]
pub async fn request_cancellation(
    State(state): State<Arc<ExpenseState>>,
    Path(expense_id): Path<Uuid>,
    Json(req): Json<CancellationRequestBody>,
) -> Result<impl IntoResponse, CoreError> {
    let input = RequestCancellationInput {
        reason:         req.reason,
        requester_id:   UserId::from_uuid(req.requester_id),
        requester_name: req.requester_name,
    };

    let applied = state
        .usecase
        .request_cancellation(&ExpenseId::from_uuid(expense_id), input)
        .await?;

    ensure_applied(applied, "取消申請を記録できませんでした")
}

/// POST /internal/expenses/{expense_id}/cancel
///
/// 経費を取り消す。申請があれば承認として扱い、申請者に通知する。
///
/// ## レスポンス
///
/// - `204 No Content`: 取消済みにした
/// - `400 Bad Request`: 理由が短い
/// - `403 Forbidden`: 特権ロールではない
/// - `409 Conflict`: 経費が取消済みまたは存在しない
#[tracing::instrument(skip_all, fields(%expense_id))]
pub async fn cancel_expense(
    State(state): State<Arc<ExpenseState>>,
    Path(expense_id): Path<Uuid>,
    Json(req): Json<CancelExpenseRequest>,
) -> Result<impl IntoResponse, CoreError> {
    ensure_privileged(&req.actor_role, "経費の取消")?;

    let input = CancelExpenseInput {
        reason:     req.reason,
        actor_id:   UserId::from_uuid(req.actor_id),
        actor_name: req.actor_name,
    };

    let applied = state
        .usecase
        .cancel_expense(&ExpenseId::from_uuid(expense_id), input)
        .await?;

    ensure_applied(applied, "経費を取り消せませんでした")
}

/// POST /internal/expenses/{expense_id}/cancellation-request/reject
///
/// 取消申請を却下する。申請があった場合だけ申請者に通知する。
///
/// ## レスポンス
///
/// - `204 No Content`: 申請を却下した（申請がなかった場合を含む）
/// - `403 Forbidden`: 特権ロールではない
/// - `409 Conflict`: 経費が取消済みまたは存在しない
#[tracing::instrument(skip_all, fields(%expense_id))]
pub async fn reject_cancellation_request(
    State(state): State<Arc<ExpenseState>>,
    Path(expense_id): Path<Uuid>,
    Json(req): Json<RejectCancellationRequest>,
) -> Result<impl IntoResponse, CoreError> {
    ensure_privileged(&req.actor_role, "取消申請の却下")?;

    let input = RejectCancellationInput {
        actor_id: req.actor_id.map(UserId::from_uuid),
    };

    let applied = state
        .usecase
        .reject_cancellation_request(&ExpenseId::from_uuid(expense_id), input)
        .await?;

    ensure_applied(applied, "取消申請を却下できませんでした")
}

/// GET /internal/expenses/cancellation-requests/pending
///
/// 承認待ちの取消申請を申請日時の新しい順に返す。
#[tracing::instrument(skip_all)]
pub async fn list_pending_cancellation_requests(
    State(state): State<Arc<ExpenseState>>,
    Query(query): Query<ActorRoleQuery>,
) -> Result<impl IntoResponse, CoreError> {
    ensure_privileged(&query.actor_role, "取消申請の一覧")?;

    let expenses = state.usecase.pending_cancellation_requests().await?;

    let items: Vec<ExpenseDto> = expenses.iter().map(ExpenseDto::from).collect();
    Ok((StatusCode::OK, Json(ApiResponse::new(items))))
}
