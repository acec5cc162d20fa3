//! 経費の取消フロー
//!
//! ```text
//! Active ──request──▶ PendingCancellation ──cancel──▶ Cancelled
//!   │  ▲                     │
//!   │  └──────reject─────────┘
//!   └──────────────cancel（直接取消）───────────────▶ Cancelled
//! ```
//!
//! 特権ロールの確認はハンドラで行う。ここでは理由と操作者のバリデーション、
//! 条件付き書き込み、書き込み後の副作用（操作履歴・通知）を扱う。
//!
//! 承認・却下の通知先は、書き込みが返す更新直前の経費から決める。
//! 事前に別途読んだ値は使わない。

use aleya_domain::{
    activity_log::ActivityAction,
    expense::{
        Cancellation,
        CancellationReason,
        CancellationRequest,
        ExpenseId,
    },
    notification::{ExpenseNotification, format_cop},
    user::ActorName,
};
use aleya_infra::InfraError;
use aleya_shared::{
    event_log::{error as log_error, event},
    log_business_event,
};
use serde_json::{Map, json};

use super::{
    CancelExpenseInput,
    ExpenseUseCaseImpl,
    RejectCancellationInput,
    RequestCancellationInput,
};
use crate::error::CoreError;

/// 条件付き書き込みの結果をログに残し、インフラエラーを `None` に畳み込む
fn settle_write<T>(
    result: Result<Option<T>, InfraError>,
    expense_id: &ExpenseId,
    action: &'static str,
) -> Option<T> {
    match result {
        Ok(Some(prior)) => {
            log_business_event!(
                event.category = event::category::EXPENSE,
                event.action = action,
                event.entity_type = event::entity_type::EXPENSE,
                event.entity_id = %expense_id,
                event.result = event::result::SUCCESS,
                "取消フローの書き込みを適用"
            );
            Some(prior)
        }
        Ok(None) => {
            log_business_event!(
                event.category = event::category::EXPENSE,
                event.action = action,
                event.entity_type = event::entity_type::EXPENSE,
                event.entity_id = %expense_id,
                event.result = event::result::NOT_APPLIED,
                "有効な経費が見つからず書き込みを適用しなかった"
            );
            None
        }
        Err(e) => {
            tracing::error!(
                error.category = log_error::category::INFRASTRUCTURE,
                error.kind = log_error::kind::DATABASE,
                error = %e,
                %expense_id,
                event.action = action,
                "取消フローの書き込みに失敗"
            );
            None
        }
    }
}

impl ExpenseUseCaseImpl {
    /// 取消を申請する（一般ユーザー）
    ///
    /// 申請情報を記録するだけで、通知は送らない。
    /// 申請中の経費に再申請した場合は既存の申請を置き換える。
    ///
    /// ## 戻り値
    ///
    /// - `Ok(true)`: 申請を記録した
    /// - `Ok(false)`: 有効な経費が無い（取消済み・存在しない）、またはインフラエラー
    ///
    /// ## エラー
    ///
    /// - `CoreError::BadRequest`: 理由が 10 文字未満、または申請者名が空
    pub async fn request_cancellation(
        &self,
        expense_id: &ExpenseId,
        input: RequestCancellationInput,
    ) -> Result<bool, CoreError> {
        let reason = CancellationReason::new(input.reason)?;
        let requester_name = ActorName::new(input.requester_name)?;

        let request = CancellationRequest {
            requested_at: self.clock.now(),
            requested_by: input.requester_id,
            requested_by_name: requester_name,
            reason,
        };

        let result = self
            .expense_repo
            .request_cancellation(expense_id, &request)
            .await
            .map(|applied| applied.then_some(()));

        Ok(settle_write(
            result,
            expense_id,
            event::action::CANCELLATION_REQUESTED,
        )
        .is_some())
    }

    /// 経費を取消す（特権ユーザーによる直接取消、または申請の承認）
    ///
    /// 成功した場合は `expense_cancel` を操作履歴に記録し、
    /// 書き込みの時点で申請中だった場合は申請者に承認の通知を送る。
    ///
    /// ## 戻り値
    ///
    /// - `Ok(true)`: 取消済みにした
    /// - `Ok(false)`: 有効な経費が無い（既に取消済み・存在しない）、またはインフラエラー
    ///
    /// ## エラー
    ///
    /// - `CoreError::BadRequest`: 理由が 10 文字未満
    pub async fn cancel_expense(
        &self,
        expense_id: &ExpenseId,
        input: CancelExpenseInput,
    ) -> Result<bool, CoreError> {
        let reason = CancellationReason::new(input.reason)?;

        let cancellation = Cancellation {
            cancelled_at: self.clock.now(),
            cancelled_by: input.actor_id,
            cancelled_by_name: input.actor_name.filter(|name| !name.trim().is_empty()),
            reason,
        };

        let result = self.expense_repo.cancel(expense_id, &cancellation).await;
        let Some(prior) = settle_write(result, expense_id, event::action::EXPENSE_CANCELLED)
        else {
            return Ok(false);
        };

        let pending_request = prior
            .cancellation_request()
            .filter(|_| prior.has_pending_request());

        let mut details = Map::new();
        details.insert("reason".to_string(), json!(cancellation.reason));
        details.insert("category".to_string(), json!(prior.category()));
        details.insert("amount".to_string(), json!(prior.amount()));
        details.insert(
            "requestedBy".to_string(),
            json!(pending_request.map(|r| &r.requested_by)),
        );
        self.activity
            .record_expense(
                &cancellation.cancelled_by,
                ActivityAction::ExpenseCancel,
                expense_id,
                format!(
                    "Anuló el egreso \"{}\" ({})",
                    prior.category(),
                    format_cop(prior.amount())
                ),
                details,
            )
            .await;

        if let Some(request) = pending_request {
            self.notification
                .notify(ExpenseNotification::CancellationApproved {
                    expense_id:   expense_id.clone(),
                    category:     prior.category().to_string(),
                    amount:       prior.amount(),
                    requester_id: request.requested_by.clone(),
                })
                .await;
        }

        Ok(true)
    }

    /// 取消申請を却下する（特権ユーザー）
    ///
    /// 申請情報を消去して経費を有効なままにする。申請が無くても有効な経費なら成功する。
    /// 書き込みの時点で申請中だった場合は、その申請者に却下の通知を送る。
    /// 操作履歴は `CANCELLATION_AUDIT_REJECTIONS` を有効にした場合のみ記録する。
    ///
    /// ## 戻り値
    ///
    /// - `Ok(true)`: 申請を消去した
    /// - `Ok(false)`: 有効な経費が無い、またはインフラエラー
    pub async fn reject_cancellation_request(
        &self,
        expense_id: &ExpenseId,
        input: RejectCancellationInput,
    ) -> Result<bool, CoreError> {
        let result = self
            .expense_repo
            .clear_cancellation_request(expense_id, self.clock.now())
            .await;
        let Some(prior) = settle_write(result, expense_id, event::action::CANCELLATION_REJECTED)
        else {
            return Ok(false);
        };

        let pending_request = prior
            .cancellation_request()
            .filter(|_| prior.has_pending_request());

        if let Some(request) = pending_request {
            self.notification
                .notify(ExpenseNotification::CancellationRejected {
                    expense_id:   expense_id.clone(),
                    category:     prior.category().to_string(),
                    amount:       prior.amount(),
                    requester_id: request.requested_by.clone(),
                })
                .await;
        }

        if self.config.audit_rejections
            && let Some(actor_id) = &input.actor_id
        {
            let mut details = Map::new();
            details.insert("category".to_string(), json!(prior.category()));
            details.insert(
                "requestedBy".to_string(),
                json!(pending_request.map(|r| &r.requested_by)),
            );
            details.insert(
                "requestReason".to_string(),
                json!(pending_request.map(|r| &r.reason)),
            );
            self.activity
                .record_expense(
                    actor_id,
                    ActivityAction::ExpenseCancellationReject,
                    expense_id,
                    format!(
                        "Rechazó la solicitud de anulación del egreso \"{}\"",
                        prior.category()
                    ),
                    details,
                )
                .await;
        }

        Ok(true)
    }
}
