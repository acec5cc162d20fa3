//! 経費の登録・編集

use aleya_domain::{
    activity_log::ActivityAction,
    expense::{
        Expense,
        ExpenseAmount,
        ExpenseCategory,
        ExpenseChanges,
        ExpenseId,
        NewExpense,
        PaymentMethod,
        normalize_notes,
    },
    notification::format_cop,
};
use aleya_shared::{
    event_log::{error as log_error, event},
    log_business_event,
};
use serde_json::{Map, Value as JsonValue, json};

use super::{CreateExpenseInput, ExpenseUseCaseImpl, UpdateExpenseInput};
use crate::error::CoreError;

impl ExpenseUseCaseImpl {
    /// 経費を登録する
    ///
    /// 操作者が指定されていれば `expense_create` を操作履歴に記録する。
    ///
    /// ## エラー
    ///
    /// - `CoreError::BadRequest`: カテゴリ・金額・支払方法が不正
    /// - `CoreError::Database`: 保存に失敗
    pub async fn create_expense(&self, input: CreateExpenseInput) -> Result<Expense, CoreError> {
        let category = ExpenseCategory::new(input.category)?;
        let amount = ExpenseAmount::new(input.amount)?;
        let payment_method: PaymentMethod = input.payment_method.parse()?;

        let expense = Expense::new(NewExpense {
            id: ExpenseId::new(),
            store_id: input.store_id,
            category,
            amount,
            date: input.date,
            payment_method,
            notes: input.notes,
            now: self.clock.now(),
        });

        self.expense_repo.insert(&expense).await?;

        log_business_event!(
            event.category = event::category::EXPENSE,
            event.action = event::action::EXPENSE_CREATED,
            event.entity_type = event::entity_type::EXPENSE,
            event.entity_id = %expense.id(),
            event.result = event::result::SUCCESS,
            "経費を登録"
        );

        if let Some(actor_id) = &input.actor_id {
            let mut details = Map::new();
            details.insert("category".to_string(), json!(expense.category()));
            details.insert("amount".to_string(), json!(expense.amount()));
            details.insert("date".to_string(), json!(expense.date()));
            details.insert("paymentMethod".to_string(), json!(expense.payment_method()));
            self.activity
                .record_expense(
                    actor_id,
                    ActivityAction::ExpenseCreate,
                    expense.id(),
                    format!(
                        "Registró el egreso \"{}\" por {}",
                        expense.category(),
                        format_cop(expense.amount())
                    ),
                    details,
                )
                .await;
        }

        Ok(expense)
    }

    /// 有効な経費の内容を部分更新する
    ///
    /// 取消済み・存在しない経費、またはインフラエラーの場合は `Ok(false)`。
    /// 操作者が指定されていれば、変更したフィールド名を `expense_update` として記録する。
    ///
    /// ## エラー
    ///
    /// - `CoreError::BadRequest`: 変更内容が空、または値が不正
    pub async fn update_expense(
        &self,
        expense_id: &ExpenseId,
        input: UpdateExpenseInput,
    ) -> Result<bool, CoreError> {
        let changes = ExpenseChanges {
            store_id: input.store_id,
            category: input.category.map(ExpenseCategory::new).transpose()?,
            amount: input.amount.map(ExpenseAmount::new).transpose()?,
            date: input.date,
            payment_method: input
                .payment_method
                .map(|m| m.parse::<PaymentMethod>())
                .transpose()?,
            notes: input.notes.map(normalize_notes),
        };
        if changes.is_empty() {
            return Err(CoreError::BadRequest("変更内容がありません".to_string()));
        }

        let updated = match self
            .expense_repo
            .update_details(expense_id, &changes, self.clock.now())
            .await
        {
            Ok(updated) => updated,
            Err(e) => {
                tracing::error!(
                    error.category = log_error::category::INFRASTRUCTURE,
                    error.kind = log_error::kind::DATABASE,
                    error = %e,
                    %expense_id,
                    "経費の更新に失敗"
                );
                return Ok(false);
            }
        };

        let changed_fields = changes.changed_fields();
        let result = if updated {
            event::result::SUCCESS
        } else {
            event::result::NOT_APPLIED
        };
        log_business_event!(
            event.category = event::category::EXPENSE,
            event.action = event::action::EXPENSE_UPDATED,
            event.entity_type = event::entity_type::EXPENSE,
            event.entity_id = %expense_id,
            event.result = result,
            changed_fields = ?changed_fields,
            "経費を更新"
        );

        if updated && let Some(actor_id) = &input.actor_id {
            let mut details = Map::new();
            details.insert(
                "changedFields".to_string(),
                JsonValue::from(changed_fields.clone()),
            );
            self.activity
                .record_expense(
                    actor_id,
                    ActivityAction::ExpenseUpdate,
                    expense_id,
                    format!("Editó el egreso ({})", changed_fields.join(", ")),
                    details,
                )
                .await;
        }

        Ok(updated)
    }
}
