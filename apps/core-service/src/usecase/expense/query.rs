//! 経費の参照系

use aleya_domain::expense::{DEFAULT_EXPENSE_CATEGORIES, Expense, ExpenseId};
use chrono::NaiveDate;

use super::ExpenseUseCaseImpl;
use crate::{error::CoreError, usecase::helpers::FindResultExt};

impl ExpenseUseCaseImpl {
    pub async fn get_expense(&self, expense_id: &ExpenseId) -> Result<Expense, CoreError> {
        self.expense_repo
            .find_by_id(expense_id)
            .await
            .or_not_found("経費")
    }

    /// 経費一覧（日付の新しい順、同日内は登録の新しい順）
    ///
    /// 期間を指定した場合は両端を含む範囲に絞り込む。
    pub async fn list_expenses(
        &self,
        range: Option<(NaiveDate, NaiveDate)>,
    ) -> Result<Vec<Expense>, CoreError> {
        let expenses = match range {
            Some((from, to)) => {
                if from > to {
                    return Err(CoreError::BadRequest(format!(
                        "期間の開始日（{from}）が終了日（{to}）より後です"
                    )));
                }
                self.expense_repo.find_by_date_range(from, to).await?
            }
            None => self.expense_repo.find_all().await?,
        };
        Ok(expenses)
    }

    /// 承認待ちの取消申請（申請日時の新しい順）
    ///
    /// 読み込みに失敗した場合は空一覧ではなくエラーを返す。
    pub async fn pending_cancellation_requests(&self) -> Result<Vec<Expense>, CoreError> {
        Ok(self
            .expense_repo
            .find_pending_cancellation_requests()
            .await?)
    }

    /// 登録フォームで提示する既定のカテゴリ
    pub fn default_categories(&self) -> &'static [&'static str] {
        DEFAULT_EXPENSE_CATEGORIES
    }
}
