//! ユースケース層の共通ヘルパー
//!
//! リポジトリ呼び出し結果の変換など、複数のユースケースで繰り返されるパターンを共通化する。

use aleya_infra::InfraError;

use crate::error::CoreError;

/// リポジトリの `Result<Option<T>, InfraError>` を `Result<T, CoreError>` に変換する
///
/// ```ignore
/// let expense = self.expense_repo.find_by_id(&expense_id).await
///     .or_not_found("経費")?;
/// ```
pub(crate) trait FindResultExt<T> {
    /// `None` の場合は `CoreError::NotFound`、`InfraError` の場合は `CoreError::Database` を返す
    fn or_not_found(self, entity_name: &str) -> Result<T, CoreError>;
}

impl<T> FindResultExt<T> for Result<Option<T>, InfraError> {
    fn or_not_found(self, entity_name: &str) -> Result<T, CoreError> {
        self?
            .ok_or_else(|| CoreError::NotFound(format!("{}が見つかりません", entity_name)))
    }
}
