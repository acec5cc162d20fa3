//! # ドメイン層エラー定義
//!
//! ビジネスルール違反やドメイン固有の例外状態を表現するエラー型。
//!
//! ## エラーの種類と HTTP ステータスの対応
//!
//! | エラー種別 | HTTP ステータス | 用途 |
//! |-----------|----------------|------|
//! | `Validation` | 400 Bad Request | 入力値の検証失敗（理由が短すぎる等） |
//! | `NotFound` | 404 Not Found | エンティティが存在しない |
//! | `Conflict` | 409 Conflict | 状態遷移できない（既に取消済み等） |
//! | `Forbidden` | 403 Forbidden | 権限不足 |
//!
//! ## 使用例
//!
//! ```rust
//! use aleya_domain::DomainError;
//!
//! fn validate_category(category: &str) -> Result<(), DomainError> {
//!     if category.trim().is_empty() {
//!         return Err(DomainError::Validation("カテゴリは必須です".to_string()));
//!     }
//!     Ok(())
//! }
//!
//! assert!(validate_category("  ").is_err());
//! ```

use thiserror::Error;

/// ドメイン層で発生するエラー
///
/// API 層でこのエラーを受け取り、適切な HTTP レスポンスに変換する。
#[derive(Debug, Error)]
pub enum DomainError {
    /// バリデーションエラー
    ///
    /// 入力値がビジネスルールに違反している場合に使用する。
    ///
    /// # 例
    ///
    /// - 取消理由が 10 文字未満
    /// - 金額が 0 以下
    /// - 不明な支払方法
    #[error("バリデーションエラー: {0}")]
    Validation(String),

    /// エンティティが見つからない
    #[error("{entity_type} が見つかりません: {id}")]
    NotFound {
        /// エンティティの種類（"Expense", "Notification" など）
        entity_type: &'static str,
        /// 検索に使用した識別子
        id:          String,
    },

    /// 競合エラー
    ///
    /// 現在の状態では実行できない状態遷移を要求された場合に使用する。
    /// 取消済みの経費に対する再取消・取消申請などが該当する。
    #[error("競合が発生しました: {0}")]
    Conflict(String),

    /// 権限エラー
    ///
    /// 認証（Authentication）ではなく認可（Authorization）の失敗を表す。
    #[error("権限がありません: {0}")]
    Forbidden(String),
}
