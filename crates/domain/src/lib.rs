//! # Aleya ドメイン層
//!
//! egresos（経費）管理と取消承認フローの中核となるドメインモデルを定義する。
//!
//! ## 設計方針
//!
//! - **エンティティ**: 一意の識別子を持つオブジェクト（例: Expense, Notification）
//! - **値オブジェクト**: 識別子を持たない不変オブジェクト（例: CancellationReason,
//!   ExpenseAmount）
//! - **ステートマシン**: 取消フローの状態を ADT で表現し、不正な状態を型で防ぐ
//! - **ドメインエラー**: ビジネスルール違反を表現するエラー型
//!
//! ## 依存関係の方向
//!
//! ```text
//! core-service → infra → domain
//! ```
//!
//! ドメイン層はインフラ層（DB、外部サービス）に一切依存しない。
//!
//! ## モジュール構成
//!
//! - [`expense`] - 経費エンティティと取消申請・承認・却下の状態遷移
//! - [`role`] - 特権ロール（スーパー管理者）の判定
//! - [`notification`] - 申請者への通知
//! - [`activity_log`] - 操作履歴（監査ログ）
//! - [`clock`] - 時刻プロバイダ
//!
//! ## 使用例
//!
//! ```rust
//! use aleya_domain::{DomainError, expense::CancellationReason};
//!
//! let reason = CancellationReason::new("  Pagado dos veces  ").unwrap();
//! assert_eq!(reason.as_str(), "Pagado dos veces");
//!
//! let err = CancellationReason::new("corto").unwrap_err();
//! assert!(matches!(err, DomainError::Validation(_)));
//! ```

#[macro_use]
mod macros;

pub mod activity_log;
pub mod clock;
pub mod error;
pub mod expense;
pub mod notification;
pub mod role;
pub mod store;
pub mod user;

pub use error::DomainError;
