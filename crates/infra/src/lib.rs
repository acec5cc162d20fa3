//! # Aleya インフラ層
//!
//! PostgreSQL との接続と、ドメインモデルの永続化を担当する。
//!
//! ## 責務
//!
//! - **データベース接続**: PostgreSQL への接続プール管理とマイグレーション
//! - **リポジトリ実装**: 経費・通知・操作履歴の読み書き
//! - **テスト用モック**: `test-utils` feature で公開するインメモリ実装
//!
//! ## 依存関係
//!
//! ```text
//! core-service → infra → domain
//! ```
//!
//! ## 使用例
//!
//! ```rust,ignore
//! use aleya_infra::{db, repository::PostgresExpenseRepository};
//!
//! async fn setup() -> Result<(), Box<dyn std::error::Error>> {
//!     let pool = db::create_pool("postgres://localhost/aleya", 10).await?;
//!     let expenses = PostgresExpenseRepository::new(pool);
//!     Ok(())
//! }
//! ```

pub mod db;
pub mod error;
#[cfg(any(test, feature = "test-utils"))]
pub mod mock;
pub mod repository;

pub use error::{InfraError, InfraErrorKind};
