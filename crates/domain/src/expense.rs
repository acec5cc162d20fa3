//! # 経費（egresos）
//!
//! 店舗の支出記録と、その取消承認フローを管理する。
//!
//! ## 概念モデル
//!
//! - **Expense**: 支出記録。取消フローの状態を内部に持つ
//! - **CancellationRequest**: 非特権ユーザーによる取消申請（申請者・理由・日時）
//! - **Cancellation**: 承認者（特権ユーザー）による取消の確定
//!
//! 取消申請は独立したエンティティとしては持たず、Expense の状態として表現する。
//!
//! ## 状態遷移
//!
//! ```text
//! Active ──request──▶ PendingCancellation ──cancel──▶ Cancelled
//!   │  ◀──reject────────────┘                            ▲
//!   └──────────────────────cancel────────────────────────┘
//! ```
//!
//! ## 使用例
//!
//! ```rust
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use aleya_domain::{
//!     expense::{
//!         CancellationReason, CancellationRequest, Expense, ExpenseAmount, ExpenseCategory,
//!         ExpenseId, ExpenseStatus, NewExpense, PaymentMethod,
//!     },
//!     user::{ActorName, UserId},
//! };
//! use chrono::{NaiveDate, Utc};
//!
//! let now = Utc::now();
//! let expense = Expense::new(NewExpense {
//!     id: ExpenseId::new(),
//!     store_id: None,
//!     category: ExpenseCategory::new("Arriendo")?,
//!     amount: ExpenseAmount::new(500_000)?,
//!     date: NaiveDate::from_ymd_opt(2025, 1, 5).unwrap(),
//!     payment_method: PaymentMethod::Transfer,
//!     notes: None,
//!     now,
//! });
//!
//! let pending = expense.request_cancellation(CancellationRequest {
//!     requested_at: now,
//!     requested_by: UserId::new(),
//!     requested_by_name: ActorName::new("Laura")?,
//!     reason: CancellationReason::new("Pagado dos veces por error")?,
//! })?;
//! assert!(pending.has_pending_request());
//! assert_eq!(pending.status(), ExpenseStatus::Active);
//! # Ok(())
//! # }
//! ```

mod cancellation;
mod entity;
mod values;

pub use cancellation::*;
pub use entity::*;
pub use values::*;
