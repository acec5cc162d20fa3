//! # 通知ユースケース
//!
//! ## モジュール構成
//!
//! - [`service`] - 取消フローの承認・却下に伴うアプリ内通知の作成（fire-and-forget）
//! - [`inbox`] - 受信箱の閲覧と既読化

pub mod inbox;
pub mod service;

pub use inbox::NotificationInboxUseCaseImpl;
pub use service::NotificationService;
