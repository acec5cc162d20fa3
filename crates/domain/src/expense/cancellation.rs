//! # 取消申請と取消確定
//!
//! 取消フローで記録される「誰が・いつ・なぜ」を値オブジェクトとして表現する。
//! 申請側（requester）と承認側（approver）の理由は別々に保持され、
//! 承認後も申請側の情報は履歴として残る。

use chrono::{DateTime, Utc};

use crate::user::{ActorName, UserId};

/// 取消理由の最小文字数（trim 後）
pub const MIN_REASON_LENGTH: usize = 10;

/// 取消理由の最大文字数
pub const MAX_REASON_LENGTH: usize = 1000;

define_validated_string! {
    /// 取消理由
    ///
    /// 申請理由・承認理由の両方に使う。前後の空白を除去したうえで
    /// [`MIN_REASON_LENGTH`] 文字以上を要求する。文字数は Unicode スカラー値で数える。
    pub struct CancellationReason {
        label: "取消理由",
        min_length: MIN_REASON_LENGTH,
        max_length: MAX_REASON_LENGTH,
    }
}

/// 取消申請（申請者側の記録）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CancellationRequest {
    pub requested_at:      DateTime<Utc>,
    pub requested_by:      UserId,
    pub requested_by_name: ActorName,
    pub reason:            CancellationReason,
}

/// 取消確定（承認者側の記録）
///
/// 特権ユーザーによる直接取消と、申請の承認の両方でこの記録が作られる。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cancellation {
    pub cancelled_at:      DateTime<Utc>,
    pub cancelled_by:      UserId,
    /// 承認者名（旧データでは欠けていることがある）
    pub cancelled_by_name: Option<String>,
    pub reason:            CancellationReason,
}
