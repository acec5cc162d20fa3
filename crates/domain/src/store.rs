//! # 店舗
//!
//! 経費を店舗単位に紐づけるための識別子。
//! 店舗に紐づかない経費（管理者が登録した全体経費）は `None` で表現する。

define_uuid_id! {
    /// 店舗 ID
    pub struct StoreId;
}
