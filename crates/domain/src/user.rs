//! # ユーザー（操作者）
//!
//! 経費の登録・取消申請・承認を行う操作者の識別子と表示名。
//!
//! 認証・ロール解決は外部（認証基盤）の責務であり、このクレートでは
//! 受け取った ID と名前を値オブジェクトとして扱うだけにとどめる。

define_uuid_id! {
    /// ユーザー ID
    ///
    /// 認証基盤が払い出した UUID をそのまま保持する。
    pub struct UserId;
}

define_validated_string! {
    /// 操作者の表示名
    ///
    /// 取消申請者名・承認者名として経費に記録され、レビュー画面に表示される。
    pub struct ActorName {
        label: "操作者名",
        min_length: 1,
        max_length: 200,
    }
}
