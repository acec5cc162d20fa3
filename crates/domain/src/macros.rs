/// UUID v7 ベースの ID 型を定義する宣言型マクロ
///
/// 以下のボイラープレートを一括生成する:
/// - Newtype 構造体（`Uuid` をラップ）
/// - `derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Display)`
/// - `new()`: UUID v7 を生成
/// - `from_uuid()`: 既存 UUID から復元
/// - `as_uuid()`: 内部 UUID への参照
/// - `Default` impl（`new()` に委譲）
///
/// # 使用例
///
/// ```rust
/// use aleya_domain::expense::ExpenseId;
///
/// let id = ExpenseId::new();
/// let restored = ExpenseId::from_uuid(*id.as_uuid());
/// assert_eq!(id, restored);
/// ```
macro_rules! define_uuid_id {
    (
        $(#[$meta:meta])*
        $vis:vis struct $Name:ident;
    ) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, PartialEq, Eq, Hash,
            serde::Serialize, serde::Deserialize,
            derive_more::Display,
        )]
        #[display("{_0}")]
        #[serde(transparent)]
        $vis struct $Name(uuid::Uuid);

        impl $Name {
            /// 新しい ID を生成する（UUID v7）
            pub fn new() -> Self {
                Self(uuid::Uuid::now_v7())
            }

            /// 既存の UUID から ID を作成する
            pub fn from_uuid(uuid: uuid::Uuid) -> Self {
                Self(uuid)
            }

            /// 内部の UUID 参照を取得する
            pub fn as_uuid(&self) -> &uuid::Uuid {
                &self.0
            }
        }

        impl Default for $Name {
            fn default() -> Self {
                Self::new()
            }
        }
    };
}

/// バリデーション付き String Newtype を定義する宣言型マクロ
///
/// 以下のボイラープレートを一括生成する:
/// - Newtype 構造体（`String` をラップ）
/// - `new()`: trim + 最小長チェック + 最大長チェック
/// - `as_str()`: 文字列参照
/// - `into_string()`: 所有権を持つ文字列に変換
/// - `Display` impl
///
/// 文字数は `chars().count()` で数える（"Nómina" は 6 文字）。
///
/// # 引数
///
/// - `label`: エラーメッセージに使うラベル（例: `"カテゴリ"`）
/// - `min_length`: trim 後の最小文字数（1 なら「必須」扱い）
/// - `max_length`: 最大文字数
macro_rules! define_validated_string {
    (
        $(#[$meta:meta])*
        $vis:vis struct $Name:ident {
            label: $label:expr,
            min_length: $min_length:expr,
            max_length: $max_length:expr $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, PartialEq, Eq,
            serde::Serialize, serde::Deserialize,
        )]
        #[serde(transparent)]
        $vis struct $Name(String);

        impl $Name {
            pub fn new(value: impl Into<String>) -> Result<Self, $crate::DomainError> {
                let value = value.into().trim().to_string();
                let length = value.chars().count();

                if length == 0 {
                    return Err($crate::DomainError::Validation(format!(
                        "{}は必須です",
                        $label
                    )));
                }

                if length < $min_length {
                    return Err($crate::DomainError::Validation(format!(
                        "{}は {} 文字以上である必要があります（現在 {} 文字）",
                        $label, $min_length, length
                    )));
                }

                if length > $max_length {
                    return Err($crate::DomainError::Validation(format!(
                        "{}は {} 文字以内である必要があります",
                        $label, $max_length
                    )));
                }

                Ok(Self(value))
            }

            /// 文字列参照を取得する
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// 所有権を持つ文字列に変換する
            pub fn into_string(self) -> String {
                self.0
            }
        }

        impl std::fmt::Display for $Name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}
