//! # 特権ロール
//!
//! 取消の直接実行・申請の承認・却下ができるのは「スーパー管理者」系のロールだけ。
//! ロール文字列は認証基盤から渡され、同じ役割に複数の表記揺れがある。
//!
//! 判定は [`is_privileged`] に一本化し、呼び出し側でロール文字列を列挙しない。
//!
//! ```rust
//! use aleya_domain::role::is_privileged;
//!
//! assert!(is_privileged("Super Administrador"));
//! assert!(!is_privileged("cajero"));
//! ```

use std::str::FromStr;

/// 特権ロール（閉じた列挙）
///
/// 受け付ける表記は `superadmin` / `Super Admin` / `Super Administrador` の完全一致のみ。
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::EnumString, strum::Display)]
pub enum PrivilegedRole {
    #[strum(
        to_string = "superadmin",
        serialize = "Super Admin",
        serialize = "Super Administrador"
    )]
    SuperAdmin,
}

/// ロール文字列が特権ロールかどうかを判定する
pub fn is_privileged(role: &str) -> bool {
    PrivilegedRole::from_str(role).is_ok()
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("superadmin")]
    #[case("Super Admin")]
    #[case("Super Administrador")]
    fn test_スーパー管理者の表記はすべて特権(#[case] role: &str) {
        assert!(is_privileged(role));
    }

    #[rstest]
    #[case("admin")]
    #[case("cajero")]
    #[case("SUPERADMIN")]
    #[case("super admin")]
    #[case(" superadmin")]
    #[case("")]
    fn test_それ以外のロールは特権ではない(#[case] role: &str) {
        assert!(!is_privileged(role));
    }

    #[test]
    fn test_正規表記はsuperadmin() {
        assert_eq!(PrivilegedRole::SuperAdmin.to_string(), "superadmin");
    }
}
