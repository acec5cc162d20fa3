//! 経費の値オブジェクト

use serde::{Deserialize, Serialize};
use strum::IntoStaticStr;

use crate::DomainError;

/// 登録フォームで提示する既定のカテゴリ（表示順）
///
/// 末尾の "Otros" はユーザーが任意の名称を入力するためのもの。
/// 一覧にない文字列もカテゴリとして有効。
pub const DEFAULT_EXPENSE_CATEGORIES: &[&str] = &[
    "Administración",
    "Arreglos Locativos",
    "Arriendo",
    "Bolsas Milagros",
    "Camara de Comercio",
    "Datafono y 4xmil",
    "Domicilios Propios",
    "Flete",
    "Honorarios Contabilidad",
    "Intereses y Préstamos",
    "Línea Corporativa",
    "Material/Insumos y Papelería",
    "Pago por Transacción Milagros",
    "Personal Turnos",
    "Prestaciones Sociales",
    "Publicidad",
    "Renovación Sigo Nomina",
    "Seguridad Social",
    "Seguro Local y Mercancia Protegida",
    "Servicio Público",
    "Soporte Web Contapyme",
    "Sueldos/Nómina",
    "Viáticos/Gastos Representación",
    "Otros",
];

define_validated_string! {
    /// 経費カテゴリ
    ///
    /// 既定カテゴリ（[`DEFAULT_EXPENSE_CATEGORIES`]）または任意入力の名称。
    pub struct ExpenseCategory {
        label: "カテゴリ",
        min_length: 1,
        max_length: 100,
    }
}

impl ExpenseCategory {
    /// 既定カテゴリの一つかどうか
    pub fn is_default(&self) -> bool {
        DEFAULT_EXPENSE_CATEGORIES.contains(&self.as_str())
    }
}

/// 経費金額（COP、最小通貨単位の整数）
///
/// ペソに小数単位は使わないため整数で保持する。0 以下は不正。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct ExpenseAmount(i64);

impl ExpenseAmount {
    pub fn new(value: i64) -> Result<Self, DomainError> {
        if value <= 0 {
            return Err(DomainError::Validation(format!(
                "金額は 0 より大きい必要があります（入力値: {value}）"
            )));
        }
        Ok(Self(value))
    }

    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl TryFrom<i64> for ExpenseAmount {
    type Error = DomainError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ExpenseAmount> for i64 {
    fn from(amount: ExpenseAmount) -> Self {
        amount.0
    }
}

impl std::fmt::Display for ExpenseAmount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 支払方法
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, IntoStaticStr, strum::Display,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum PaymentMethod {
    /// 現金
    Cash,
    /// 振込
    Transfer,
    /// 小口現金（caja menor）
    PettyCash,
}

impl std::str::FromStr for PaymentMethod {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cash" => Ok(Self::Cash),
            "transfer" => Ok(Self::Transfer),
            "petty-cash" => Ok(Self::PettyCash),
            _ => Err(DomainError::Validation(format!("不正な支払方法: {s}"))),
        }
    }
}

/// 経費ステータス（永続化される値）
///
/// 取消申請中かどうかはステータスではなく [`super::Expense::has_pending_request`] で判定する。
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, IntoStaticStr, strum::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ExpenseStatus {
    /// 有効
    Active,
    /// 取消済み（終端）
    Cancelled,
}

impl std::str::FromStr for ExpenseStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(Self::Active),
            "cancelled" => Ok(Self::Cancelled),
            _ => Err(DomainError::Validation(format!("不正な経費ステータス: {s}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(PaymentMethod::Cash, "cash")]
    #[case(PaymentMethod::Transfer, "transfer")]
    #[case(PaymentMethod::PettyCash, "petty-cash")]
    fn test_支払方法の文字列表現はfrom_strと往復できる(
        #[case] method: PaymentMethod,
        #[case] expected: &str,
    ) {
        let s: &str = method.into();

        assert_eq!(s, expected);
        assert_eq!(method.to_string(), expected);
        assert_eq!(PaymentMethod::from_str(expected).unwrap(), method);
        assert_eq!(
            serde_json::to_value(method).unwrap(),
            serde_json::json!(expected)
        );
    }

    #[test]
    fn test_不明な支払方法はバリデーションエラー() {
        let result = PaymentMethod::from_str("card");

        assert!(matches!(result, Err(DomainError::Validation(_))));
    }

    #[rstest]
    #[case(0)]
    #[case(-1)]
    fn test_金額は0以下を拒否する(#[case] value: i64) {
        assert!(ExpenseAmount::new(value).is_err());
    }

    #[test]
    fn test_金額は正の整数を受け付ける() {
        let amount = ExpenseAmount::new(500_000).unwrap();

        assert_eq!(amount.as_i64(), 500_000);
    }

    #[test]
    fn test_金額のデシリアライズでも0以下は拒否される() {
        let result: Result<ExpenseAmount, _> = serde_json::from_value(serde_json::json!(0));

        assert!(result.is_err());
    }

    #[test]
    fn test_カテゴリは前後の空白を除去して保持する() {
        let category = ExpenseCategory::new("  Arriendo ").unwrap();

        assert_eq!(category.as_str(), "Arriendo");
        assert!(category.is_default());
    }

    #[test]
    fn test_任意入力のカテゴリも有効() {
        let category = ExpenseCategory::new("Reparación vitrina").unwrap();

        assert!(!category.is_default());
    }

    #[test]
    fn test_空のカテゴリは拒否される() {
        assert!(ExpenseCategory::new("   ").is_err());
    }

    #[test]
    fn test_101文字のカテゴリは拒否される() {
        assert!(ExpenseCategory::new("a".repeat(100)).is_ok());
        assert!(ExpenseCategory::new("a".repeat(101)).is_err());
    }

    #[test]
    fn test_既定カテゴリの末尾はotros() {
        assert_eq!(DEFAULT_EXPENSE_CATEGORIES.len(), 24);
        assert_eq!(DEFAULT_EXPENSE_CATEGORIES.last(), Some(&"Otros"));
    }
}
