//! # ヘルスチェック共通型
//!
//! liveness（`/health`）と readiness（`/health/ready`）のレスポンス型。

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// ヘルスチェックレスポンス
///
/// ```
/// use aleya_shared::HealthResponse;
///
/// let response = HealthResponse::healthy("0.1.0");
/// assert_eq!(response.status, "healthy");
/// ```
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// 稼働状態（`"healthy"`）
    pub status:  String,
    /// アプリケーションバージョン（Cargo.toml から取得）
    pub version: String,
}

impl HealthResponse {
    pub fn healthy(version: impl Into<String>) -> Self {
        Self {
            status:  "healthy".to_string(),
            version: version.into(),
        }
    }
}

/// 個別チェックの結果ステータス
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckStatus {
    Ok,
    Error,
}

/// Readiness 全体のステータス
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadinessStatus {
    /// 全依存サービスが利用可能
    Ready,
    /// 一部の依存サービスが利用不可
    NotReady,
}

/// Readiness Check レスポンス
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadinessResponse {
    pub status: ReadinessStatus,
    /// 個別チェック結果（キー: チェック名）
    pub checks: HashMap<String, CheckStatus>,
}

impl ReadinessResponse {
    /// 個別チェック結果から全体ステータスを決める
    pub fn from_checks(checks: HashMap<String, CheckStatus>) -> Self {
        let status = if checks.values().all(|c| *c == CheckStatus::Ok) {
            ReadinessStatus::Ready
        } else {
            ReadinessStatus::NotReady
        };
        Self { status, checks }
    }
}
