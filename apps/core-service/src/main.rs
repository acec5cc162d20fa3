//! # Core Service サーバー
//!
//! 経費の登録・編集と、取消の申請・承認・却下を実行する内部サービス。
//!
//! ## アクセス制御
//!
//! Core Service は内部ネットワークからのみアクセス可能とする。
//! 認証とロールの解決は呼び出し側（フロントエンド向けサーバー）が行い、
//! 特権が必要な操作には操作者のロール文字列を渡す。
//!
//! ## 環境変数
//!
//! | 変数名 | 必須 | 説明 |
//! |--------|------|------|
//! | `CORE_HOST` | No | バインドアドレス（デフォルト: `0.0.0.0`） |
//! | `CORE_PORT` | **Yes** | ポート番号 |
//! | `DATABASE_URL` | **Yes** | PostgreSQL 接続 URL |
//! | `DATABASE_MAX_CONNECTIONS` | No | 接続プールの最大接続数（デフォルト: `10`） |
//! | `CANCELLATION_AUDIT_REJECTIONS` | No | 取消申請の却下も操作履歴に記録する（デフォルト: `false`） |
//! | `LOG_FORMAT` | No | `json` / `pretty`（デフォルト: `pretty`） |
//!
//! ## 起動方法
//!
//! ```bash
//! # 開発環境
//! cargo run -p aleya-core-service
//!
//! # 本番環境
//! CORE_PORT=3001 DATABASE_URL=postgres://... cargo run -p aleya-core-service --release
//! ```

use std::{net::SocketAddr, sync::Arc};

use aleya_core_service::{
    app_builder::{AppDependencies, build_app},
    config::CoreConfig,
    handler::ReadinessState,
};
use aleya_infra::db;
use aleya_shared::observability::{TracingConfig, init_tracing};
use anyhow::Context as _;
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env ファイルを読み込む（存在する場合）
    // 本番環境では .env ファイルは使用せず、環境変数を直接設定する
    dotenvy::dotenv().ok();

    // トレーシング初期化
    init_tracing(TracingConfig::from_env("core-service"));
    let _tracing_guard = tracing::info_span!("app", service = "core-service").entered();

    // 設定読み込み
    let config = CoreConfig::from_env().context("設定の読み込みに失敗しました")?;

    tracing::info!(
        "Core Service サーバーを起動します: {}:{}",
        config.host,
        config.port
    );

    // データベース接続プールを作成
    let pool = db::create_pool(&config.database_url, config.max_connections)
        .await
        .context("データベース接続に失敗しました")?;
    tracing::info!("データベースに接続しました");

    db::run_migrations(&pool)
        .await
        .context("マイグレーションの実行に失敗しました")?;
    tracing::info!("マイグレーションを適用しました");

    if config.cancellation.audit_rejections {
        tracing::info!("取消申請の却下を操作履歴に記録します");
    }

    let readiness_state = Arc::new(ReadinessState { pool: pool.clone() });
    let app = build_app(
        AppDependencies::postgres(&pool, config.cancellation),
        readiness_state,
    );

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .context("アドレスのパースに失敗しました")?;

    let listener = TcpListener::bind(addr).await?;
    tracing::info!("Core Service サーバーが起動しました: {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
