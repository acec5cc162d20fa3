//! # Core Service ライブラリ
//!
//! Aleya Shop の経費管理と取消承認フローを実行する内部サービス。
//! バイナリ（main.rs）と結合テストから利用するため、各層をライブラリとして公開する。

pub mod app_builder;
pub mod config;
pub mod error;
pub mod handler;
pub mod usecase;
