//! ログインフラモジュール

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// デフォルトのログレベル（CLI出力を汚さないようwarn）
const DEFAULT_FILTER: &str = "warn";

/// ログシステムを初期化
///
/// RUST_LOG環境変数でログレベルを設定可能:
/// - warn: 警告以上（デフォルト）
/// - info: プロジェクト・タスクの状態変化
/// - debug: 実行したクエリの詳細
pub fn init() {
    tracing_subscriber::registry()
        .with(env_filter())
        .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
        .init();
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}
