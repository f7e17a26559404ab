//! ロギング初期化ユーティリティ
//!
//! `FREEKASSA_LOG`（未設定時は`RUST_LOG`、どちらもなければ`info`）でフィルタを指定する。

use tracing_subscriber::EnvFilter;

/// ログフィルタを指定する環境変数
pub const LOG_ENV: &str = "FREEKASSA_LOG";

const DEFAULT_FILTER: &str = "info";

/// 環境変数からフィルタを構築する
pub fn env_filter() -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// グローバルなtracingサブスクライバを設定する
///
/// 既に設定済みの場合は`false`を返し、何もしない。
/// クライアントを組み込むアプリケーションが独自のサブスクライバを持つ場合は呼ばなくてよい。
pub fn init() -> bool {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_target(true)
        .try_init()
        .is_ok()
}
