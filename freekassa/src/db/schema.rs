//! 監査ストアの接続とテーブル作成
//!
//! マイグレーションは行わない。構築時に`CREATE TABLE IF NOT EXISTS`でテーブルを保証するだけ。

use crate::common::error::{FkError, FkResult};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::path::Path;
use std::str::FromStr;

const CREATE_GATEWAY_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS gateway_requests (
    nonce INTEGER PRIMARY KEY NOT NULL,
    url TEXT NOT NULL,
    body_request TEXT NOT NULL,
    status TEXT NOT NULL,
    body_response TEXT NOT NULL,
    date_time TEXT NOT NULL
)
"#;

const CREATE_WALLET_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS wallet_requests (
    num_request INTEGER PRIMARY KEY AUTOINCREMENT,
    body_request TEXT NOT NULL,
    status TEXT NOT NULL,
    body_response TEXT NOT NULL,
    date_time TEXT NOT NULL
)
"#;

/// ファイルベースのストアを開く（存在しなければ作成）
///
/// 両バックエンドのクライアントが1本の接続を共有する。
pub async fn open_database(path: &Path) -> FkResult<SqlitePool> {
    let options = SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(true);

    tracing::info!("Opening request log database: {}", path.display());
    let pool = single_connection_pool(options).await?;
    ensure_tables(&pool).await?;
    Ok(pool)
}

/// インメモリストアを開く（テスト用）
pub async fn open_in_memory() -> FkResult<SqlitePool> {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")
        .map_err(|e| FkError::Database(format!("Invalid database options: {}", e)))?;
    let pool = single_connection_pool(options).await?;
    ensure_tables(&pool).await?;
    Ok(pool)
}

async fn single_connection_pool(options: SqliteConnectOptions) -> FkResult<SqlitePool> {
    // インメモリDBは接続が閉じると消えるため、接続を張りっぱなしにする
    SqlitePoolOptions::new()
        .max_connections(1)
        .min_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await
        .map_err(|e| FkError::Database(format!("Failed to connect to database: {}", e)))
}

/// 両バックエンドのテーブルを保証する
pub async fn ensure_tables(pool: &SqlitePool) -> FkResult<()> {
    let mut tx = pool
        .begin()
        .await
        .map_err(|e| FkError::Database(format!("Failed to begin transaction: {}", e)))?;

    for ddl in [CREATE_GATEWAY_TABLE, CREATE_WALLET_TABLE] {
        sqlx::query(ddl)
            .execute(&mut *tx)
            .await
            .map_err(|e| FkError::Database(format!("Failed to create table: {}", e)))?;
    }

    tx.commit()
        .await
        .map_err(|e| FkError::Database(format!("Failed to commit schema: {}", e)))?;

    tracing::debug!("Request log tables are ready");
    Ok(())
}
