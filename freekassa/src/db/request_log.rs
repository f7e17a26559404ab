//! リクエスト監査ログのストレージ層
//!
//! 送信したすべてのリクエストを、結果（成功・失敗を問わず）と共に1行ずつ追記する。
//! 行の更新・削除は一切行わない。
//!
//! ゲートウェイ側は`nonce`を主キーとして明示的に保存し、次のnonceは常に
//! `MAX(nonce) + 1`から導出する。ウォレット側は自動採番の連番を使う。

use crate::common::error::{FkError, FkResult};
use crate::db::schema;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// 1回の呼び出しの結果として記録されるステータス
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallStatus {
    /// トランスポートが成功し、HTTPステータスを受信した
    Http(u16),
    /// トランスポートが失敗した（失敗の分類名）
    Failed(String),
}

impl CallStatus {
    /// 保存済みの文字列から復元する
    pub fn parse(raw: &str) -> Self {
        match raw.parse::<u16>() {
            Ok(code) => Self::Http(code),
            Err(_) => Self::Failed(raw.to_string()),
        }
    }
}

impl fmt::Display for CallStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Http(code) => write!(f, "{}", code),
            Self::Failed(kind) => f.write_str(kind),
        }
    }
}

/// ゲートウェイへのリクエスト記録
#[derive(Debug, Clone, PartialEq)]
pub struct GatewayRequestRecord {
    /// 署名に使ったnonce（主キー）
    pub nonce: i64,
    /// 呼び出したURL
    pub url: String,
    /// 送信したボディ（シリアライズ済み）
    pub request_body: String,
    /// HTTPステータスまたは失敗の分類
    pub status: CallStatus,
    /// 受信したボディまたは失敗の説明
    pub response_body: String,
    /// 記録時刻
    pub timestamp: DateTime<Utc>,
}

/// ウォレットへのリクエスト記録
#[derive(Debug, Clone, PartialEq)]
pub struct WalletRequestRecord {
    /// 自動採番の連番
    pub sequence: i64,
    /// 送信したボディ（シリアライズ済み）
    pub request_body: String,
    /// HTTPステータスまたは失敗の分類
    pub status: CallStatus,
    /// 受信したボディまたは失敗の説明
    pub response_body: String,
    /// 記録時刻
    pub timestamp: DateTime<Utc>,
}

/// 予約済みのnonce
///
/// 保持している間は同じストアの他の予約がブロックされる。
/// 送信後に[`NonceReservation::mark_sent`]を呼び、記録のコミット後にdropすること。
pub struct NonceReservation {
    nonce: i64,
    last_issued: OwnedMutexGuard<i64>,
}

impl NonceReservation {
    /// 予約したnonce
    pub fn nonce(&self) -> i64 {
        self.nonce
    }

    /// nonceがネットワークに出たことを記録する
    ///
    /// 以降の予約は、監査ストアへの書き込みに失敗していてもこれより大きい値になる。
    pub fn mark_sent(&mut self) {
        *self.last_issued = (*self.last_issued).max(self.nonce);
    }
}

impl fmt::Debug for NonceReservation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NonceReservation")
            .field("nonce", &self.nonce)
            .finish()
    }
}

/// リクエスト監査ログストレージ
///
/// Clone可能。クローンは同じ接続とnonceロックを共有する。
/// ロックは送信済みの最大nonceを保持する（記録に失敗したnonceも再利用しない）。
#[derive(Clone)]
pub struct RequestLogStorage {
    pool: SqlitePool,
    nonce_lock: Arc<Mutex<i64>>,
}

impl RequestLogStorage {
    /// 既存の接続プールからストレージを作成（テーブルは作成済みであること）
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            nonce_lock: Arc::new(Mutex::new(0)),
        }
    }

    /// ファイルベースのストアを開く（テーブルが無ければ作成）
    pub async fn open(path: impl AsRef<Path>) -> FkResult<Self> {
        let pool = schema::open_database(path.as_ref()).await?;
        Ok(Self::new(pool))
    }

    /// インメモリのストアを開く
    pub async fn in_memory() -> FkResult<Self> {
        let pool = schema::open_in_memory().await?;
        Ok(Self::new(pool))
    }

    /// 次に使うゲートウェイnonce（`MAX(nonce) + 1`、記録が無ければ1）
    ///
    /// キャッシュせず毎回ストアから読む。
    pub async fn next_nonce(&self) -> FkResult<i64> {
        let max: Option<i64> = sqlx::query_scalar("SELECT MAX(nonce) FROM gateway_requests")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| FkError::Database(format!("Failed to read max nonce: {}", e)))?;

        Ok(max.map_or(1, |n| n + 1))
    }

    /// nonceを予約する
    ///
    /// 読み取り・送信・記録を1つのクリティカルセクションにまとめるため、
    /// 予約を保持している間は他の予約を待たせる。
    /// 値は`MAX(nonce) + 1`と送信済みの最大nonce + 1の大きい方。
    pub async fn reserve_nonce(&self) -> FkResult<NonceReservation> {
        let last_issued = self.nonce_lock.clone().lock_owned().await;
        let nonce = self.next_nonce().await?.max(*last_issued + 1);
        Ok(NonceReservation { nonce, last_issued })
    }

    /// ゲートウェイ呼び出しを記録する
    ///
    /// 既存のnonceと重複した場合は主キー違反としてエラーになる（上書きしない）。
    pub async fn record_gateway_call(
        &self,
        nonce: i64,
        url: &str,
        request_body: &str,
        status: &CallStatus,
        response_body: &str,
    ) -> FkResult<()> {
        let timestamp = Utc::now().to_rfc3339();
        let status = status.to_string();

        let mut tx = self.pool.begin().await.map_err(|e| {
            storage_error(format!("Failed to begin gateway record transaction: {}", e))
        })?;

        sqlx::query(
            r#"
            INSERT INTO gateway_requests (nonce, url, body_request, status, body_response, date_time)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(nonce)
        .bind(url)
        .bind(request_body)
        .bind(&status)
        .bind(response_body)
        .bind(&timestamp)
        .execute(&mut *tx)
        .await
        .map_err(|e| storage_error(format!("Failed to save gateway record {}: {}", nonce, e)))?;

        tx.commit().await.map_err(|e| {
            storage_error(format!("Failed to commit gateway record {}: {}", nonce, e))
        })?;

        tracing::debug!(nonce, status = %status, "Gateway call recorded");
        Ok(())
    }

    /// ウォレット呼び出しを記録し、採番された連番を返す
    pub async fn record_wallet_call(
        &self,
        request_body: &str,
        status: &CallStatus,
        response_body: &str,
    ) -> FkResult<i64> {
        let timestamp = Utc::now().to_rfc3339();
        let status = status.to_string();

        let mut tx = self.pool.begin().await.map_err(|e| {
            storage_error(format!("Failed to begin wallet record transaction: {}", e))
        })?;

        let result = sqlx::query(
            r#"
            INSERT INTO wallet_requests (body_request, status, body_response, date_time)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(request_body)
        .bind(&status)
        .bind(response_body)
        .bind(&timestamp)
        .execute(&mut *tx)
        .await
        .map_err(|e| storage_error(format!("Failed to save wallet record: {}", e)))?;

        tx.commit()
            .await
            .map_err(|e| storage_error(format!("Failed to commit wallet record: {}", e)))?;

        let sequence = result.last_insert_rowid();
        tracing::debug!(sequence, status = %status, "Wallet call recorded");
        Ok(sequence)
    }

    /// ゲートウェイの全記録（nonce昇順）
    pub async fn gateway_records(&self) -> FkResult<Vec<GatewayRequestRecord>> {
        let rows = sqlx::query_as::<_, GatewayRow>(
            "SELECT nonce, url, body_request, status, body_response, date_time \
             FROM gateway_requests ORDER BY nonce ASC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| FkError::Database(format!("Failed to load gateway records: {}", e)))?;

        rows.into_iter().map(|row| row.try_into()).collect()
    }

    /// ウォレットの全記録（連番昇順）
    pub async fn wallet_records(&self) -> FkResult<Vec<WalletRequestRecord>> {
        let rows = sqlx::query_as::<_, WalletRow>(
            "SELECT num_request, body_request, status, body_response, date_time \
             FROM wallet_requests ORDER BY num_request ASC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| FkError::Database(format!("Failed to load wallet records: {}", e)))?;

        rows.into_iter().map(|row| row.try_into()).collect()
    }

    /// 接続を閉じる（再オープンのテスト用）
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

fn storage_error(message: String) -> FkError {
    tracing::error!("{}", message);
    FkError::Database(message)
}

fn parse_timestamp(raw: &str) -> FkResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| FkError::Database(format!("Invalid timestamp: {}", e)))
}

/// SQLiteから取得した行データ（ゲートウェイ）
#[derive(sqlx::FromRow)]
struct GatewayRow {
    nonce: i64,
    url: String,
    body_request: String,
    status: String,
    body_response: String,
    date_time: String,
}

impl TryFrom<GatewayRow> for GatewayRequestRecord {
    type Error = FkError;

    fn try_from(row: GatewayRow) -> Result<Self, Self::Error> {
        Ok(Self {
            nonce: row.nonce,
            url: row.url,
            request_body: row.body_request,
            status: CallStatus::parse(&row.status),
            response_body: row.body_response,
            timestamp: parse_timestamp(&row.date_time)?,
        })
    }
}

/// SQLiteから取得した行データ（ウォレット）
#[derive(sqlx::FromRow)]
struct WalletRow {
    num_request: i64,
    body_request: String,
    status: String,
    body_response: String,
    date_time: String,
}

impl TryFrom<WalletRow> for WalletRequestRecord {
    type Error = FkError;

    fn try_from(row: WalletRow) -> Result<Self, Self::Error> {
        Ok(Self {
            sequence: row.num_request,
            request_body: row.body_request,
            status: CallStatus::parse(&row.status),
            response_body: row.body_response,
            timestamp: parse_timestamp(&row.date_time)?,
        })
    }
}
