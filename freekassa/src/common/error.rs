//! エラー型定義
//!
//! 統一エラー型（thiserror使用）
//!
//! 外部サービスが返すアプリケーションレベルの拒否（署名不一致、パラメータ不正など）は
//! エラーではなく [`crate::response::ApiResponse`] として呼び出し元に返る。
//! ここで扱うのは「応答そのものが得られなかった」「監査ログを書けなかった」
//! といったクライアント側の失敗のみ。

use thiserror::Error;

/// Common layer error type
#[derive(Debug, Error)]
pub enum CommonError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Validation error
    #[error("Validation error: {0}")]
    Validation(String),
}

/// FreeKassa client error type
#[derive(Debug, Error)]
pub enum FkError {
    /// Common layer error
    #[error(transparent)]
    Common(#[from] CommonError),

    /// Audit store error (insert, commit or schema setup failed)
    #[error("Database error: {0}")]
    Database(String),

    /// The request could not be prepared for sending
    #[error("HTTP client error: {0}")]
    Http(String),

    /// Transport failed, so there is no response to parse.
    ///
    /// The call was still written to the audit store before this error was returned.
    #[error("No response to parse ({kind}): {message}")]
    NoResponse {
        /// Failure classification (also stored as the record status)
        kind: String,
        /// Human-readable description (also stored as the record response body)
        message: String,
    },

    /// The remote side answered, but the body was not JSON
    #[error("Invalid response (HTTP {status}): {message}")]
    InvalidResponse {
        /// HTTP status code of the response
        status: u16,
        /// Parser message
        message: String,
    },
}

impl FkError {
    /// 送信に失敗し応答が存在しないエラーか
    pub fn is_transport_failure(&self) -> bool {
        matches!(self, Self::NoResponse { .. })
    }

    /// 監査ストアへの書き込み失敗か
    pub fn is_storage_failure(&self) -> bool {
        matches!(self, Self::Database(_))
    }
}

impl From<sqlx::Error> for FkError {
    fn from(err: sqlx::Error) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<serde_json::Error> for FkError {
    fn from(err: serde_json::Error) -> Self {
        Self::Common(CommonError::Serialization(err))
    }
}

/// FreeKassa client result type
pub type FkResult<T> = Result<T, FkError>;
