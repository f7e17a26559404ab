//! 送信結果の捕捉
//!
//! HTTP呼び出しの結果を「応答を受信した」か「トランスポートが失敗した」かの
//! どちらか一方に正規化する。どちらの場合も監査ストアに1行書けるだけの情報を持つ。

use crate::common::error::{FkError, FkResult};
use crate::db::request_log::CallStatus;
use crate::response::ApiResponse;
use std::error::Error as _;

/// 1回の呼び出しの結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallOutcome {
    /// 応答を受信した（ステータスは問わない）
    Response {
        /// HTTPステータス
        status: u16,
        /// 受信した生のボディ
        body: String,
    },
    /// 応答が存在しない
    Failed {
        /// 失敗の分類
        kind: String,
        /// 人が読める説明
        description: String,
    },
}

impl CallOutcome {
    /// `reqwest`の送信結果から作成する（ボディの読み取りもここで行う）
    pub async fn capture(result: Result<reqwest::Response, reqwest::Error>) -> Self {
        let response = match result {
            Ok(response) => response,
            Err(err) => return Self::from_error(&err),
        };

        let status = response.status().as_u16();
        match response.text().await {
            Ok(body) => Self::Response { status, body },
            Err(err) => Self::from_error(&err),
        }
    }

    /// トランスポートエラーを分類する
    pub fn from_error(err: &reqwest::Error) -> Self {
        let kind = classify_error(err);
        Self::Failed {
            kind: kind.to_string(),
            description: format!("{}: {}", kind, describe_error(err)),
        }
    }

    /// 監査ストアに書くステータス
    pub fn call_status(&self) -> CallStatus {
        match self {
            Self::Response { status, .. } => CallStatus::Http(*status),
            Self::Failed { kind, .. } => CallStatus::Failed(kind.clone()),
        }
    }

    /// 監査ストアに書くレスポンスボディ
    pub fn audit_body(&self) -> &str {
        match self {
            Self::Response { body, .. } => body,
            Self::Failed { description, .. } => description,
        }
    }

    /// 呼び出し元に返す値に変換する
    ///
    /// トランスポートが失敗していれば[`FkError::NoResponse`]になる。
    pub fn into_response(self) -> FkResult<ApiResponse> {
        match self {
            Self::Response { status, body } => ApiResponse::parse(status, &body),
            Self::Failed { kind, description } => Err(FkError::NoResponse {
                kind,
                message: description,
            }),
        }
    }
}

/// 結果をログに出す
///
/// トランスポート失敗は`warn`、アプリケーションレベルの拒否は通常の応答として`debug`。
pub(crate) fn log_outcome(service: &str, endpoint: &str, outcome: &CallOutcome) {
    match outcome {
        CallOutcome::Failed { kind, description } => {
            tracing::warn!(
                service,
                endpoint,
                kind = %kind,
                "Transport failure, no response: {}",
                description
            );
        }
        CallOutcome::Response { status, .. } if !(200..300).contains(status) => {
            tracing::debug!(service, endpoint, status, "Remote service rejected the request");
        }
        CallOutcome::Response { status, .. } => {
            tracing::debug!(service, endpoint, status, "Remote service responded");
        }
    }
}

/// トランスポートエラーの分類名
pub fn classify_error(err: &reqwest::Error) -> &'static str {
    if err.is_timeout() {
        "TimedOut"
    } else if err.is_connect() {
        "ConnectError"
    } else if err.is_redirect() {
        "RedirectError"
    } else if err.is_body() || err.is_decode() {
        "BodyError"
    } else if err.is_builder() {
        "BuilderError"
    } else if err.is_request() {
        "RequestError"
    } else {
        "TransportError"
    }
}

/// エラーと原因の連鎖を1行にまとめる
fn describe_error(err: &reqwest::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
