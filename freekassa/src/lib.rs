//! FreeKassa client
//!
//! 決済ゲートウェイ（注文作成・出金・残高照会）とウォレットサービスのクライアント。
//! 送信したすべてのリクエストをローカルのSQLite監査ストアに記録する。

#![warn(missing_docs)]

/// 共通型定義
pub mod common;

/// 設定管理（環境変数ヘルパー）
pub mod config;

/// ロギング初期化ユーティリティ
pub mod logging;

/// データベースアクセス（監査ストア）
pub mod db;

/// リクエスト署名
pub mod signature;

/// 送信ボディの組み立て
pub mod request;

/// リクエストパラメータの型定義
pub mod types;

/// 外部サービスの応答
pub mod response;

/// 送信結果の捕捉
pub mod transport;

/// 決済ゲートウェイAPI
pub mod gateway;

/// ウォレットAPI
pub mod wallet;

/// 決済フォーム
pub mod checkout;

/// 支払い通知の検証
pub mod notification;

/// クライアント
pub mod client;

pub use client::FreeKassaClient;
pub use common::error::{FkError, FkResult};
pub use config::ClientConfig;
pub use db::request_log::{CallStatus, RequestLogStorage};
pub use response::ApiResponse;
