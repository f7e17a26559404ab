//! データベースアクセス層
//!
//! SQLiteベースの監査ログ（送信したすべてのリクエストとその結果）

/// 接続とテーブル作成
pub mod schema;

/// リクエスト監査ログ
pub mod request_log;
