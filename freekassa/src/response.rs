//! 外部サービスの応答
//!
//! ステータスに関わらず、JSONとして解析できた応答はそのまま呼び出し元に返す。
//! 内容（`type: error`など）の解釈は呼び出し元の責務。

use crate::common::error::{FkError, FkResult};
use serde::de::DeserializeOwned;
use serde_json::Value;

/// 解析済みの応答
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    /// HTTPステータス
    pub status: u16,
    /// JSONボディ
    pub body: Value,
}

impl ApiResponse {
    /// 生のボディをJSONとして解析する
    pub fn parse(status: u16, raw: &str) -> FkResult<Self> {
        let body = serde_json::from_str(raw).map_err(|e| FkError::InvalidResponse {
            status,
            message: e.to_string(),
        })?;
        Ok(Self { status, body })
    }

    /// 2xxか
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// トップレベルのフィールドを取得する
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.body.get(name)
    }

    /// ボディを任意の型として取り出す
    pub fn deserialize<T: DeserializeOwned>(&self) -> FkResult<T> {
        Ok(serde_json::from_value(self.body.clone())?)
    }
}
