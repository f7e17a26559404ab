//! リクエスト署名
//!
//! パラメータの**値**（キーではない）を正規化した順序で区切り文字により連結し、
//! 末尾に区切り文字と秘密鍵を付けてMD5を取り、小文字16進で返す。
//!
//! 正規化はバックエンドごとに固定:
//! - ゲートウェイ: キーの辞書順にソート、区切り`|`
//! - ウォレット: 挿入順のまま、区切りなし
//!
//! 署名フィールド自体は署名対象に含めない。

use crate::common::error::{CommonError, FkResult};
use md5::{Digest, Md5};
use serde_json::{Map, Value};

/// リクエストパラメータ（挿入順を保持するJSONオブジェクト）
pub type Params = Map<String, Value>;

/// 署名前のフィールド順序の決め方
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Canonicalization {
    /// キーの辞書順
    Sorted,
    /// 呼び出し側の挿入順
    InsertionOrder,
}

/// バックエンドごとの署名方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignatureScheme {
    /// 値の区切り文字
    pub separator: &'static str,
    /// フィールド順序
    pub canonicalization: Canonicalization,
}

impl SignatureScheme {
    /// ゲートウェイAPI（ソート、`|`区切り）
    pub const GATEWAY: Self = Self {
        separator: "|",
        canonicalization: Canonicalization::Sorted,
    };

    /// ウォレットAPI（挿入順、区切りなし）
    pub const WALLET: Self = Self {
        separator: "",
        canonicalization: Canonicalization::InsertionOrder,
    };

    /// ハッシュ対象の文字列を組み立てる
    pub fn signing_string(&self, params: &Params, secret: &str) -> FkResult<String> {
        let mut entries: Vec<(&String, &Value)> = params.iter().collect();
        if self.canonicalization == Canonicalization::Sorted {
            entries.sort_by(|a, b| a.0.cmp(b.0));
        }

        let values = entries
            .into_iter()
            .map(|(key, value)| render_value(key, value))
            .collect::<FkResult<Vec<_>>>()?;

        let mut line = values.join(self.separator);
        line.push_str(self.separator);
        line.push_str(secret);
        Ok(line)
    }

    /// 署名を計算する
    pub fn sign(&self, params: &Params, secret: &str) -> FkResult<String> {
        Ok(md5_hex(&self.signing_string(params, secret)?))
    }

    /// 受信側と同じ手順で署名を検証する
    pub fn verify(&self, params: &Params, secret: &str, signature: &str) -> FkResult<bool> {
        let expected = self.sign(params, secret)?;
        Ok(constant_time_eq(
            expected.as_bytes(),
            signature.to_ascii_lowercase().as_bytes(),
        ))
    }
}

/// パラメータ値を署名・送信用の文字列にする
///
/// 文字列はそのまま、数値はJSONと同じ表記。それ以外は受け付けない。
pub fn render_value(key: &str, value: &Value) -> FkResult<String> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(CommonError::Validation(format!(
            "Parameter '{}' must be a string or number, got {}",
            key, other
        ))
        .into()),
    }
}

/// UTF-8文字列のMD5を小文字16進で返す
pub fn md5_hex(input: &str) -> String {
    let mut hasher = Md5::new();
    hasher.update(input.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// 決済フォームの署名
///
/// `MD5(merchant_id:amount:first_secret:currency:order_id)`
pub fn payment_form_signature(
    merchant_id: i64,
    amount: &str,
    first_secret: &str,
    currency: &str,
    order_id: &str,
) -> String {
    md5_hex(&format!(
        "{}:{}:{}:{}:{}",
        merchant_id, amount, first_secret, currency, order_id
    ))
}

/// 支払い通知の署名
///
/// `MD5(merchant_id:amount:second_secret:order_id)`
pub fn notification_signature(
    merchant_id: i64,
    amount: &str,
    second_secret: &str,
    order_id: &str,
) -> String {
    md5_hex(&format!(
        "{}:{}:{}:{}",
        merchant_id, amount, second_secret, order_id
    ))
}

/// 長さ以外の情報を漏らさない比較
pub(crate) fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
