//! 送信ボディの組み立て
//!
//! 呼び出し側のパラメータに識別情報をマージし、署名を付けて最終ボディを返す。
//! ここでは送信もストアへの書き込みも行わない（nonceは呼び出し側が渡す）。

use crate::common::error::{CommonError, FkResult};
use crate::signature::{render_value, Params, SignatureScheme};
use serde::Serialize;
use serde_json::Value;

/// ゲートウェイのnonceフィールド名
pub const NONCE_FIELD: &str = "nonce";
/// ゲートウェイのマーチャント識別フィールド名
pub const SHOP_ID_FIELD: &str = "shopId";
/// ゲートウェイの署名フィールド名
pub const GATEWAY_SIGNATURE_FIELD: &str = "signature";

/// ウォレットの識別フィールド名
pub const WALLET_ID_FIELD: &str = "wallet_id";
/// ウォレットの署名フィールド名
pub const WALLET_SIGNATURE_FIELD: &str = "sign";
/// ウォレットの操作識別フィールド名
pub const ACTION_FIELD: &str = "action";

/// シリアライズ可能な型をパラメータに変換する（`None`のフィールドは含めない）
pub fn to_params<T: Serialize>(value: &T) -> FkResult<Params> {
    match serde_json::to_value(value)? {
        Value::Object(map) => Ok(map),
        Value::Null => Ok(Params::new()),
        other => Err(CommonError::Validation(format!(
            "Request parameters must serialize to an object, got {}",
            other
        ))
        .into()),
    }
}

/// ゲートウェイ用ボディを組み立てる
///
/// `nonce`と`shopId`をマージしてキー順にソートし、ソート済みの内容に署名してから
/// 末尾に`signature`を追加する。
pub fn build_gateway_body(
    params: Params,
    nonce: i64,
    shop_id: i64,
    api_key: &str,
) -> FkResult<Params> {
    let mut merged = params;
    merged.retain(|key, _| key != GATEWAY_SIGNATURE_FIELD);
    merged.insert(NONCE_FIELD.to_string(), Value::from(nonce));
    merged.insert(SHOP_ID_FIELD.to_string(), Value::from(shop_id));

    let mut entries: Vec<(String, Value)> = merged.into_iter().collect();
    entries.sort_by(|a, b| a.0.cmp(&b.0));
    let mut body: Params = entries.into_iter().collect();

    let signature = SignatureScheme::GATEWAY.sign(&body, api_key)?;
    body.insert(GATEWAY_SIGNATURE_FIELD.to_string(), Value::String(signature));
    Ok(body)
}

/// ウォレット用ボディを組み立てる
///
/// 呼び出し側のフィールドの後に`wallet_id`を置き、その順序のまま署名して`sign`を追加し、
/// 最後に`action`を追加する。`action`は署名対象に含まれない。
pub fn build_wallet_body(
    params: Params,
    wallet_id: &str,
    wallet_api_key: &str,
    action: &str,
) -> FkResult<Params> {
    let mut body = params;
    // removeは順序を崩すためretainで除く
    body.retain(|key, _| key != WALLET_SIGNATURE_FIELD && key != ACTION_FIELD);
    body.insert(
        WALLET_ID_FIELD.to_string(),
        Value::String(wallet_id.to_string()),
    );

    let signature = SignatureScheme::WALLET.sign(&body, wallet_api_key)?;
    body.insert(WALLET_SIGNATURE_FIELD.to_string(), Value::String(signature));
    body.insert(ACTION_FIELD.to_string(), Value::String(action.to_string()));
    Ok(body)
}

/// ボディをフォームエンコード用のキーと値の組にする
pub fn form_pairs(body: &Params) -> FkResult<Vec<(String, String)>> {
    body.iter()
        .map(|(key, value)| Ok((key.clone(), render_value(key, value)?)))
        .collect()
}
