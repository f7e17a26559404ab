//! 支払い通知の検証
//!
//! ゲートウェイが通知URLにPOSTしてくるフォームを解析し、署名と送信元IPを確認する。
//! 受信処理そのもの（HTTPサーバー）はこのクレートの範囲外。

use crate::common::error::{CommonError, FkResult};
use crate::common::ip::normalize_ip;
use crate::signature::{constant_time_eq, notification_signature};
use serde::Deserialize;
use std::net::{IpAddr, Ipv4Addr};

/// 通知を受理したときに返す本文
pub const NOTIFICATION_ACK: &str = "YES";

/// 通知の送信元として公開されているIP
pub const TRUSTED_NOTIFICATION_IPS: [Ipv4Addr; 4] = [
    Ipv4Addr::new(168, 119, 157, 136),
    Ipv4Addr::new(168, 119, 60, 227),
    Ipv4Addr::new(138, 201, 88, 124),
    Ipv4Addr::new(178, 154, 197, 79),
];

/// 支払い通知
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Notification {
    /// マーチャントID
    #[serde(rename = "MERCHANT_ID")]
    pub merchant_id: String,
    /// 金額（受信した表記のまま）
    #[serde(rename = "AMOUNT")]
    pub amount: String,
    /// FreeKassa側の注文番号
    #[serde(rename = "intid", default)]
    pub intid: Option<String>,
    /// ショップ側の注文番号
    #[serde(rename = "MERCHANT_ORDER_ID")]
    pub merchant_order_id: String,
    /// 支払者のメールアドレス
    #[serde(rename = "P_EMAIL", default)]
    pub payer_email: Option<String>,
    /// 支払者の電話番号
    #[serde(rename = "P_PHONE", default)]
    pub payer_phone: Option<String>,
    /// 決済システムID
    #[serde(rename = "CUR_ID", default)]
    pub currency_id: Option<String>,
    /// 署名
    #[serde(rename = "SIGN")]
    pub sign: String,
}

impl Notification {
    /// フォームエンコードされた本文から解析する
    pub fn from_form(body: &str) -> FkResult<Self> {
        serde_urlencoded::from_str(body).map_err(|e| {
            CommonError::Validation(format!("Invalid payment notification: {}", e)).into()
        })
    }

    /// 署名を検証する
    ///
    /// マーチャントIDが一致し、`MD5(merchant_id:amount:second_secret:order_id)`が
    /// `SIGN`と一致する場合のみ`true`。
    pub fn verify(&self, merchant_id: i64, second_secret: &str) -> bool {
        if self.merchant_id.trim() != merchant_id.to_string() {
            tracing::warn!(
                received = %self.merchant_id,
                "Notification for a different merchant"
            );
            return false;
        }

        let expected = notification_signature(
            merchant_id,
            &self.amount,
            second_secret,
            &self.merchant_order_id,
        );
        let valid = constant_time_eq(
            expected.as_bytes(),
            self.sign.to_ascii_lowercase().as_bytes(),
        );
        if !valid {
            tracing::warn!(
                order_id = %self.merchant_order_id,
                "Notification signature mismatch"
            );
        }
        valid
    }
}

/// 通知の送信元として信頼できるIPか
pub fn is_trusted_notification_ip(ip: IpAddr) -> bool {
    match normalize_ip(ip) {
        IpAddr::V4(v4) => TRUSTED_NOTIFICATION_IPS.contains(&v4),
        IpAddr::V6(_) => false,
    }
}
