//! 決済フォーム（チェックアウトページへのリダイレクト）
//!
//! フォームの値と署名を計算するだけで、このクライアントからは何も送信しない。

use crate::signature::payment_form_signature;

/// 決済フォームのベースURL
pub const CHECKOUT_BASE_URL: &str = "https://pay.freekassa.ru/";

/// 決済フォームのパラメータ
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutForm {
    /// マーチャントID（`m`）
    pub merchant_id: i64,
    /// 金額（`oa`）。署名と同じ表記で送る
    pub amount: String,
    /// 通貨（`currency`）
    pub currency: String,
    /// ショップ側の注文番号（`o`）
    pub order_id: String,
    /// 署名（`s`）
    pub signature: String,
}

impl CheckoutForm {
    /// フォームの値と署名を作成する
    pub fn new(
        merchant_id: i64,
        first_secret: &str,
        amount: impl ToString,
        currency: impl Into<String>,
        order_id: impl ToString,
    ) -> Self {
        let amount = amount.to_string();
        let currency = currency.into();
        let order_id = order_id.to_string();
        let signature =
            payment_form_signature(merchant_id, &amount, first_secret, &currency, &order_id);

        Self {
            merchant_id,
            amount,
            currency,
            order_id,
            signature,
        }
    }

    /// フォームのフィールド（送信順）
    pub fn fields(&self) -> Vec<(&'static str, String)> {
        vec![
            ("m", self.merchant_id.to_string()),
            ("oa", self.amount.clone()),
            ("currency", self.currency.clone()),
            ("o", self.order_id.clone()),
            ("s", self.signature.clone()),
        ]
    }

    /// リダイレクト先URL
    pub fn url(&self) -> String {
        // 値はすべて文字列なのでエンコードは失敗しない
        let query = serde_urlencoded::to_string(self.fields()).unwrap_or_default();
        format!("{}?{}", CHECKOUT_BASE_URL, query)
    }
}
