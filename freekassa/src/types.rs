//! リクエストパラメータの型定義
//!
//! 省略可能なフィールドは`None`ならボディ（と署名対象）から除外される。

use chrono::NaiveDateTime;
use serde::{Serialize, Serializer};
use std::fmt;
use std::net::IpAddr;

/// ゲートウェイが受け付ける日時の書式
pub const GATEWAY_DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// 注文ステータス
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OrderStatus {
    /// 新規
    New,
    /// 支払い済み
    Paid,
    /// エラー
    Error,
    /// キャンセル
    Cancelled,
}

impl OrderStatus {
    /// ゲートウェイ上のコード
    pub fn code(self) -> i64 {
        match self {
            Self::New => 0,
            Self::Paid => 1,
            Self::Error => 8,
            Self::Cancelled => 9,
        }
    }

    /// コードから変換する
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(Self::New),
            1 => Some(Self::Paid),
            8 => Some(Self::Error),
            9 => Some(Self::Cancelled),
            _ => None,
        }
    }
}

impl Serialize for OrderStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i64(self.code())
    }
}

fn serialize_gateway_datetime<S: Serializer>(
    value: &Option<NaiveDateTime>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match value {
        Some(dt) => serializer.collect_str(&dt.format(GATEWAY_DATETIME_FORMAT)),
        None => serializer.serialize_none(),
    }
}

/// 注文一覧・出金一覧の絞り込み条件
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderFilter {
    /// FreeKassa側の注文番号
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_id: Option<i64>,
    /// ショップ側の注文番号
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_id: Option<String>,
    /// 注文ステータス
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_status: Option<OrderStatus>,
    /// 期間の開始
    #[serde(
        skip_serializing_if = "Option::is_none",
        serialize_with = "serialize_gateway_datetime"
    )]
    pub date_from: Option<NaiveDateTime>,
    /// 期間の終了
    #[serde(
        skip_serializing_if = "Option::is_none",
        serialize_with = "serialize_gateway_datetime"
    )]
    pub date_to: Option<NaiveDateTime>,
    /// ページ
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
}

/// 注文作成パラメータ
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreateOrder {
    /// 決済システムID
    #[serde(rename = "i")]
    pub payment_system_id: i64,
    /// 購入者のメールアドレス
    pub email: String,
    /// 購入者のIP
    pub ip: IpAddr,
    /// 金額
    pub amount: f64,
    /// 通貨（例: `RUB`）
    pub currency: String,
    /// ショップ側の注文番号
    #[serde(rename = "paymentId", skip_serializing_if = "Option::is_none")]
    pub payment_id: Option<String>,
    /// 支払者の電話番号（一部の決済方法で必須）
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tel: Option<String>,
    /// 成功時URLの上書き
    #[serde(skip_serializing_if = "Option::is_none")]
    pub success_url: Option<String>,
    /// 失敗時URLの上書き
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure_url: Option<String>,
    /// 通知URLの上書き
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notification_url: Option<String>,
}

impl CreateOrder {
    /// 必須項目のみで作成する
    pub fn new(
        payment_system_id: i64,
        email: impl Into<String>,
        ip: IpAddr,
        amount: f64,
        currency: impl Into<String>,
    ) -> Self {
        Self {
            payment_system_id,
            email: email.into(),
            ip,
            amount,
            currency: currency.into(),
            payment_id: None,
            tel: None,
            success_url: None,
            failure_url: None,
            notification_url: None,
        }
    }

    /// ショップ側の注文番号を設定
    pub fn with_payment_id(mut self, payment_id: impl Into<String>) -> Self {
        self.payment_id = Some(payment_id.into());
        self
    }

    /// 電話番号を設定
    pub fn with_tel(mut self, tel: impl Into<String>) -> Self {
        self.tel = Some(tel.into());
        self
    }

    /// 成功/失敗/通知URLを上書き
    pub fn with_urls(
        mut self,
        success_url: Option<String>,
        failure_url: Option<String>,
        notification_url: Option<String>,
    ) -> Self {
        self.success_url = success_url;
        self.failure_url = failure_url;
        self.notification_url = notification_url;
        self
    }
}

/// 出金作成パラメータ
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreatePayout {
    /// 決済システムID
    #[serde(rename = "i")]
    pub payment_system_id: i64,
    /// 入金先アカウント
    pub account: String,
    /// 金額
    pub amount: f64,
    /// 通貨
    pub currency: String,
    /// ショップ側の注文番号
    #[serde(rename = "paymentId", skip_serializing_if = "Option::is_none")]
    pub payment_id: Option<String>,
}

impl CreatePayout {
    /// 必須項目のみで作成する
    pub fn new(
        payment_system_id: i64,
        account: impl Into<String>,
        amount: f64,
        currency: impl Into<String>,
    ) -> Self {
        Self {
            payment_system_id,
            account: account.into(),
            amount,
            currency: currency.into(),
            payment_id: None,
        }
    }

    /// ショップ側の注文番号を設定
    pub fn with_payment_id(mut self, payment_id: impl Into<String>) -> Self {
        self.payment_id = Some(payment_id.into());
        self
    }
}

/// ウォレットAPIの操作
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WalletAction {
    /// 残高取得
    GetBalance,
    /// SBP対応銀行一覧
    SbpList,
    /// オンライン決済サービス一覧
    Providers,
    /// 暗号資産の入金アドレス作成
    CreateCryptoAddress,
    /// 暗号資産の入金アドレス取得
    GetCryptoAddress,
}

impl WalletAction {
    /// `action`フィールドの値
    pub fn as_str(self) -> &'static str {
        match self {
            Self::GetBalance => "get_balance",
            Self::SbpList => "sbp_list",
            Self::Providers => "providers",
            Self::CreateCryptoAddress => "create_btc_address",
            Self::GetCryptoAddress => "get_btc_address",
        }
    }
}

impl fmt::Display for WalletAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
