//! 決済ゲートウェイAPIクライアント
//!
//! 1回の呼び出しは次の順で進む:
//! 1. nonceを予約し、署名済みボディを組み立てる
//! 2. `POST <base_url>/<endpoint>`にJSONで送信する
//! 3. 応答またはトランスポート失敗を捕捉する
//! 4. 結果に関わらず監査ストアに1行書く
//! 5. 応答をJSONとして返す（応答が無ければ[`crate::common::error::FkError::NoResponse`]）
//!
//! nonceの予約は手順4のコミットまで保持されるため、同じストアを共有する呼び出しが
//! 同じnonceを使うことはない。送信したnonceは記録に失敗しても再発行しない。

use crate::common::error::FkResult;
use crate::db::request_log::RequestLogStorage;
use crate::request::{build_gateway_body, to_params};
use crate::response::ApiResponse;
use crate::signature::Params;
use crate::transport::{log_outcome, CallOutcome};
use crate::types::{CreateOrder, CreatePayout, OrderFilter};
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use tracing::debug;

const SERVICE: &str = "gateway";

/// 残高
pub const BALANCE_ENDPOINT: &str = "balance";
/// ショップ一覧
pub const SHOPS_ENDPOINT: &str = "shops";
/// 決済システム一覧
pub const CURRENCIES_ENDPOINT: &str = "currencies";
/// 出金用決済システム一覧
pub const WITHDRAWAL_CURRENCIES_ENDPOINT: &str = "withdrawals/currencies";
/// 注文一覧
pub const ORDERS_ENDPOINT: &str = "orders";
/// 注文作成
pub const CREATE_ORDER_ENDPOINT: &str = "orders/create";
/// 出金一覧
pub const WITHDRAWALS_ENDPOINT: &str = "withdrawals";
/// 出金作成
pub const CREATE_WITHDRAWAL_ENDPOINT: &str = "withdrawals/create";

/// 決済システムの利用可否エンドポイント（`currencies/{id}/status`）
pub fn currency_status_endpoint(payment_system_id: i64) -> String {
    format!("currencies/{}/status", payment_system_id)
}

/// ゲートウェイAPIクライアント
#[derive(Clone)]
pub struct GatewayClient {
    http: Client,
    storage: RequestLogStorage,
    base_url: String,
    shop_id: i64,
    api_key: String,
}

impl GatewayClient {
    /// 新しいクライアントを作成
    ///
    /// 監査ストアは呼び出し側が渡す（ウォレットクライアントと共有してよい）。
    pub fn new(
        http: Client,
        storage: RequestLogStorage,
        base_url: impl Into<String>,
        shop_id: i64,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            http,
            storage,
            base_url: base_url.into(),
            shop_id,
            api_key: api_key.into(),
        }
    }

    /// エンドポイントの完全なURL
    pub fn endpoint_url(&self, endpoint: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            endpoint.trim_start_matches('/')
        )
    }

    /// 任意のエンドポイントを呼び出す
    pub async fn call(&self, endpoint: &str, params: Params) -> FkResult<ApiResponse> {
        let url = self.endpoint_url(endpoint);

        let mut reservation = self.storage.reserve_nonce().await?;
        let nonce = reservation.nonce();
        let body = build_gateway_body(params, nonce, self.shop_id, &self.api_key)?;
        let payload = serde_json::to_string(&body)?;
        debug!(nonce, url = %url, "Sending gateway request");

        let result = self
            .http
            .post(&url)
            .header(CONTENT_TYPE, "application/json")
            .body(payload.clone())
            .send()
            .await;
        reservation.mark_sent();
        let outcome = CallOutcome::capture(result).await;
        log_outcome(SERVICE, endpoint, &outcome);

        self.storage
            .record_gateway_call(
                nonce,
                &url,
                &payload,
                &outcome.call_status(),
                outcome.audit_body(),
            )
            .await?;
        drop(reservation);

        outcome.into_response()
    }

    /// 残高を取得
    pub async fn balance(&self) -> FkResult<ApiResponse> {
        self.call(BALANCE_ENDPOINT, Params::new()).await
    }

    /// ショップ一覧を取得
    pub async fn shops(&self) -> FkResult<ApiResponse> {
        self.call(SHOPS_ENDPOINT, Params::new()).await
    }

    /// 利用可能な決済システム一覧を取得
    pub async fn currencies(&self) -> FkResult<ApiResponse> {
        self.call(CURRENCIES_ENDPOINT, Params::new()).await
    }

    /// 出金に利用可能な決済システム一覧を取得
    pub async fn withdrawal_currencies(&self) -> FkResult<ApiResponse> {
        self.call(WITHDRAWAL_CURRENCIES_ENDPOINT, Params::new()).await
    }

    /// 決済システムが支払いに利用可能か確認
    pub async fn currency_status(&self, payment_system_id: i64) -> FkResult<ApiResponse> {
        self.call(&currency_status_endpoint(payment_system_id), Params::new()).await
    }

    /// 注文一覧を取得
    pub async fn orders(&self, filter: &OrderFilter) -> FkResult<ApiResponse> {
        self.call(ORDERS_ENDPOINT, to_params(filter)?).await
    }

    /// 注文を作成し、支払いリンクを取得
    pub async fn create_order(&self, order: &CreateOrder) -> FkResult<ApiResponse> {
        self.call(CREATE_ORDER_ENDPOINT, to_params(order)?).await
    }

    /// 出金一覧を取得
    pub async fn payouts(&self, filter: &OrderFilter) -> FkResult<ApiResponse> {
        self.call(WITHDRAWALS_ENDPOINT, to_params(filter)?).await
    }

    /// 出金を作成
    pub async fn create_payout(&self, payout: &CreatePayout) -> FkResult<ApiResponse> {
        self.call(CREATE_WITHDRAWAL_ENDPOINT, to_params(payout)?).await
    }
}
