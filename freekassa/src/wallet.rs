//! ウォレットAPIクライアント
//!
//! 単一URLに`action`フィールドで操作を指定してフォーム形式でPOSTする。
//! 署名は挿入順・区切りなしで、`action`は署名の対象外。

use crate::common::error::{FkError, FkResult};
use crate::db::request_log::RequestLogStorage;
use crate::request::{build_wallet_body, form_pairs};
use crate::response::ApiResponse;
use crate::signature::Params;
use crate::transport::{log_outcome, CallOutcome};
use crate::types::WalletAction;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use tracing::debug;

const SERVICE: &str = "wallet";

/// ウォレットAPIクライアント
#[derive(Clone)]
pub struct WalletClient {
    http: Client,
    storage: RequestLogStorage,
    url: String,
    wallet_id: String,
    api_key: String,
}

impl WalletClient {
    /// 新しいクライアントを作成
    pub fn new(
        http: Client,
        storage: RequestLogStorage,
        url: impl Into<String>,
        wallet_id: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            http,
            storage,
            url: url.into(),
            wallet_id: wallet_id.into(),
            api_key: api_key.into(),
        }
    }

    /// 任意の操作を呼び出す
    pub async fn call(&self, action: WalletAction, params: Params) -> FkResult<ApiResponse> {
        let body = build_wallet_body(params, &self.wallet_id, &self.api_key, action.as_str())?;
        let payload = serde_urlencoded::to_string(form_pairs(&body)?)
            .map_err(|e| FkError::Http(format!("Failed to encode wallet form: {}", e)))?;
        debug!(action = %action, "Sending wallet request");

        let result = self
            .http
            .post(&self.url)
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(payload.clone())
            .send()
            .await;
        let outcome = CallOutcome::capture(result).await;
        log_outcome(SERVICE, action.as_str(), &outcome);

        self.storage
            .record_wallet_call(&payload, &outcome.call_status(), outcome.audit_body())
            .await?;

        outcome.into_response()
    }

    /// ウォレット残高を取得
    pub async fn balance(&self) -> FkResult<ApiResponse> {
        self.call(WalletAction::GetBalance, Params::new()).await
    }

    /// SBP対応銀行一覧を取得
    pub async fn sbp_banks(&self) -> FkResult<ApiResponse> {
        self.call(WalletAction::SbpList, Params::new()).await
    }

    /// オンライン決済サービス一覧を取得
    pub async fn providers(&self) -> FkResult<ApiResponse> {
        self.call(WalletAction::Providers, Params::new()).await
    }

    /// 暗号資産（BTC/LTC/ETH）の入金アドレスを作成
    pub async fn create_crypto_address(&self) -> FkResult<ApiResponse> {
        self.call(WalletAction::CreateCryptoAddress, Params::new()).await
    }

    /// 暗号資産（BTC/LTC/ETH）の入金アドレスを取得
    pub async fn crypto_address(&self) -> FkResult<ApiResponse> {
        self.call(WalletAction::GetCryptoAddress, Params::new()).await
    }
}
