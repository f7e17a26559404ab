//! FreeKassaクライアント
//!
//! ゲートウェイとウォレットの両クライアントを1つの監査ストアで束ねる。
//! ストアはマーチャントごとに1つ（`<data_dir>/shop<merchant_id>.db`）。

use crate::checkout::CheckoutForm;
use crate::common::error::{CommonError, FkError, FkResult};
use crate::config::ClientConfig;
use crate::db::request_log::RequestLogStorage;
use crate::gateway::GatewayClient;
use crate::notification::Notification;
use crate::wallet::WalletClient;
use reqwest::Client;

/// FreeKassaクライアント
#[derive(Clone)]
pub struct FreeKassaClient {
    config: ClientConfig,
    storage: RequestLogStorage,
    gateway: GatewayClient,
    wallet: WalletClient,
}

impl FreeKassaClient {
    /// 設定からクライアントを作成し、マーチャント用の監査ストアを開く
    pub async fn new(config: ClientConfig) -> FkResult<Self> {
        tokio::fs::create_dir_all(&config.data_dir).await.map_err(|e| {
            CommonError::Config(format!(
                "Failed to create data directory {}: {}",
                config.data_dir.display(),
                e
            ))
        })?;
        let storage = RequestLogStorage::open(config.store_path()).await?;
        Self::with_storage(config, storage)
    }

    /// 既存の監査ストアを使ってクライアントを作成する
    pub fn with_storage(config: ClientConfig, storage: RequestLogStorage) -> FkResult<Self> {
        let http = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| FkError::Http(format!("Failed to build HTTP client: {}", e)))?;

        let gateway = GatewayClient::new(
            http.clone(),
            storage.clone(),
            config.gateway_base_url.clone(),
            config.merchant_id,
            config.api_key.clone(),
        );
        let wallet = WalletClient::new(
            http,
            storage.clone(),
            config.wallet_url.clone(),
            config.wallet_id.clone(),
            config.wallet_api_key.clone(),
        );

        tracing::info!(
            merchant_id = config.merchant_id,
            gateway = %config.gateway_base_url,
            wallet = %config.wallet_url,
            "FreeKassa client initialized"
        );

        Ok(Self {
            config,
            storage,
            gateway,
            wallet,
        })
    }

    /// ゲートウェイAPI
    pub fn gateway(&self) -> &GatewayClient {
        &self.gateway
    }

    /// ウォレットAPI
    pub fn wallet(&self) -> &WalletClient {
        &self.wallet
    }

    /// 監査ストア
    pub fn storage(&self) -> &RequestLogStorage {
        &self.storage
    }

    /// 設定
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// 決済フォームのパラメータと署名を作成する
    pub fn checkout_form(
        &self,
        amount: impl ToString,
        currency: impl Into<String>,
        order_id: impl ToString,
    ) -> CheckoutForm {
        CheckoutForm::new(
            self.config.merchant_id,
            &self.config.first_secret,
            amount,
            currency,
            order_id,
        )
    }

    /// 支払い通知の署名を検証する
    pub fn verify_notification(&self, notification: &Notification) -> bool {
        notification.verify(self.config.merchant_id, &self.config.second_secret)
    }
}
