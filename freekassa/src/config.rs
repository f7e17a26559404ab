//! Configuration management
//!
//! Provides the client configuration and helper functions for reading
//! environment variables with fallback to deprecated variable names.

use crate::common::error::{CommonError, FkResult};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// ゲートウェイAPIのデフォルトベースURL
pub const DEFAULT_GATEWAY_BASE_URL: &str = "https://api.freekassa.ru/v1/";

/// ウォレットAPIのデフォルトURL（単一エンドポイント）
pub const DEFAULT_WALLET_URL: &str = "https://fkwallet.com/api_v1.php";

/// リクエストタイムアウトのデフォルト（秒）
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Get an environment variable with fallback to a deprecated name
///
/// If the new variable name is set, returns its value.
/// If only the old (deprecated) variable name is set, returns its value
/// and logs a deprecation warning.
///
/// # Example
/// ```
/// use freekassa::config::get_env_with_fallback;
///
/// let dir = get_env_with_fallback("FREEKASSA_DATA_DIR", "FK_DATA_DIR");
/// ```
pub fn get_env_with_fallback(new_name: &str, old_name: &str) -> Option<String> {
    if let Ok(val) = std::env::var(new_name) {
        return Some(val);
    }
    if let Ok(val) = std::env::var(old_name) {
        tracing::warn!(
            "Environment variable '{}' is deprecated, use '{}' instead",
            old_name,
            new_name
        );
        return Some(val);
    }
    None
}

/// Get an environment variable with fallback, parsing to a specific type
///
/// Returns `default` if neither variable is set or parsing fails.
pub fn get_env_with_fallback_parse<T: std::str::FromStr>(
    new_name: &str,
    old_name: &str,
    default: T,
) -> T {
    get_env_with_fallback(new_name, old_name)
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

/// Get a required environment variable (with fallback)
///
/// Returns a configuration error naming the preferred variable when neither is set.
pub fn require_env_with_fallback(new_name: &str, old_name: &str) -> FkResult<String> {
    get_env_with_fallback(new_name, old_name)
        .filter(|value| !value.is_empty())
        .ok_or_else(|| {
            CommonError::Config(format!("Environment variable '{}' is not set", new_name)).into()
        })
}

/// クライアント設定
///
/// 3種類の秘密値を保持する:
/// - `first_secret`: 決済フォーム署名用
/// - `second_secret`: 通知スクリプト署名検証用
/// - `api_key`: ゲートウェイAPIリクエスト署名用
///
/// `Debug`出力では秘密値を伏せる。
#[derive(Clone)]
pub struct ClientConfig {
    /// マーチャントID（ゲートウェイでは`shopId`として送信）
    pub merchant_id: i64,
    /// 決済フォーム用シークレット
    pub first_secret: String,
    /// 通知検証用シークレット
    pub second_secret: String,
    /// ゲートウェイAPIキー
    pub api_key: String,
    /// ウォレットID
    pub wallet_id: String,
    /// ウォレットAPIキー
    pub wallet_api_key: String,
    /// ゲートウェイAPIのベースURL
    pub gateway_base_url: String,
    /// ウォレットAPIのURL
    pub wallet_url: String,
    /// 監査ストアを置くディレクトリ
    pub data_dir: PathBuf,
    /// 1リクエストあたりのタイムアウト
    pub request_timeout: Duration,
}

impl ClientConfig {
    /// 明示的な認証情報から設定を作成（URL等はデフォルト値）
    pub fn new(
        merchant_id: i64,
        first_secret: impl Into<String>,
        second_secret: impl Into<String>,
        api_key: impl Into<String>,
        wallet_id: impl Into<String>,
        wallet_api_key: impl Into<String>,
    ) -> Self {
        Self {
            merchant_id,
            first_secret: first_secret.into(),
            second_secret: second_secret.into(),
            api_key: api_key.into(),
            wallet_id: wallet_id.into(),
            wallet_api_key: wallet_api_key.into(),
            gateway_base_url: DEFAULT_GATEWAY_BASE_URL.to_string(),
            wallet_url: DEFAULT_WALLET_URL.to_string(),
            data_dir: PathBuf::from("."),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
        }
    }

    /// Load configuration from environment variables.
    ///
    /// Required: `FREEKASSA_MERCHANT_ID`, `FREEKASSA_FIRST_SECRET`,
    /// `FREEKASSA_SECOND_SECRET`, `FREEKASSA_API_KEY`, `FREEKASSA_WALLET_ID`,
    /// `FREEKASSA_WALLET_API_KEY`. Each also accepts a deprecated `FK_*` name.
    pub fn from_env() -> FkResult<Self> {
        let merchant_id_raw =
            require_env_with_fallback("FREEKASSA_MERCHANT_ID", "FK_MERCHANT_ID")?;
        let merchant_id = merchant_id_raw.trim().parse::<i64>().map_err(|e| {
            CommonError::Config(format!(
                "FREEKASSA_MERCHANT_ID must be an integer, got '{}': {}",
                merchant_id_raw, e
            ))
        })?;

        let mut config = Self::new(
            merchant_id,
            require_env_with_fallback("FREEKASSA_FIRST_SECRET", "FK_FIRST_SECRET")?,
            require_env_with_fallback("FREEKASSA_SECOND_SECRET", "FK_SECOND_SECRET")?,
            require_env_with_fallback("FREEKASSA_API_KEY", "FK_API_KEY")?,
            require_env_with_fallback("FREEKASSA_WALLET_ID", "FK_WALLET_ID")?,
            require_env_with_fallback("FREEKASSA_WALLET_API_KEY", "FK_WALLET_API_KEY")?,
        );

        if let Some(url) = get_env_with_fallback("FREEKASSA_API_URL", "FK_API_URL") {
            config.gateway_base_url = url;
        }
        if let Some(url) = get_env_with_fallback("FREEKASSA_WALLET_URL", "FK_WALLET_URL") {
            config.wallet_url = url;
        }
        if let Some(dir) = get_env_with_fallback("FREEKASSA_DATA_DIR", "FK_DATA_DIR") {
            config.data_dir = PathBuf::from(dir);
        }
        let timeout_secs = get_env_with_fallback_parse(
            "FREEKASSA_TIMEOUT_SECS",
            "FK_TIMEOUT_SECS",
            DEFAULT_REQUEST_TIMEOUT_SECS,
        );
        config.request_timeout = Duration::from_secs(timeout_secs);

        Ok(config)
    }

    /// ゲートウェイのベースURLを上書き
    pub fn with_gateway_base_url(mut self, url: impl Into<String>) -> Self {
        self.gateway_base_url = url.into();
        self
    }

    /// ウォレットのURLを上書き
    pub fn with_wallet_url(mut self, url: impl Into<String>) -> Self {
        self.wallet_url = url.into();
        self
    }

    /// 監査ストアのディレクトリを上書き
    pub fn with_data_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.data_dir = dir.as_ref().to_path_buf();
        self
    }

    /// リクエストタイムアウトを上書き
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// マーチャント単位の監査ストアのパス（`<data_dir>/shop<merchant_id>.db`）
    pub fn store_path(&self) -> PathBuf {
        self.data_dir.join(format!("shop{}.db", self.merchant_id))
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const REDACTED: &str = "***";
        f.debug_struct("ClientConfig")
            .field("merchant_id", &self.merchant_id)
            .field("first_secret", &REDACTED)
            .field("second_secret", &REDACTED)
            .field("api_key", &REDACTED)
            .field("wallet_id", &self.wallet_id)
            .field("wallet_api_key", &REDACTED)
            .field("gateway_base_url", &self.gateway_base_url)
            .field("wallet_url", &self.wallet_url)
            .field("data_dir", &self.data_dir)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}
