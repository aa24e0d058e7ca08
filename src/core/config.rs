use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::path::Path;

use crate::core::errors::WalletError;

/// Pricing index configuration
#[derive(Debug, Clone, Deserialize)]
pub struct PricingConfig {
    #[serde(default = "PricingConfig::default_url")]
    pub url: String,

    pub public_key: String,

    pub secret_key: SecretString,

    /// Refresh period (seconds)
    #[serde(default = "PricingConfig::default_refresh_interval_secs")]
    pub refresh_interval_secs: u64,
}

impl PricingConfig {
    fn default_url() -> String {
        "https://apiv2.bitcoinaverage.com/indices/global/ticker/all?crypto=BTC".to_string()
    }
    fn default_refresh_interval_secs() -> u64 { 15 * 60 }

    pub fn refresh_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.refresh_interval_secs)
    }
}

/// BitGo custody configuration
#[derive(Debug, Clone, Deserialize)]
pub struct BitGoConfig {
    pub access_token: SecretString,

    /// "prod" or "test"
    #[serde(default = "BitGoConfig::default_environment")]
    pub environment: String,

    /// Overrides the environment's API root (e.g. a BitGo Express instance).
    #[serde(default)]
    pub base_url: Option<String>,

    /// Address that receives payouts.
    pub settlement_address: String,
}

impl BitGoConfig {
    fn default_environment() -> String { "prod".to_string() }

    pub fn api_root(&self) -> String {
        match &self.base_url {
            Some(url) => url.trim_end_matches('/').to_string(),
            None if self.environment == "prod" => "https://www.bitgo.com".to_string(),
            None => "https://test.bitgo.com".to_string(),
        }
    }
}

/// Coinbase payment-link configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CoinbaseConfig {
    pub widget_code: String,
}

/// Operator notification configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NotifyConfig {
    /// Incoming-webhook URL; alerts only go to the log when unset.
    #[serde(default)]
    pub webhook_url: Option<String>,
}

/// wallet配置
#[derive(Debug, Clone, Deserialize)]
pub struct WalletConfig {
    pub pricing: PricingConfig,

    #[serde(default)]
    pub bitgo: Option<BitGoConfig>,

    #[serde(default)]
    pub coinbase: Option<CoinbaseConfig>,

    #[serde(default)]
    pub notify: NotifyConfig,
}

impl WalletConfig {
    /// Loads and validates a TOML configuration file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, WalletError> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        let config: WalletConfig = toml::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Builds the configuration from `WALLET_*` environment variables.
    pub fn from_env() -> Result<Self, WalletError> {
        let required = |name: &str| {
            std::env::var(name)
                .map_err(|_| WalletError::Configuration(format!("{} undefined", name)))
        };

        let pricing = PricingConfig {
            url: std::env::var("WALLET_PRICING_URL").unwrap_or_else(|_| PricingConfig::default_url()),
            public_key: required("WALLET_PRICING_PUBLIC_KEY")?,
            secret_key: SecretString::new(required("WALLET_PRICING_SECRET_KEY")?),
            refresh_interval_secs: match std::env::var("WALLET_PRICING_REFRESH_SECS") {
                Ok(v) => v.parse().map_err(|_| {
                    WalletError::Configuration(format!("invalid WALLET_PRICING_REFRESH_SECS: {}", v))
                })?,
                Err(_) => PricingConfig::default_refresh_interval_secs(),
            },
        };

        let bitgo = match std::env::var("WALLET_BITGO_ACCESS_TOKEN") {
            Ok(token) => Some(BitGoConfig {
                access_token: SecretString::new(token),
                environment: std::env::var("WALLET_BITGO_ENVIRONMENT")
                    .unwrap_or_else(|_| BitGoConfig::default_environment()),
                base_url: std::env::var("WALLET_BITGO_BASE_URL").ok(),
                settlement_address: required("WALLET_BITGO_SETTLEMENT_ADDRESS")?,
            }),
            Err(_) => None,
        };

        let coinbase = std::env::var("WALLET_COINBASE_WIDGET_CODE")
            .ok()
            .map(|widget_code| CoinbaseConfig { widget_code });

        let notify = NotifyConfig { webhook_url: std::env::var("WALLET_NOTIFY_WEBHOOK_URL").ok() };

        let config = WalletConfig { pricing, bitgo, coinbase, notify };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), WalletError> {
        if self.pricing.public_key.trim().is_empty() {
            return Err(WalletError::Configuration("pricing.public_key undefined".to_string()));
        }
        if self.pricing.secret_key.expose_secret().is_empty() {
            return Err(WalletError::Configuration("pricing.secret_key undefined".to_string()));
        }
        if self.pricing.refresh_interval_secs == 0 {
            return Err(WalletError::Configuration(
                "pricing.refresh_interval_secs must be positive".to_string(),
            ));
        }
        if let Some(bitgo) = &self.bitgo {
            if bitgo.settlement_address.trim().is_empty() {
                return Err(WalletError::Configuration(
                    "bitgo.settlement_address undefined".to_string(),
                ));
            }
        }
        Ok(())
    }
}
