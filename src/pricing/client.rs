//! Signed client for the BitcoinAverage-style pricing index.

use async_trait::async_trait;
use hmac::{Hmac, Mac};
use regex::Regex;
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;
use std::sync::OnceLock;
use tracing::warn;

use super::rates::RateTable;
use crate::core::config::PricingConfig;
use crate::core::errors::RateRefreshError;

type HmacSha256 = Hmac<Sha256>;

/// Anything that can produce a fresh, validated rate table.
#[async_trait]
pub trait RateSource: Send + Sync {
    async fn fetch(&self) -> Result<RateTable, RateRefreshError>;
}

pub struct PricingClient {
    url: String,
    public_key: String,
    secret_key: SecretString,
    http_client: reqwest::Client,
}

impl PricingClient {
    pub fn new(config: &PricingConfig) -> Self {
        Self {
            url: config.url.clone(),
            public_key: config.public_key.clone(),
            secret_key: config.secret_key.clone(),
            http_client: reqwest::Client::new(),
        }
    }

    /// `X-Signature` value: `<ts>.<public key>.<hex hmac-sha256(secret, "<ts>.<public key>")>`.
    pub fn signature(&self, timestamp: i64) -> Result<String, RateRefreshError> {
        let prefix = format!("{}.{}", timestamp, self.public_key);
        let mut mac = HmacSha256::new_from_slice(self.secret_key.expose_secret().as_bytes())
            .map_err(|e| RateRefreshError::Signature(e.to_string()))?;
        mac.update(prefix.as_bytes());
        Ok(format!("{}.{}", prefix, hex::encode(mac.finalize().into_bytes())))
    }

    /// Shell command that replays a signed request, for failure reports.
    pub fn diagnostic(&self, signature: &str) -> String {
        format!("curl -X GET --header \"X-Signature: {}\" {}", signature, self.url)
    }

    pub async fn fetch_signed(&self, signature: &str) -> Result<RateTable, RateRefreshError> {
        let body = self
            .http_client
            .get(&self.url)
            .header("X-Signature", signature)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        parse_body(&body)
    }
}

#[async_trait]
impl RateSource for PricingClient {
    async fn fetch(&self) -> Result<RateTable, RateRefreshError> {
        let signature = self.signature(chrono::Utc::now().timestamp())?;
        let result = self.fetch_signed(&signature).await;
        if result.is_err() {
            warn!(details = %self.diagnostic(&signature), "maintenance details");
        }
        result
    }
}

fn tag_pattern() -> Result<&'static Regex, RateRefreshError> {
    static PATTERN: OnceLock<Result<Regex, regex::Error>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"(?s)<.*?>"))
        .as_ref()
        .map_err(|e| RateRefreshError::Pattern(e.clone()))
}

/// Parses a pricing response body; HTML error pages are reported with their
/// markup stripped.
pub fn parse_body(body: &str) -> Result<RateTable, RateRefreshError> {
    if body.contains("<html>") {
        let text = tag_pattern()?.replace_all(body, "").trim().to_string();
        return Err(RateRefreshError::Html(text));
    }
    let value: serde_json::Value = serde_json::from_str(body)?;
    RateTable::from_ticker(&value)
}
