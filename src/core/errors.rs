//! Error types for custodial wallet operations.
//!
//! An operation that returns `Ok(None)` means "retry later"; an `Err` means the
//! request is invalid (or already irreversible) and must not be retried unchanged.

use thiserror::Error;

/// Errors reported by a custodial provider adapter.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProviderError {
    /// Transport-level failure talking to the provider.
    #[error("HTTP error: {0}")]
    Http(String),

    /// The provider answered with a non-success status.
    #[error("provider returned {status}: {message}")]
    Status { status: u16, message: String },

    /// The provider response could not be decoded.
    #[error("Decode error: {0}")]
    Decode(String),

    /// The provider refused the request. `fee` is set when the refusal names
    /// the fee the provider requires.
    #[error("provider rejected request: {message}")]
    Rejected { message: String, fee: Option<u64> },
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ProviderError::Decode(err.to_string())
        } else {
            ProviderError::Http(err.to_string())
        }
    }
}

/// Failures of a single exchange-rate refresh.
#[derive(Debug, Error)]
pub enum RateRefreshError {
    #[error("pricing request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The pricing index answered with an HTML page instead of JSON.
    #[error("pricing index returned HTML: {0}")]
    Html(String),

    #[error("pricing response is not JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("pricing response failed validation: {0}")]
    Schema(String),

    /// The request signature could not be computed.
    #[error("cannot sign pricing request: {0}")]
    Signature(String),

    #[error("invalid pattern: {0}")]
    Pattern(regex::Error),
}

/// Custom error type for wallet operations.
#[derive(Debug, Error)]
pub enum WalletError {
    /// Missing or invalid setup detected at construction.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The wallet's provider does not implement the requested operation.
    #[error("provider {provider} {operation} not supported")]
    UnsupportedOperation { provider: String, operation: String },

    /// No cached exchange rate exists for the currency.
    #[error("no such currency: {0}")]
    UnknownCurrency(String),

    /// A payment-link provider does not accept the currency.
    #[error("currency {0} payment not supported")]
    UnsupportedCurrency(String),

    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// A broadcast succeeded but its details never became available.
    #[error("transaction {hash} not confirmed after {attempts} attempts: {source}")]
    ConfirmationTimeout {
        hash: String,
        attempts: u32,
        #[source]
        source: ProviderError,
    },

    /// A transaction hex could not be decoded.
    #[error("Invalid transaction: {0}")]
    InvalidTransaction(String),

    #[error("Network error: {0}")]
    Network(String),
}

impl WalletError {
    pub fn unsupported(provider: impl Into<String>, operation: impl Into<String>) -> Self {
        Self::UnsupportedOperation { provider: provider.into(), operation: operation.into() }
    }

    /// 判断是否为可重试error
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            WalletError::Network(_)
                | WalletError::Provider(ProviderError::Http(_))
                | WalletError::Provider(ProviderError::Status { status: 500..=599, .. })
        )
    }
}

impl From<toml::de::Error> for WalletError {
    fn from(err: toml::de::Error) -> Self {
        WalletError::Configuration(err.to_string())
    }
}

impl From<std::io::Error> for WalletError {
    fn from(err: std::io::Error) -> Self {
        WalletError::Configuration(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_unsupported_operation() {
        let err = WalletError::unsupported("coinbase", "recover");
        assert_eq!(err.to_string(), "provider coinbase recover not supported");
    }

    #[test]
    fn test_display_unknown_currency() {
        let err = WalletError::UnknownCurrency("XYZ".to_string());
        assert_eq!(format!("{}", err), "no such currency: XYZ");
    }

    #[test]
    fn test_confirmation_timeout_keeps_source() {
        use std::error::Error as _;

        let err = WalletError::ConfirmationTimeout {
            hash: "abc".to_string(),
            attempts: 5,
            source: ProviderError::Http("connection reset".to_string()),
        };
        assert!(err.to_string().contains("after 5 attempts"));
        assert_eq!(err.source().map(|s| s.to_string()), Some("HTTP error: connection reset".to_string()));
    }

    #[test]
    fn test_is_retryable() {
        assert!(WalletError::Network("down".into()).is_retryable());
        assert!(WalletError::Provider(ProviderError::Status { status: 503, message: String::new() })
            .is_retryable());
        assert!(!WalletError::Provider(ProviderError::Status { status: 400, message: String::new() })
            .is_retryable());
        assert!(!WalletError::UnknownCurrency("XYZ".into()).is_retryable());
    }
}
