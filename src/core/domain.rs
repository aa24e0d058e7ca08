//! Domain types passed between callers, providers and the transaction flows.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::core::errors::WalletError;

/// Identifies a wallet provider adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    Bitgo,
    Coinbase,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::Bitgo => "bitgo",
            ProviderKind::Coinbase => "coinbase",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = WalletError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "bitgo" => Ok(ProviderKind::Bitgo),
            "coinbase" => Ok(ProviderKind::Coinbase),
            other => Err(WalletError::Configuration(format!("unknown provider: {}", other))),
        }
    }
}

/// Opaque handle for a provisioned wallet.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WalletDescriptor {
    pub provider: ProviderKind,
    /// Provider-side wallet id (for BitGo, the wallet's base address).
    pub address: String,
}

impl WalletDescriptor {
    pub fn new(provider: ProviderKind, address: impl Into<String>) -> Self {
        Self { provider, address: address.into() }
    }
}

/// Wallet balances in satoshis.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Balances {
    pub balance: u64,
    pub spendable: u64,
    pub confirmed: u64,
    pub unconfirmed: u64,
}

/// Fee rate reported by the provider's fee oracle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeEstimate {
    #[serde(rename = "feePerKb")]
    pub fee_per_kb: u64,
}

/// Reference to an output spent by an unsigned transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Unspent {
    pub tx_hash: String,
    pub tx_output_n: u32,
    pub value: u64,
    #[serde(rename = "chainPath", default, skip_serializing_if = "Option::is_none")]
    pub chain_path: Option<String>,
    #[serde(rename = "redeemScript", default, skip_serializing_if = "Option::is_none")]
    pub redeem_script: Option<String>,
}

/// A provider-built candidate transaction, before the builder accepts it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateTransaction {
    pub transaction_hex: String,
    pub unspents: Vec<Unspent>,
    /// Fee the provider actually computed for this candidate.
    pub fee: u64,
    /// Public key material of the wallet keychains, user key first.
    pub keychain_xpubs: Vec<String>,
}

/// Unsigned transaction handed to an external signer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnsignedTransaction {
    pub transaction_hex: String,
    pub unspents: Vec<Unspent>,
    pub fee: u64,
    pub xpub: String,
}

/// Immediate answer to a broadcast.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BroadcastReceipt {
    pub hash: String,
}

/// One output of a transaction as seen by the provider's chain index.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DetailOutput {
    pub account: String,
    pub value: u64,
}

/// Settlement detail for a broadcast transaction.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TransactionDetail {
    pub fee: u64,
    #[serde(default)]
    pub outputs: Vec<DetailOutput>,
}

/// Payment to the settlement address found in a transaction's outputs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settlement {
    pub address: String,
    pub satoshis: u64,
}

/// Result of a successful broadcast, reconciled against the chain index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionResult {
    pub hash: String,
    pub fee: u64,
    #[serde(flatten)]
    pub settlement: Option<Settlement>,
}

/// Fiat-entry link produced by a payment-link provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentLink {
    #[serde(rename = "buyURL")]
    Purchase(String),
    #[serde(rename = "recurringURL")]
    Recurring(String),
}

impl PaymentLink {
    pub fn url(&self) -> &str {
        match self {
            PaymentLink::Purchase(url) | PaymentLink::Recurring(url) => url,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_kind_parse() {
        assert_eq!("BitGo".parse::<ProviderKind>().unwrap(), ProviderKind::Bitgo);
        assert_eq!("coinbase".parse::<ProviderKind>().unwrap(), ProviderKind::Coinbase);
        assert!("kraken".parse::<ProviderKind>().is_err());
    }

    #[test]
    fn test_submission_result_flattens_settlement() {
        let result = SubmissionResult {
            hash: "ab".to_string(),
            fee: 10,
            settlement: Some(Settlement { address: "2N".to_string(), satoshis: 99 }),
        };
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["address"], "2N");
        assert_eq!(json["satoshis"], 99);

        let bare = SubmissionResult { settlement: None, ..result };
        let json = serde_json::to_value(&bare).unwrap();
        assert!(json.get("address").is_none());
    }

    #[test]
    fn test_payment_link_serialization() {
        let link = PaymentLink::Purchase("https://example".to_string());
        assert_eq!(serde_json::to_value(&link).unwrap(), serde_json::json!({"buyURL": "https://example"}));
    }
}
