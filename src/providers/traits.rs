use async_trait::async_trait;
use secrecy::SecretString;
use std::collections::BTreeMap;

use crate::core::domain::{
    Balances, BroadcastReceipt, CandidateTransaction, FeeEstimate, PaymentLink, ProviderKind,
    TransactionDetail, WalletDescriptor,
};
use crate::core::errors::{ProviderError, WalletError};

/// Custody operations a provider can expose through the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Balances,
    Recover,
    SubmitTx,
    UnsignedTx,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Balances => "balances",
            Operation::Recover => "recover",
            Operation::SubmitTx => "submitTx",
            Operation::UnsignedTx => "unsignedTx",
        }
    }
}

/// The set of custody operations a provider implements, fixed at registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    pub balances: bool,
    pub recover: bool,
    pub submit_tx: bool,
    pub unsigned_tx: bool,
}

impl Capabilities {
    pub const ALL: Capabilities =
        Capabilities { balances: true, recover: true, submit_tx: true, unsigned_tx: true };

    pub const NONE: Capabilities =
        Capabilities { balances: false, recover: false, submit_tx: false, unsigned_tx: false };

    pub fn supports(&self, operation: Operation) -> bool {
        match operation {
            Operation::Balances => self.balances,
            Operation::Recover => self.recover,
            Operation::SubmitTx => self.submit_tx,
            Operation::UnsignedTx => self.unsigned_tx,
        }
    }
}

/// A full-amount send request.
#[derive(Debug, Clone)]
pub struct SendRequest {
    pub address: String,
    pub amount: u64,
    pub passphrase: SecretString,
    /// Explicit fee in satoshis; `None` lets the provider decide.
    pub fee: Option<u64>,
}

/// Outcome of a send attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendOutcome {
    Accepted(BroadcastReceipt),
    /// The provider refused the send and named the fee it requires.
    RejectedWithFee { fee: u64, error: ProviderError },
    Failed(ProviderError),
}

impl SendOutcome {
    /// Classifies a provider error: a rejection that names a fee is the
    /// expected answer to a fee-less full-balance send.
    pub fn from_error(error: ProviderError) -> Self {
        let fee = match &error {
            ProviderError::Rejected { fee: Some(fee), .. } if *fee > 0 => Some(*fee),
            _ => None,
        };
        match fee {
            Some(fee) => SendOutcome::RejectedWithFee { fee, error },
            None => SendOutcome::Failed(error),
        }
    }
}

/// Custodial wallet provider API.
#[async_trait]
pub trait CustodyProvider: Send + Sync {
    fn kind(&self) -> ProviderKind;

    /// Operations this adapter implements; the rest are reported as unsupported.
    fn capabilities(&self) -> Capabilities {
        Capabilities::ALL
    }

    /// Address that receives payouts built by `unsigned_tx`.
    fn settlement_address(&self) -> &str;

    async fn balances(&self, wallet: &WalletDescriptor) -> Result<Balances, ProviderError>;

    async fn estimate_fee(&self, num_blocks: u32) -> Result<FeeEstimate, ProviderError>;

    /// Builds an unsigned candidate paying `recipients` at `fee_per_kb`.
    async fn create_transaction(
        &self,
        wallet: &WalletDescriptor,
        recipients: &BTreeMap<String, u64>,
        fee_per_kb: u64,
    ) -> Result<CandidateTransaction, ProviderError>;

    async fn send_transaction(
        &self,
        wallet: &WalletDescriptor,
        signed_hex: &str,
    ) -> Result<BroadcastReceipt, ProviderError>;

    async fn transaction_detail(&self, hash: &str) -> Result<TransactionDetail, ProviderError>;

    async fn send_coins(&self, wallet: &WalletDescriptor, request: &SendRequest) -> SendOutcome;
}

/// Generic fiat-entry links.
pub trait PaymentLinkProvider: Send + Sync {
    fn kind(&self) -> ProviderKind;

    fn purchase_btc(
        &self,
        wallet: &WalletDescriptor,
        amount: f64,
        currency: &str,
    ) -> Result<PaymentLink, WalletError>;

    fn recurring_btc(
        &self,
        wallet: &WalletDescriptor,
        amount: f64,
        currency: &str,
    ) -> Result<PaymentLink, WalletError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_error_with_fee_is_expected_rejection() {
        let error = ProviderError::Rejected { message: "fee required".into(), fee: Some(5000) };
        assert_eq!(
            SendOutcome::from_error(error.clone()),
            SendOutcome::RejectedWithFee { fee: 5000, error }
        );
    }

    #[test]
    fn test_from_error_without_fee_is_failure() {
        let error = ProviderError::Rejected { message: "wallet locked".into(), fee: None };
        assert_eq!(SendOutcome::from_error(error.clone()), SendOutcome::Failed(error));

        let error = ProviderError::Http("timeout".into());
        assert_eq!(SendOutcome::from_error(error.clone()), SendOutcome::Failed(error));
    }

    #[test]
    fn test_capabilities_supports() {
        let caps = Capabilities { recover: false, ..Capabilities::ALL };
        assert!(caps.supports(Operation::UnsignedTx));
        assert!(!caps.supports(Operation::Recover));
        assert!(!Capabilities::NONE.supports(Operation::Balances));
    }
}
