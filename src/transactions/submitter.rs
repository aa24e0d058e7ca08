//! Broadcast of signed transactions and settlement reconciliation.

use tracing::{debug, error, info, warn};

use crate::audit::{Alert, Notifier};
use crate::core::constants::{CONFIRMATION_POLL_ATTEMPTS, CONFIRMATION_POLL_INTERVAL};
use crate::core::domain::{Settlement, SubmissionResult, TransactionDetail, WalletDescriptor};
use crate::core::errors::{ProviderError, WalletError};
use crate::monitoring::WalletMetrics;
use crate::providers::CustodyProvider;

pub struct TransactionSubmitter<'a> {
    provider: &'a dyn CustodyProvider,
    notifier: &'a dyn Notifier,
    metrics: &'a WalletMetrics,
}

impl<'a> TransactionSubmitter<'a> {
    pub fn new(
        provider: &'a dyn CustodyProvider,
        notifier: &'a dyn Notifier,
        metrics: &'a WalletMetrics,
    ) -> Self {
        Self { provider, notifier, metrics }
    }

    /// Broadcasts `signed_hex` and waits (up to five lookups, one second apart)
    /// for the provider to report its fee and outputs.
    ///
    /// A failed broadcast yields `Ok(None)`. Once broadcast, the transaction
    /// cannot be withdrawn, so missing details are a hard
    /// `ConfirmationTimeout`.
    pub async fn submit(
        &self,
        wallet: &WalletDescriptor,
        signed_hex: &str,
    ) -> Result<Option<SubmissionResult>, WalletError> {
        let receipt = match self.provider.send_transaction(wallet, signed_hex).await {
            Ok(receipt) => receipt,
            Err(e) => {
                error!(error = %e, wallet = %wallet.address, "sendTransaction failed");
                self.notifier
                    .notify(Alert::error("submitTx", format!("sendTransaction error: {}", e)))
                    .await;
                return Ok(None);
            }
        };
        info!(hash = %receipt.hash, "transaction broadcast");
        self.metrics.record_submission();

        let detail = match self.await_detail(&receipt.hash).await {
            Ok(detail) => detail,
            Err(source) => {
                self.metrics.record_confirmation_timeout();
                return Err(WalletError::ConfirmationTimeout {
                    hash: receipt.hash,
                    attempts: CONFIRMATION_POLL_ATTEMPTS,
                    source,
                });
            }
        };

        let settlement = find_settlement(&detail, self.provider.settlement_address());
        if settlement.is_none() {
            debug!(hash = %receipt.hash, "no output pays the settlement address");
        }
        Ok(Some(SubmissionResult { hash: receipt.hash, fee: detail.fee, settlement }))
    }

    async fn await_detail(&self, hash: &str) -> Result<TransactionDetail, ProviderError> {
        let mut attempt = 1;
        loop {
            match self.provider.transaction_detail(hash).await {
                Ok(detail) => return Ok(detail),
                Err(e) if attempt >= CONFIRMATION_POLL_ATTEMPTS => {
                    error!(hash, error = %e, attempts = attempt, "getTransaction gave up");
                    return Err(e);
                }
                Err(e) => {
                    warn!(hash, error = %e, retry = attempt, max = CONFIRMATION_POLL_ATTEMPTS, "getTransaction");
                    tokio::time::sleep(CONFIRMATION_POLL_INTERVAL).await;
                    attempt += 1;
                }
            }
        }
    }
}

/// Last output paying `settlement_address`, if any.
pub fn find_settlement(detail: &TransactionDetail, settlement_address: &str) -> Option<Settlement> {
    detail
        .outputs
        .iter()
        .rev()
        .find(|output| output.account == settlement_address)
        .map(|output| Settlement { address: output.account.clone(), satoshis: output.value })
}
