//! Unsigned transaction construction with bounded fee convergence.

use std::collections::BTreeMap;
use tracing::{debug, error, info, warn};

use crate::audit::{Alert, Notifier};
use crate::core::constants::{
    FEE_TARGET_BLOCKS, MAX_FEE_PASSES, MINIMUM_SPEND_RATIO, SATOSHIS_PER_BTC,
};
use crate::core::domain::{CandidateTransaction, UnsignedTransaction, WalletDescriptor};
use crate::core::errors::{ProviderError, WalletError};
use crate::monitoring::WalletMetrics;
use crate::pricing::RateCache;
use crate::providers::CustodyProvider;

/// Satoshi amounts derived from a fiat amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpendTarget {
    /// Amount the caller asked for, rounded to the nearest satoshi.
    pub desired: u64,
    /// Smallest amount worth sending (90% of desired, rounded down).
    pub minimum: u64,
}

impl SpendTarget {
    pub fn from_fiat(amount: f64, rate: f64) -> Self {
        let desired = amount / rate * SATOSHIS_PER_BTC;
        Self {
            desired: desired.round() as u64,
            minimum: (desired * MINIMUM_SPEND_RATIO).floor() as u64,
        }
    }
}

pub struct TransactionBuilder<'a> {
    provider: &'a dyn CustodyProvider,
    rates: &'a RateCache,
    notifier: &'a dyn Notifier,
    metrics: &'a WalletMetrics,
}

impl<'a> TransactionBuilder<'a> {
    pub fn new(
        provider: &'a dyn CustodyProvider,
        rates: &'a RateCache,
        notifier: &'a dyn Notifier,
        metrics: &'a WalletMetrics,
    ) -> Self {
        Self { provider, rates, notifier, metrics }
    }

    /// Builds an unsigned transaction paying `amount` of `currency` (converted
    /// at the cached rate) to the provider's settlement address.
    ///
    /// Returns `Ok(None)` when the balance cannot cover the minimum spend or
    /// when the provider fails; both are "retry later" outcomes.
    pub async fn build(
        &self,
        wallet: &WalletDescriptor,
        amount: f64,
        currency: &str,
        balance: u64,
    ) -> Result<Option<UnsignedTransaction>, WalletError> {
        let currency = currency.to_uppercase();
        let rate = self
            .rates
            .lookup(&currency)
            .ok_or_else(|| WalletError::UnknownCurrency(currency.clone()))?;

        let target = SpendTarget::from_fiat(amount, rate);
        debug!(balance, desired = target.desired, minimum = target.minimum, "unsignedTx");
        if target.minimum > balance {
            info!(balance, minimum = target.minimum, wallet = %wallet.address, "insufficient funds");
            return Ok(None);
        }
        let desired = target.desired.min(balance);

        let fee_rate = match self.provider.estimate_fee(FEE_TARGET_BLOCKS).await {
            Ok(estimate) => estimate.fee_per_kb,
            Err(e) => {
                self.soft_failure("estimateFee", &e, format!("numBlocks={}", FEE_TARGET_BLOCKS))
                    .await;
                return Ok(None);
            }
        };

        // The reserved fee starts at the oracle's fee-per-kb and then follows
        // the provider's actual fee. A candidate is kept once its actual fee
        // covers the reserve it was built with.
        let mut fee = fee_rate;
        let mut accepted: Option<CandidateTransaction> = None;
        for pass in 0..MAX_FEE_PASSES {
            let satoshis = match desired.checked_sub(fee) {
                Some(s) if s > 0 => s,
                _ => {
                    warn!(desired, fee, "fee consumes the whole amount");
                    return Ok(None);
                }
            };
            let mut recipients = BTreeMap::new();
            recipients.insert(self.provider.settlement_address().to_string(), satoshis);

            let candidate =
                match self.provider.create_transaction(wallet, &recipients, fee_rate).await {
                    Ok(candidate) => candidate,
                    Err(e) => {
                        self.soft_failure(
                            "createTransaction",
                            &e,
                            format!("recipients={:?} feeRate={}", recipients, fee_rate),
                        )
                        .await;
                        return Ok(None);
                    }
                };
            debug!(pass, satoshis, estimate = fee, actual = candidate.fee, "unsignedTx");

            let converged = fee <= candidate.fee;
            fee = candidate.fee;
            accepted = Some(candidate);
            if converged {
                break;
            }
        }

        let Some(candidate) = accepted else {
            return Ok(None);
        };
        let Some(xpub) = candidate.keychain_xpubs.first().cloned() else {
            let e = ProviderError::Decode("candidate carries no wallet keychains".to_string());
            self.soft_failure("createTransaction", &e, String::new()).await;
            return Ok(None);
        };

        self.metrics.record_transaction_built(candidate.fee);
        Ok(Some(UnsignedTransaction {
            transaction_hex: candidate.transaction_hex,
            unspents: candidate.unspents,
            fee: candidate.fee,
            xpub,
        }))
    }

    async fn soft_failure(&self, step: &str, e: &ProviderError, context: String) {
        error!(step, error = %e, %context, "unsignedTx failed");
        self.metrics.record_build_failure();
        self.notifier
            .notify(Alert::error("unsignedTx", format!("{} error: {} ({})", step, e, context)))
            .await;
    }
}
