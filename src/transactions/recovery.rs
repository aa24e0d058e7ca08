//! Recovery sweep of a (possibly compromised) wallet.
//!
//! A full-balance send without a fee is always refused by the provider; the
//! refusal names the fee it requires. The sweep then retries once, explicitly
//! paying that fee. The two sends are strictly sequential.

use secrecy::SecretString;
use tracing::{info, warn};

use crate::core::constants::DUST_THRESHOLD_SAT;
use crate::core::domain::WalletDescriptor;
use crate::core::errors::WalletError;
use crate::monitoring::WalletMetrics;
use crate::providers::{CustodyProvider, SendOutcome, SendRequest};

pub struct RecoverySweeper<'a> {
    provider: &'a dyn CustodyProvider,
    metrics: &'a WalletMetrics,
}

impl<'a> RecoverySweeper<'a> {
    pub fn new(provider: &'a dyn CustodyProvider, metrics: &'a WalletMetrics) -> Self {
        Self { provider, metrics }
    }

    /// Sweeps the whole balance of `source` to `destination`.
    ///
    /// Returns the number of satoshis sent, or 0 when the balance left after
    /// the fee is dust.
    pub async fn sweep(
        &self,
        source: &WalletDescriptor,
        destination: &str,
        passphrase: &SecretString,
    ) -> Result<u64, WalletError> {
        let balance = self.provider.balances(source).await?.balance;
        info!(wallet = %source.address, balance, "recovery sweep");

        let full_balance = SendRequest {
            address: destination.to_string(),
            amount: balance,
            passphrase: passphrase.clone(),
            fee: None,
        };
        let fee = match self.provider.send_coins(source, &full_balance).await {
            // Not expected, but the funds have moved.
            SendOutcome::Accepted(receipt) => {
                warn!(hash = %receipt.hash, "fee-less full-balance send was accepted");
                self.metrics.record_sweep(balance);
                return Ok(balance);
            }
            SendOutcome::RejectedWithFee { fee, .. } => fee,
            SendOutcome::Failed(e) => return Err(e.into()),
        };

        let remainder = balance.saturating_sub(fee);
        if remainder <= DUST_THRESHOLD_SAT {
            info!(balance, fee, remainder, "remainder is dust, nothing swept");
            self.metrics.record_sweep(0);
            return Ok(0);
        }

        let sweep = SendRequest { amount: remainder, fee: Some(fee), ..full_balance };
        match self.provider.send_coins(source, &sweep).await {
            SendOutcome::Accepted(receipt) => {
                info!(hash = %receipt.hash, swept = remainder, fee, "recovery sweep sent");
                self.metrics.record_sweep(remainder);
                Ok(remainder)
            }
            SendOutcome::RejectedWithFee { error, .. } | SendOutcome::Failed(error) => {
                Err(error.into())
            }
        }
    }
}
