use parking_lot::Mutex;
use secrecy::SecretString;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::audit::{LogNotifier, Notifier, WebhookNotifier};
use crate::core::config::WalletConfig;
use crate::core::constants::RATE_REFRESH_INTERVAL;
use crate::core::domain::{
    Balances, PaymentLink, SubmissionResult, UnsignedTransaction, WalletDescriptor,
};
use crate::core::errors::WalletError;
use crate::monitoring::WalletMetrics;
use crate::pricing::{PricingClient, RateCache, RateRefresher, RateSource, RefreshTask};
use crate::providers::{Operation, ProviderRegistry};
use crate::transactions::{compare_tx, RecoverySweeper, TransactionBuilder, TransactionSubmitter};

/// Wallet service layer.
///
/// Dispatches wallet operations to the provider registered for each wallet and
/// owns the process's single rate-refresh task.
pub struct WalletService {
    registry: ProviderRegistry,
    rates: RateCache,
    notifier: Arc<dyn Notifier>,
    metrics: Arc<WalletMetrics>,
    rate_source: Option<Arc<dyn RateSource>>,
    refresh_period: Duration,
    refresher: Mutex<Option<RateRefresher>>,
}

impl WalletService {
    pub fn new(
        registry: ProviderRegistry,
        rates: RateCache,
        notifier: Arc<dyn Notifier>,
        metrics: Arc<WalletMetrics>,
    ) -> Self {
        Self {
            registry,
            rates,
            notifier,
            metrics,
            rate_source: None,
            refresh_period: RATE_REFRESH_INTERVAL,
            refresher: Mutex::new(None),
        }
    }

    pub fn from_config(config: &WalletConfig) -> Result<Self, WalletError> {
        config.validate()?;

        let notifier: Arc<dyn Notifier> = match &config.notify.webhook_url {
            Some(url) => Arc::new(WebhookNotifier::new(url.clone())),
            None => Arc::new(LogNotifier),
        };
        let metrics = WalletMetrics::new()
            .map_err(|e| WalletError::Configuration(format!("metrics registry: {}", e)))?;

        let service = Self::new(
            ProviderRegistry::from_config(config),
            RateCache::new(),
            notifier,
            Arc::new(metrics),
        )
        .with_rate_source(
            Arc::new(PricingClient::new(&config.pricing)),
            config.pricing.refresh_interval(),
        );
        Ok(service)
    }

    pub fn with_rate_source(mut self, source: Arc<dyn RateSource>, period: Duration) -> Self {
        self.rate_source = Some(source);
        self.refresh_period = period;
        self
    }

    pub fn rates(&self) -> &RateCache {
        &self.rates
    }

    pub fn metrics(&self) -> &WalletMetrics {
        &self.metrics
    }

    /// Arms the rate refresher. Only the first call starts a task; later calls
    /// (and calls without a rate source) return `false`.
    pub fn start_rate_refresh(&self) -> bool {
        let Some(source) = self.rate_source.clone() else {
            warn!("no rate source configured, rates will stay empty");
            return false;
        };

        let mut slot = self.refresher.lock();
        if slot.is_some() {
            return false;
        }
        let task = RefreshTask {
            cache: self.rates.clone(),
            source,
            notifier: Arc::clone(&self.notifier),
            metrics: Arc::clone(&self.metrics),
        };
        *slot = Some(RateRefresher::start(task, self.refresh_period));
        true
    }

    pub fn is_refreshing(&self) -> bool {
        self.refresher.lock().as_ref().map(RateRefresher::is_running).unwrap_or(false)
    }

    /// Stops the rate refresher, if running.
    pub async fn shutdown(&self) {
        let refresher = self.refresher.lock().take();
        if let Some(refresher) = refresher {
            refresher.stop().await;
            info!("wallet service stopped");
        }
    }

    pub async fn balances(&self, wallet: &WalletDescriptor) -> Result<Balances, WalletError> {
        let provider = self.registry.custody(wallet.provider, Operation::Balances)?;
        Ok(provider.balances(wallet).await?)
    }

    /// Purchase link for `wallet`; `None` when no link provider is available.
    pub fn purchase_btc(
        &self,
        wallet: &WalletDescriptor,
        amount: f64,
        currency: &str,
    ) -> Result<Option<PaymentLink>, WalletError> {
        self.registry
            .links(wallet.provider)
            .map(|links| links.purchase_btc(wallet, amount, currency))
            .transpose()
    }

    /// Recurring-purchase link for `wallet`; `None` when no link provider is available.
    pub fn recurring_btc(
        &self,
        wallet: &WalletDescriptor,
        amount: f64,
        currency: &str,
    ) -> Result<Option<PaymentLink>, WalletError> {
        self.registry
            .links(wallet.provider)
            .map(|links| links.recurring_btc(wallet, amount, currency))
            .transpose()
    }

    pub async fn recover(
        &self,
        source: &WalletDescriptor,
        destination: &str,
        passphrase: &SecretString,
    ) -> Result<u64, WalletError> {
        let provider = self.registry.custody(source.provider, Operation::Recover)?;
        RecoverySweeper::new(provider.as_ref(), &self.metrics)
            .sweep(source, destination, passphrase)
            .await
    }

    pub fn compare_tx(&self, unsigned_hex: &str, signed_hex: &str) -> Result<bool, WalletError> {
        compare_tx(unsigned_hex, signed_hex)
    }

    pub async fn submit_tx(
        &self,
        wallet: &WalletDescriptor,
        signed_hex: &str,
    ) -> Result<Option<SubmissionResult>, WalletError> {
        let provider = self.registry.custody(wallet.provider, Operation::SubmitTx)?;
        TransactionSubmitter::new(provider.as_ref(), self.notifier.as_ref(), &self.metrics)
            .submit(wallet, signed_hex)
            .await
    }

    /// Compares `signed_hex` against the transaction it was signed from and
    /// submits it only when they match.
    pub async fn submit_signed(
        &self,
        wallet: &WalletDescriptor,
        unsigned: &UnsignedTransaction,
        signed_hex: &str,
    ) -> Result<Option<SubmissionResult>, WalletError> {
        if !compare_tx(&unsigned.transaction_hex, signed_hex)? {
            warn!(wallet = %wallet.address, "signed transaction differs from unsigned");
            return Err(WalletError::InvalidTransaction(
                "signed transaction does not match its unsigned origin".to_string(),
            ));
        }
        self.submit_tx(wallet, signed_hex).await
    }

    pub async fn unsigned_tx(
        &self,
        wallet: &WalletDescriptor,
        amount: f64,
        currency: &str,
        balance: u64,
    ) -> Result<Option<UnsignedTransaction>, WalletError> {
        let provider = self.registry.custody(wallet.provider, Operation::UnsignedTx)?;
        TransactionBuilder::new(provider.as_ref(), &self.rates, self.notifier.as_ref(), &self.metrics)
            .build(wallet, amount, currency, balance)
            .await
    }
}
