use anyhow::Result;
use prometheus::{Counter, Encoder, Histogram, HistogramOpts, Registry, TextEncoder};
use tracing::info;

pub struct WalletMetrics {
    registry: Registry,

    // Rate metrics
    pub rate_refreshes: Counter,
    pub rate_refresh_failures: Counter,

    // Transaction metrics
    pub transactions_built: Counter,
    pub transaction_build_failures: Counter,
    pub transactions_submitted: Counter,
    pub confirmation_timeouts: Counter,
    pub transaction_fees: Histogram,

    // Recovery metrics
    pub sweeps: Counter,
    pub sweeps_below_dust: Counter,
}

impl WalletMetrics {
    pub fn new() -> Result<Self> {
        info!("Initializing wallet metrics");

        let registry = Registry::new();

        let rate_refreshes =
            Counter::new("rate_refreshes_total", "Total number of successful rate refreshes")?;
        let rate_refresh_failures =
            Counter::new("rate_refresh_failures_total", "Total number of failed rate refreshes")?;

        let transactions_built =
            Counter::new("transactions_built_total", "Total number of unsigned transactions built")?;
        let transaction_build_failures = Counter::new(
            "transaction_build_failures_total",
            "Total number of soft failures while building transactions",
        )?;
        let transactions_submitted =
            Counter::new("transactions_submitted_total", "Total number of broadcast transactions")?;
        let confirmation_timeouts = Counter::new(
            "confirmation_timeouts_total",
            "Total number of broadcasts whose details never became available",
        )?;
        let transaction_fees = Histogram::with_opts(HistogramOpts::new(
            "transaction_fees_satoshis",
            "Fees of built transactions in satoshis",
        ))?;

        let sweeps = Counter::new("sweeps_total", "Total number of recovery sweeps sent")?;
        let sweeps_below_dust =
            Counter::new("sweeps_below_dust_total", "Total number of sweeps abandoned as dust")?;

        registry.register(Box::new(rate_refreshes.clone()))?;
        registry.register(Box::new(rate_refresh_failures.clone()))?;
        registry.register(Box::new(transactions_built.clone()))?;
        registry.register(Box::new(transaction_build_failures.clone()))?;
        registry.register(Box::new(transactions_submitted.clone()))?;
        registry.register(Box::new(confirmation_timeouts.clone()))?;
        registry.register(Box::new(transaction_fees.clone()))?;
        registry.register(Box::new(sweeps.clone()))?;
        registry.register(Box::new(sweeps_below_dust.clone()))?;

        Ok(Self {
            registry,
            rate_refreshes,
            rate_refresh_failures,
            transactions_built,
            transaction_build_failures,
            transactions_submitted,
            confirmation_timeouts,
            transaction_fees,
            sweeps,
            sweeps_below_dust,
        })
    }

    pub fn export_metrics(&self) -> Result<String> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }

    pub fn record_rate_refresh(&self, success: bool) {
        if success {
            self.rate_refreshes.inc();
        } else {
            self.rate_refresh_failures.inc();
        }
    }

    pub fn record_transaction_built(&self, fee: u64) {
        self.transactions_built.inc();
        self.transaction_fees.observe(fee as f64);
    }

    pub fn record_build_failure(&self) {
        self.transaction_build_failures.inc();
    }

    pub fn record_submission(&self) {
        self.transactions_submitted.inc();
    }

    pub fn record_confirmation_timeout(&self) {
        self.confirmation_timeouts.inc();
    }

    pub fn record_sweep(&self, swept: u64) {
        if swept == 0 {
            self.sweeps_below_dust.inc();
        } else {
            self.sweeps.inc();
        }
    }
}
