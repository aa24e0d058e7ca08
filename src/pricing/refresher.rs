//! Periodic exchange-rate refresh.
//!
//! One refresher is owned by the service for the life of the process. It
//! refreshes once immediately and then every interval until stopped. A failed
//! refresh leaves the previous snapshot in place.

use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use super::client::RateSource;
use super::rates::RateCache;
use crate::audit::{Alert, Notifier};
use crate::monitoring::WalletMetrics;

/// Everything a single refresh pass needs.
#[derive(Clone)]
pub struct RefreshTask {
    pub cache: RateCache,
    pub source: Arc<dyn RateSource>,
    pub notifier: Arc<dyn Notifier>,
    pub metrics: Arc<WalletMetrics>,
}

impl RefreshTask {
    /// Fetches and publishes a new snapshot. Returns whether the cache changed.
    pub async fn run_once(&self) -> bool {
        match self.source.fetch().await {
            Ok(table) => {
                info!(
                    USD = ?table.get("USD"),
                    EUR = ?table.get("EUR"),
                    GBP = ?table.get("GBP"),
                    currencies = table.len(),
                    "BTC key rates"
                );
                self.cache.publish(table);
                self.metrics.record_rate_refresh(true);
                true
            }
            Err(e) => {
                error!(error = %e, "maintenance error");
                self.metrics.record_rate_refresh(false);
                self.notifier
                    .notify(Alert::error("maintenance", format!("maintenance error: {}", e)))
                    .await;
                false
            }
        }
    }
}

/// Handle to the running refresh loop.
pub struct RateRefresher {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

impl RateRefresher {
    pub fn start(task: RefreshTask, period: Duration) -> Self {
        let cancel = CancellationToken::new();
        let token = cancel.clone();

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = ticker.tick() => {
                        task.run_once().await;
                    }
                }
            }
            info!("rate refresher stopped");
        });

        info!(period_secs = period.as_secs(), "rate refresher started");
        Self { cancel, handle }
    }

    pub fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }

    /// Stops the loop and waits for an in-flight refresh to finish.
    pub async fn stop(self) {
        self.cancel.cancel();
        if let Err(e) = self.handle.await {
            error!(error = %e, "rate refresher task failed");
        }
    }
}
