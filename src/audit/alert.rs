//! Operator notification channel.
//!
//! Rate-refresh failures and transaction-build failures are pushed here as
//! free-text alerts. Delivery is best effort: a failed delivery is logged and
//! never propagated into the operation that raised the alert.

use async_trait::async_trait;
use serde::Serialize;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertLevel {
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, Serialize)]
pub struct Alert {
    level: AlertLevel,
    source: &'static str,
    text: String,
    timestamp: u64,
}

impl Alert {
    pub fn new(level: AlertLevel, source: &'static str, text: impl Into<String>) -> Self {
        let ts =
            SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_secs()).unwrap_or_default();
        Self { level, source, text: text.into(), timestamp: ts }
    }

    pub fn error(source: &'static str, text: impl Into<String>) -> Self {
        Self::new(AlertLevel::Error, source, text)
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn level(&self) -> AlertLevel {
        self.level
    }

    pub fn source(&self) -> &'static str {
        self.source
    }

    pub fn timestamp(&self) -> u64 {
        self.timestamp
    }
}

/// Sink for operator alerts.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, alert: Alert);
}

/// Writes alerts to the tracing log only.
#[derive(Debug, Default, Clone)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, alert: Alert) {
        match alert.level {
            AlertLevel::Error => {
                error!(target: "alert", source = alert.source, ts = alert.timestamp, text = %alert.text, "operator alert");
            }
            AlertLevel::Warning => {
                warn!(target: "alert", source = alert.source, ts = alert.timestamp, text = %alert.text, "operator alert");
            }
            AlertLevel::Info => {
                info!(target: "alert", source = alert.source, ts = alert.timestamp, text = %alert.text, "operator alert");
            }
        }
    }
}

/// Posts alerts as `{"text": ...}` to an incoming-webhook URL (Slack style),
/// and logs them as well.
#[derive(Debug, Clone)]
pub struct WebhookNotifier {
    url: String,
    client: reqwest::Client,
}

impl WebhookNotifier {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into(), client: reqwest::Client::new() }
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn notify(&self, alert: Alert) {
        LogNotifier.notify(alert.clone()).await;

        let body = serde_json::json!({ "text": format!("{}: {}", alert.source, alert.text) });
        match self.client.post(&self.url).json(&body).send().await {
            Ok(resp) if resp.status().is_success() => {}
            Ok(resp) => warn!(status = resp.status().as_u16(), "alert webhook rejected message"),
            Err(e) => warn!(error = %e, "alert webhook unreachable"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::{Method, MockServer};

    #[test]
    fn test_alert_fields() {
        let alert = Alert::error("maintenance", "maintenance error: boom");
        assert_eq!(alert.level(), AlertLevel::Error);
        assert_eq!(alert.source(), "maintenance");
        assert_eq!(alert.text(), "maintenance error: boom");
        assert!(alert.timestamp() > 0);
    }

    #[tokio::test]
    async fn test_webhook_notifier_posts_text() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(Method::POST)
                .path("/hooks/ops")
                .json_body(serde_json::json!({ "text": "unsignedTx: createTransaction failed" }));
            then.status(200);
        });

        let notifier = WebhookNotifier::new(server.url("/hooks/ops"));
        notifier.notify(Alert::error("unsignedTx", "createTransaction failed")).await;

        mock.assert();
    }

    #[tokio::test]
    async fn test_webhook_failure_is_swallowed() {
        let notifier = WebhookNotifier::new("http://127.0.0.1:9/unreachable");
        notifier.notify(Alert::error("maintenance", "down")).await;
    }
}
