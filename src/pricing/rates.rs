//! Exchange-rate snapshot and the shared cache that publishes it.

use parking_lot::RwLock;
use regex::Regex;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::{Arc, OnceLock};

use crate::core::errors::RateRefreshError;

/// BTC price per currency, keyed by upper-case 3-letter code.
///
/// Every entry carries a finite, strictly positive rate.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RateTable {
    rates: BTreeMap<String, f64>,
}

fn key_pattern() -> Result<&'static Regex, RateRefreshError> {
    static PATTERN: OnceLock<Result<Regex, regex::Error>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"timestamp|[A-Z]{3}"))
        .as_ref()
        .map_err(|e| RateRefreshError::Pattern(e.clone()))
}

fn is_currency_code(code: &str) -> bool {
    code.len() == 3 && code.bytes().all(|b| b.is_ascii_uppercase())
}

fn is_rate(rate: f64) -> bool {
    rate.is_finite() && rate > 0.0
}

impl RateTable {
    /// Validates a pricing-index ticker document and extracts the BTC cross rates.
    ///
    /// The whole document is rejected when any key is neither `timestamp` nor
    /// currency-like, or when a currency entry lacks a positive `last`. Only
    /// `BTCxxx` pairs are kept, re-keyed by their quote currency.
    pub fn from_ticker(body: &Value) -> Result<Self, RateRefreshError> {
        let entries = body
            .as_object()
            .ok_or_else(|| RateRefreshError::Schema("expected a JSON object".to_string()))?;

        let pattern = key_pattern()?;
        for (key, value) in entries {
            if !pattern.is_match(key) {
                return Err(RateRefreshError::Schema(format!("\"{}\" is not allowed", key)));
            }
            if key == "timestamp" {
                if !(value.is_number() || value.is_string()) {
                    return Err(RateRefreshError::Schema("\"timestamp\" must be a date".to_string()));
                }
                continue;
            }
            match value.get("last").and_then(Value::as_f64) {
                Some(last) if is_rate(last) => {}
                _ => {
                    return Err(RateRefreshError::Schema(format!(
                        "\"{}\".last must be a positive number",
                        key
                    )))
                }
            }
        }

        let rates = entries
            .iter()
            .filter_map(|(key, value)| {
                let quote = key.strip_prefix("BTC")?;
                let last = value.as_object()?.get("last")?.as_f64()?;
                is_currency_code(quote).then(|| (quote.to_string(), last))
            })
            .collect();

        Ok(Self { rates })
    }

    pub fn get(&self, currency: &str) -> Option<f64> {
        self.rates.get(currency).copied()
    }

    pub fn len(&self) -> usize {
        self.rates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.rates.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

/// Entries that are not a 3-letter code with a positive rate are dropped.
impl FromIterator<(String, f64)> for RateTable {
    fn from_iter<I: IntoIterator<Item = (String, f64)>>(iter: I) -> Self {
        let rates = iter
            .into_iter()
            .filter(|(code, rate)| is_currency_code(code) && is_rate(*rate))
            .collect();
        Self { rates }
    }
}

/// Shared, whole-snapshot rate cache.
///
/// Writers replace the table pointer under a short write lock; readers clone
/// the current `Arc` and never see a partially built table.
#[derive(Debug, Clone, Default)]
pub struct RateCache {
    current: Arc<RwLock<Arc<RateTable>>>,
}

impl RateCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_table(table: RateTable) -> Self {
        Self { current: Arc::new(RwLock::new(Arc::new(table))) }
    }

    /// Rate for an upper-case currency code.
    pub fn lookup(&self, currency: &str) -> Option<f64> {
        self.current.read().get(currency)
    }

    pub fn snapshot(&self) -> Arc<RateTable> {
        Arc::clone(&self.current.read())
    }

    pub fn publish(&self, table: RateTable) {
        *self.current.write() = Arc::new(table);
    }
}
