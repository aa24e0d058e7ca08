//! Static table from provider identifier to adapter.

use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

use super::bitgo::BitGoProvider;
use super::coinbase::CoinbaseLinks;
use super::traits::{Capabilities, CustodyProvider, Operation, PaymentLinkProvider};
use crate::core::config::WalletConfig;
use crate::core::domain::ProviderKind;
use crate::core::errors::WalletError;

struct CustodyEntry {
    provider: Arc<dyn CustodyProvider>,
    capabilities: Capabilities,
}

/// Dispatch table for custody and payment-link providers.
///
/// Custody operations have no safe default and fail with
/// `UnsupportedOperation` when missing. Payment links fall back to the
/// designated default link provider.
#[derive(Default)]
pub struct ProviderRegistry {
    custody: HashMap<ProviderKind, CustodyEntry>,
    links: HashMap<ProviderKind, Arc<dyn PaymentLinkProvider>>,
    default_links: Option<ProviderKind>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the adapters described by the configuration. Coinbase is the
    /// default payment-link provider.
    pub fn from_config(config: &WalletConfig) -> Self {
        let mut registry = Self::new().with_default_links(ProviderKind::Coinbase);
        if let Some(bitgo) = &config.bitgo {
            registry = registry.with_custody(Arc::new(BitGoProvider::new(bitgo)));
        }
        if let Some(coinbase) = &config.coinbase {
            registry = registry.with_links(Arc::new(CoinbaseLinks::new(coinbase)));
        }
        registry
    }

    pub fn with_custody(mut self, provider: Arc<dyn CustodyProvider>) -> Self {
        let capabilities = provider.capabilities();
        debug!(provider = %provider.kind(), ?capabilities, "registered custody provider");
        self.custody.insert(provider.kind(), CustodyEntry { provider, capabilities });
        self
    }

    pub fn with_links(mut self, provider: Arc<dyn PaymentLinkProvider>) -> Self {
        self.links.insert(provider.kind(), provider);
        self
    }

    pub fn with_default_links(mut self, kind: ProviderKind) -> Self {
        self.default_links = Some(kind);
        self
    }

    /// Resolves the custody adapter for `kind`, provided it implements `operation`.
    pub fn custody(
        &self,
        kind: ProviderKind,
        operation: Operation,
    ) -> Result<Arc<dyn CustodyProvider>, WalletError> {
        match self.custody.get(&kind) {
            Some(entry) if entry.capabilities.supports(operation) => Ok(Arc::clone(&entry.provider)),
            _ => Err(WalletError::unsupported(kind.as_str(), operation.as_str())),
        }
    }

    /// Link provider for `kind`, falling back to the default one.
    pub fn links(&self, kind: ProviderKind) -> Option<Arc<dyn PaymentLinkProvider>> {
        self.links
            .get(&kind)
            .or_else(|| self.default_links.and_then(|fallback| self.links.get(&fallback)))
            .cloned()
    }
}
