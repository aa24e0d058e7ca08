//! Coinbase fiat-entry links.

use reqwest::Url;

use super::traits::PaymentLinkProvider;
use crate::core::config::CoinbaseConfig;
use crate::core::domain::{PaymentLink, ProviderKind, WalletDescriptor};
use crate::core::errors::WalletError;

const BUY_URL: &str = "https://buy.coinbase.com";
const RECURRING_URL: &str = "https://www.coinbase.com/recurring_payments/new";

pub struct CoinbaseLinks {
    widget_code: String,
}

impl CoinbaseLinks {
    pub fn new(config: &CoinbaseConfig) -> Self {
        Self { widget_code: config.widget_code.clone() }
    }
}

// TODO: accept EUR and GBP once the widget is enabled for them.
fn require_usd(currency: &str) -> Result<(), WalletError> {
    if currency != "USD" {
        return Err(WalletError::UnsupportedCurrency(currency.to_string()));
    }
    Ok(())
}

fn build(base: &str, params: &[(&str, String)]) -> Result<String, WalletError> {
    Url::parse_with_params(base, params)
        .map(String::from)
        .map_err(|e| WalletError::Configuration(format!("invalid link base {}: {}", base, e)))
}

impl PaymentLinkProvider for CoinbaseLinks {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Coinbase
    }

    fn purchase_btc(
        &self,
        wallet: &WalletDescriptor,
        amount: f64,
        currency: &str,
    ) -> Result<PaymentLink, WalletError> {
        require_usd(currency)?;
        let url = build(
            BUY_URL,
            &[
                ("crypto_currency", "BTC".to_string()),
                ("code", self.widget_code.clone()),
                ("amount", amount.to_string()),
                ("address", wallet.address.clone()),
            ],
        )?;
        Ok(PaymentLink::Purchase(url))
    }

    fn recurring_btc(
        &self,
        wallet: &WalletDescriptor,
        amount: f64,
        currency: &str,
    ) -> Result<PaymentLink, WalletError> {
        require_usd(currency)?;
        let url = build(
            RECURRING_URL,
            &[
                ("type", "send".to_string()),
                ("repeat", "monthly".to_string()),
                ("amount", amount.to_string()),
                ("currency", currency.to_string()),
                ("to", wallet.address.clone()),
            ],
        )?;
        Ok(PaymentLink::Recurring(url))
    }
}
