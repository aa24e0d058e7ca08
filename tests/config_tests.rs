// tests/config_tests.rs
// Configuration loading from files and WALLET_* environment variables.

use custodial_wallet::core::config::WalletConfig;
use custodial_wallet::core::errors::WalletError;
use custodial_wallet::{ProviderKind, WalletDescriptor, WalletService};
use secrecy::ExposeSecret;
use serial_test::serial;
use std::io::Write;

const VARS: &[&str] = &[
    "WALLET_PRICING_URL",
    "WALLET_PRICING_PUBLIC_KEY",
    "WALLET_PRICING_SECRET_KEY",
    "WALLET_PRICING_REFRESH_SECS",
    "WALLET_BITGO_ACCESS_TOKEN",
    "WALLET_BITGO_ENVIRONMENT",
    "WALLET_BITGO_BASE_URL",
    "WALLET_BITGO_SETTLEMENT_ADDRESS",
    "WALLET_COINBASE_WIDGET_CODE",
    "WALLET_NOTIFY_WEBHOOK_URL",
];

fn clear_env() {
    for var in VARS {
        std::env::remove_var(var);
    }
}

#[test]
#[serial]
fn test_from_env_minimal() {
    clear_env();
    std::env::set_var("WALLET_PRICING_PUBLIC_KEY", "pub");
    std::env::set_var("WALLET_PRICING_SECRET_KEY", "shh");

    let config = WalletConfig::from_env().unwrap();

    assert_eq!(config.pricing.public_key, "pub");
    assert_eq!(config.pricing.secret_key.expose_secret(), "shh");
    assert_eq!(config.pricing.refresh_interval_secs, 900);
    assert!(config.bitgo.is_none());
    assert!(config.coinbase.is_none());
    clear_env();
}

#[test]
#[serial]
fn test_from_env_with_providers() {
    clear_env();
    std::env::set_var("WALLET_PRICING_PUBLIC_KEY", "pub");
    std::env::set_var("WALLET_PRICING_SECRET_KEY", "shh");
    std::env::set_var("WALLET_PRICING_REFRESH_SECS", "60");
    std::env::set_var("WALLET_BITGO_ACCESS_TOKEN", "v2x-token");
    std::env::set_var("WALLET_BITGO_SETTLEMENT_ADDRESS", "2NFJnLrhsCDfG3ooW7ViqDaf1ojhNEzRhzM");
    std::env::set_var("WALLET_COINBASE_WIDGET_CODE", "widget");

    let config = WalletConfig::from_env().unwrap();

    assert_eq!(config.pricing.refresh_interval().as_secs(), 60);
    let bitgo = config.bitgo.as_ref().unwrap();
    assert_eq!(bitgo.api_root(), "https://www.bitgo.com");
    assert_eq!(bitgo.access_token.expose_secret(), "v2x-token");
    assert_eq!(config.coinbase.as_ref().unwrap().widget_code, "widget");
    clear_env();
}

#[test]
#[serial]
fn test_from_env_missing_secret() {
    clear_env();
    std::env::set_var("WALLET_PRICING_PUBLIC_KEY", "pub");

    match WalletConfig::from_env() {
        Err(WalletError::Configuration(msg)) => {
            assert_eq!(msg, "WALLET_PRICING_SECRET_KEY undefined")
        }
        other => panic!("expected configuration error, got {:?}", other.map(|_| ())),
    }
    clear_env();
}

#[test]
#[serial]
fn test_from_env_bitgo_without_settlement_address() {
    clear_env();
    std::env::set_var("WALLET_PRICING_PUBLIC_KEY", "pub");
    std::env::set_var("WALLET_PRICING_SECRET_KEY", "shh");
    std::env::set_var("WALLET_BITGO_ACCESS_TOKEN", "v2x-token");

    assert!(matches!(WalletConfig::from_env(), Err(WalletError::Configuration(_))));
    clear_env();
}

#[test]
#[serial]
fn test_from_env_bad_refresh_interval() {
    clear_env();
    std::env::set_var("WALLET_PRICING_PUBLIC_KEY", "pub");
    std::env::set_var("WALLET_PRICING_SECRET_KEY", "shh");
    std::env::set_var("WALLET_PRICING_REFRESH_SECS", "soon");

    assert!(matches!(WalletConfig::from_env(), Err(WalletError::Configuration(_))));
    clear_env();
}

#[test]
fn test_from_file_and_build_service() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"
[pricing]
public_key = "pub"
secret_key = "shh"

[bitgo]
access_token = "v2x-token"
environment = "test"
settlement_address = "2NFJnLrhsCDfG3ooW7ViqDaf1ojhNEzRhzM"

[coinbase]
widget_code = "widget"
"#
    )
    .unwrap();

    let config = WalletConfig::from_file(file.path()).unwrap();
    let service = WalletService::from_config(&config).unwrap();

    let wallet = WalletDescriptor::new(ProviderKind::Bitgo, "2Mx");
    let link = service.purchase_btc(&wallet, 25.0, "USD").unwrap().expect("link");
    assert!(link.url().starts_with("https://buy.coinbase.com/?crypto_currency=BTC&code=widget"));
    assert!(!service.is_refreshing());
}

#[test]
fn test_from_file_missing() {
    let result = WalletConfig::from_file("/nonexistent/wallet.toml");
    assert!(matches!(result, Err(WalletError::Configuration(_))));
}

#[test]
fn test_from_file_invalid_toml() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "[pricing").unwrap();

    assert!(matches!(WalletConfig::from_file(file.path()), Err(WalletError::Configuration(_))));
}
