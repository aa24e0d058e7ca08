pub mod config;
pub mod constants;
pub mod domain;
pub mod errors;

pub use config::WalletConfig;
pub use domain::{ProviderKind, WalletDescriptor};
pub use errors::{ProviderError, RateRefreshError, WalletError};
