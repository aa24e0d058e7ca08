//! Exchange rates: signed fetch, validation, snapshot cache and refresh loop.

pub mod client;
pub mod rates;
pub mod refresher;

pub use client::{PricingClient, RateSource};
pub use rates::{RateCache, RateTable};
pub use refresher::{RateRefresher, RefreshTask};
