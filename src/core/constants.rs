//! Protocol constants shared by the transaction flows.

use std::time::Duration;

/// Satoshis per bitcoin.
pub const SATOSHIS_PER_BTC: f64 = 1e8;

/// Share of the desired amount that must be spendable for a build to proceed.
pub const MINIMUM_SPEND_RATIO: f64 = 0.90;

/// Confirmation target (in blocks) used for the fee-per-kb oracle.
pub const FEE_TARGET_BLOCKS: u32 = 6;

/// Upper bound on candidate builds during fee convergence.
pub const MAX_FEE_PASSES: usize = 2;

/// Sweep remainders at or below this many satoshis are never sent.
pub const DUST_THRESHOLD_SAT: u64 = 2730;

/// Transaction-detail lookups attempted after a broadcast.
pub const CONFIRMATION_POLL_ATTEMPTS: u32 = 5;

/// Pause between transaction-detail lookups.
pub const CONFIRMATION_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Exchange-rate refresh period.
pub const RATE_REFRESH_INTERVAL: Duration = Duration::from_secs(15 * 60);
