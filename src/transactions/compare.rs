//! Structural comparison of an unsigned transaction and its signed form.

use bitcoin::consensus::encode::deserialize;
use bitcoin::{Transaction, TxIn};

use crate::core::errors::WalletError;

fn decode(label: &str, tx_hex: &str) -> Result<Transaction, WalletError> {
    let bytes = hex::decode(tx_hex.trim())
        .map_err(|e| WalletError::InvalidTransaction(format!("{} hex: {}", label, e)))?;
    deserialize(&bytes).map_err(|e| WalletError::InvalidTransaction(format!("{}: {}", label, e)))
}

/// Inputs match when everything but the unlocking data (script_sig and
/// witness) is equal.
fn same_input(unsigned: &TxIn, signed: &TxIn) -> bool {
    unsigned.previous_output == signed.previous_output && unsigned.sequence == signed.sequence
}

/// Whether `signed_hex` is `unsigned_hex` with only unlocking data filled in.
///
/// Callers must refuse to submit when this returns `false`.
pub fn compare_tx(unsigned_hex: &str, signed_hex: &str) -> Result<bool, WalletError> {
    let unsigned = decode("unsigned transaction", unsigned_hex)?;
    let signed = decode("signed transaction", signed_hex)?;

    if unsigned.version != signed.version || unsigned.lock_time != signed.lock_time {
        return Ok(false);
    }
    if unsigned.input.len() != signed.input.len() {
        return Ok(false);
    }
    if !unsigned.input.iter().zip(&signed.input).all(|(u, s)| same_input(u, s)) {
        return Ok(false);
    }
    Ok(unsigned.output == signed.output)
}
