//! Conversion between decimal display amounts and integer base units.
//!
//! All arithmetic is on integers; display amounts never pass through `f64`.

use alloy_primitives::U256;

use crate::error::WalletError;

/// Parse a non-negative decimal string into base units, truncating digits
/// beyond `decimals`.
///
/// `parse_units("0.000000019", 8)` is `1`: the trailing `9` is floored away.
pub fn parse_units(amount: &str, decimals: u8) -> Result<U256, WalletError> {
    let amount = amount.trim();
    if amount.is_empty() {
        return Err(WalletError::InvalidAmount("amount is empty".into()));
    }

    let (whole, fraction) = match amount.split_once('.') {
        Some((w, f)) => (w, f),
        None => (amount, ""),
    };
    if whole.is_empty() && fraction.is_empty() {
        return Err(WalletError::InvalidAmount(format!("{amount:?} is not a number")));
    }
    if !whole.bytes().all(|b| b.is_ascii_digit()) || !fraction.bytes().all(|b| b.is_ascii_digit()) {
        return Err(WalletError::InvalidAmount(format!(
            "{amount:?} is not a plain non-negative decimal"
        )));
    }

    let decimals = decimals as usize;
    let kept: String = fraction.chars().take(decimals).collect();
    let digits = format!("{whole}{kept:0<decimals$}");
    let digits = digits.trim_start_matches('0');
    if digits.is_empty() {
        return Ok(U256::ZERO);
    }

    U256::from_str_radix(digits, 10)
        .map_err(|_| WalletError::InvalidAmount(format!("{amount:?} is too large")))
}

/// [`parse_units`] for chains whose amounts fit in a `u64`.
pub fn parse_units_u64(amount: &str, decimals: u8) -> Result<u64, WalletError> {
    let value = parse_units(amount, decimals)?;
    u64::try_from(value)
        .map_err(|_| WalletError::InvalidAmount(format!("{amount:?} is too large")))
}

/// Render base units as a decimal string without trailing zeros.
pub fn format_units(value: U256, decimals: u8) -> String {
    let digits = value.to_string();
    let decimals = decimals as usize;
    if decimals == 0 {
        return digits;
    }

    let padded = format!("{digits:0>width$}", width = decimals + 1);
    let (whole, fraction) = padded.split_at(padded.len() - decimals);
    let fraction = fraction.trim_end_matches('0');
    if fraction.is_empty() {
        whole.to_string()
    } else {
        format!("{whole}.{fraction}")
    }
}

pub fn format_units_u64(value: u64, decimals: u8) -> String {
    format_units(U256::from(value), decimals)
}

/// Signed variant for mempool deltas.
pub fn format_units_i64(value: i64, decimals: u8) -> String {
    let magnitude = format_units_u64(value.unsigned_abs(), decimals);
    if value < 0 {
        format!("-{magnitude}")
    } else {
        magnitude
    }
}
