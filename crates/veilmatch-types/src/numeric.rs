//! Checked unsigned arithmetic for prices, quantities, and fees.
//!
//! All amounts are `u64`: prices in basis points of the quote currency,
//! quantities in base-token smallest units. Every multiplication widens to
//! `u128` and is checked on narrowing back; division always truncates toward
//! zero. There is no floating point anywhere in the core.

use crate::constants::BPS_SCALE;
use crate::error::{CoreError, Result};

/// `⌊a · b / d⌋` with 128-bit intermediate precision.
///
/// # Errors
/// Returns [`CoreError::AmountOverflow`] if `d` is zero or the result does
/// not fit in `u64`.
pub fn mul_div_floor(a: u64, b: u64, d: u64) -> Result<u64> {
    if d == 0 {
        return Err(CoreError::AmountOverflow {
            context: "division by zero".into(),
        });
    }
    let wide = u128::from(a) * u128::from(b) / u128::from(d);
    u64::try_from(wide).map_err(|_| CoreError::AmountOverflow {
        context: format!("{a} * {b} / {d} exceeds u64"),
    })
}

/// Quote-currency value of `qty` base units at `price_bps`:
/// `⌊qty · price / 10_000⌋`.
pub fn quote_value(qty: u64, price_bps: u64) -> Result<u64> {
    mul_div_floor(qty, price_bps, BPS_SCALE)
}

/// Fee on `amount` at `fee_bps` basis points: `⌊amount · fee_bps / 10_000⌋`.
pub fn fee(amount: u64, fee_bps: u64) -> Result<u64> {
    mul_div_floor(amount, fee_bps, BPS_SCALE)
}

/// Midpoint execution price: truncating integer average of the two limit
/// prices. The round-down bias is deliberate and part of the execution
/// contract.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn midpoint_price(buy_limit: u64, sell_limit: u64) -> u64 {
    // Sum may exceed u64; the average never does.
    ((u128::from(buy_limit) + u128::from(sell_limit)) / 2) as u64
}

/// Checked addition surfacing [`CoreError::AmountOverflow`].
pub fn checked_add(a: u64, b: u64, context: &str) -> Result<u64> {
    a.checked_add(b).ok_or_else(|| CoreError::AmountOverflow {
        context: context.to_string(),
    })
}

/// Checked subtraction surfacing [`CoreError::AmountOverflow`].
pub fn checked_sub(a: u64, b: u64, context: &str) -> Result<u64> {
    a.checked_sub(b).ok_or_else(|| CoreError::AmountOverflow {
        context: context.to_string(),
    })
}
