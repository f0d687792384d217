//! Cash amount helpers.
//!
//! CRITICAL: Never use floating-point for money calculations.
//! Amounts are `rust_decimal::Decimal` values in the deployment's single
//! currency, held to cent precision.

use rust_decimal::Decimal;

/// Number of decimal places a cash amount may carry.
pub const CURRENCY_SCALE: u32 = 2;

/// Largest single amount or drawer balance accepted: 999,999,999,999,999.99.
pub const MAX_AMOUNT: Decimal = Decimal::from_parts(0x5D89_FFFF, 0x0163_4578, 0, false, 2);

/// Largest running total kept exact at cent precision: 10^26 - 0.01.
pub const MAX_TOTAL: Decimal = Decimal::from_parts(0x0FFF_FFFF, 0x3E25_0261, 0x204F_CE5E, false, 2);

/// Returns true if `amount` has no significant digits beyond cent precision.
///
/// Trailing zeros do not count: `10.500` is accepted, `10.005` is not.
#[must_use]
pub fn has_currency_precision(amount: Decimal) -> bool {
    amount.normalize().scale() <= CURRENCY_SCALE
}

/// Rescales an amount to exactly `CURRENCY_SCALE` places for display and storage.
///
/// Callers must check [`has_currency_precision`] first; extra digits are
/// rounded with banker's rounding.
#[must_use]
pub fn normalize_amount(amount: Decimal) -> Decimal {
    let mut value = amount.round_dp(CURRENCY_SCALE);
    value.rescale(CURRENCY_SCALE);
    value
}

/// Returns true if `amount` is within [`MAX_AMOUNT`] in magnitude.
#[must_use]
pub fn within_amount_limit(amount: Decimal) -> bool {
    amount.abs() <= MAX_AMOUNT
}

/// Adds two cent-precision values, refusing results beyond [`MAX_TOTAL`].
///
/// Inside that bound the sum is exact; `Decimal` would otherwise round away
/// the cents or panic on overflow.
#[must_use]
pub fn checked_total_add(total: Decimal, amount: Decimal) -> Option<Decimal> {
    total
        .checked_add(amount)
        .filter(|sum| sum.abs() <= MAX_TOTAL)
}

/// Subtracting counterpart of [`checked_total_add`].
#[must_use]
pub fn checked_total_sub(total: Decimal, amount: Decimal) -> Option<Decimal> {
    total
        .checked_sub(amount)
        .filter(|diff| diff.abs() <= MAX_TOTAL)
}

#[cfg(test)]
#[path = "money_tests.rs"]
mod tests;
