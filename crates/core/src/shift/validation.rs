//! Input validation for shift operations.
//!
//! These checks need no stored state and run before any lock is taken.

use rust_decimal::Decimal;
use teller_shared::types::{MAX_AMOUNT, has_currency_precision, within_amount_limit};

use super::error::ShiftError;
use super::types::{DenominationLine, TransactionKind, denomination_total};

/// Rejects amounts with more than cent precision.
///
/// # Errors
///
/// Returns `ExcessPrecision` if the amount has sub-cent digits.
pub fn validate_precision(amount: Decimal) -> Result<(), ShiftError> {
    if !has_currency_precision(amount) {
        return Err(ShiftError::ExcessPrecision(amount));
    }
    Ok(())
}

/// Rejects amounts larger than the cash amount limit.
///
/// # Errors
///
/// Returns `AmountExceedsLimit` if the amount exceeds `MAX_AMOUNT`.
pub fn validate_limit(amount: Decimal) -> Result<(), ShiftError> {
    if !within_amount_limit(amount) {
        return Err(ShiftError::AmountExceedsLimit {
            amount,
            limit: MAX_AMOUNT,
        });
    }
    Ok(())
}

fn validate_cash(amount: Decimal) -> Result<(), ShiftError> {
    validate_precision(amount)?;
    validate_limit(amount)
}

/// Validates a drawer or teller code.
///
/// # Errors
///
/// Returns `BlankCode` if the code is empty after trimming.
pub fn validate_code(label: &'static str, code: &str) -> Result<(), ShiftError> {
    if code.trim().is_empty() {
        return Err(ShiftError::BlankCode(label));
    }
    Ok(())
}

/// Validates an opening float.
///
/// # Errors
///
/// Returns `InvalidOpeningAmount` if not positive, `ExcessPrecision` if it has
/// sub-cent digits, `AmountExceedsLimit` if too large.
pub fn validate_opening_amount(amount: Decimal) -> Result<(), ShiftError> {
    if amount <= Decimal::ZERO {
        return Err(ShiftError::InvalidOpeningAmount(amount));
    }
    validate_cash(amount)
}

/// Validates a closing amount. Zero is allowed.
///
/// # Errors
///
/// Returns `NegativeClosingAmount`, `ExcessPrecision` or `AmountExceedsLimit`.
pub fn validate_closing_amount(amount: Decimal) -> Result<(), ShiftError> {
    if amount < Decimal::ZERO {
        return Err(ShiftError::NegativeClosingAmount(amount));
    }
    validate_cash(amount)
}

/// Validates the kind and amount of an externally submitted transaction.
///
/// # Errors
///
/// Returns `LifecycleKindNotSubmittable` for OPEN/CLOSE, `NonPositiveAmount`
/// `ExcessPrecision` or `AmountExceedsLimit` for a bad amount.
pub fn validate_submission(kind: TransactionKind, amount: Decimal) -> Result<(), ShiftError> {
    if kind.is_lifecycle() {
        return Err(ShiftError::LifecycleKindNotSubmittable(kind));
    }
    if amount <= Decimal::ZERO {
        return Err(ShiftError::NonPositiveAmount(amount));
    }
    validate_cash(amount)
}

/// Checks that a non-empty breakdown sums exactly to the declared amount.
///
/// An empty breakdown is always accepted.
///
/// # Errors
///
/// Returns `DenominationMismatch` with both totals when they differ.
pub fn validate_denominations(
    declared: Decimal,
    lines: &[DenominationLine],
) -> Result<(), ShiftError> {
    if lines.is_empty() {
        return Ok(());
    }

    let computed = denomination_total(lines);
    if computed != declared {
        return Err(ShiftError::DenominationMismatch { declared, computed });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shift::types::Denomination;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    #[rstest]
    #[case(dec!(0))]
    #[case(dec!(-0.01))]
    #[case(dec!(-1000))]
    fn test_opening_amount_must_be_positive(#[case] amount: Decimal) {
        assert!(matches!(
            validate_opening_amount(amount),
            Err(ShiftError::InvalidOpeningAmount(_))
        ));
    }

    #[test]
    fn test_opening_amount_precision() {
        assert!(validate_opening_amount(dec!(1000.00)).is_ok());
        assert!(matches!(
            validate_opening_amount(dec!(1000.001)),
            Err(ShiftError::ExcessPrecision(_))
        ));
    }

    #[test]
    fn test_closing_amount_allows_zero() {
        assert!(validate_closing_amount(Decimal::ZERO).is_ok());
        assert!(matches!(
            validate_closing_amount(dec!(-0.01)),
            Err(ShiftError::NegativeClosingAmount(_))
        ));
    }

    #[rstest]
    #[case(TransactionKind::Open)]
    #[case(TransactionKind::Close)]
    fn test_lifecycle_kinds_rejected(#[case] kind: TransactionKind) {
        assert!(matches!(
            validate_submission(kind, dec!(10)),
            Err(ShiftError::LifecycleKindNotSubmittable(k)) if k == kind
        ));
    }

    #[test]
    fn test_submission_amount_rules() {
        assert!(validate_submission(TransactionKind::Deposit, dec!(0.01)).is_ok());
        assert!(matches!(
            validate_submission(TransactionKind::Withdrawal, Decimal::ZERO),
            Err(ShiftError::NonPositiveAmount(_))
        ));
        assert!(matches!(
            validate_submission(TransactionKind::Deposit, dec!(5.555)),
            Err(ShiftError::ExcessPrecision(_))
        ));
    }

    #[test]
    fn test_amounts_above_limit_rejected() {
        assert!(validate_submission(TransactionKind::Deposit, MAX_AMOUNT).is_ok());
        assert!(matches!(
            validate_submission(TransactionKind::Deposit, dec!(50_000_000_000_000_000_000_000_000_000)),
            Err(ShiftError::AmountExceedsLimit { limit, .. }) if limit == MAX_AMOUNT
        ));
        assert!(matches!(
            validate_opening_amount(MAX_AMOUNT + dec!(0.01)),
            Err(ShiftError::AmountExceedsLimit { .. })
        ));
        assert!(matches!(
            validate_closing_amount(MAX_AMOUNT + dec!(0.01)),
            Err(ShiftError::AmountExceedsLimit { .. })
        ));
    }

    #[test]
    fn test_blank_codes_rejected() {
        assert!(validate_code("Drawer", "CAJA-01").is_ok());
        assert!(matches!(
            validate_code("Teller", "   "),
            Err(ShiftError::BlankCode("Teller"))
        ));
    }

    #[test]
    fn test_denominations_must_match_declared() {
        let lines = [DenominationLine::new(Denomination::Hundred, 5)];
        assert!(validate_denominations(dec!(500.00), &lines).is_ok());
        assert!(validate_denominations(dec!(123.45), &[]).is_ok());

        let err = validate_denominations(dec!(500.01), &lines).unwrap_err();
        assert!(matches!(
            err,
            ShiftError::DenominationMismatch { declared, computed }
                if declared == dec!(500.01) && computed == dec!(500)
        ));
    }
}
