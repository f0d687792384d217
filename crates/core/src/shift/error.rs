//! Shift ledger error types.
//!
//! Every error carries a stable machine-readable code, a coarse kind that
//! transport adapters map to a status, and the amounts and identities needed
//! for manual reconciliation.

use rust_decimal::Decimal;
use serde::Serialize;
use teller_shared::AppError;
use teller_shared::types::ShiftId;
use thiserror::Error;

use super::types::TransactionKind;

/// Coarse error classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    /// Malformed or out-of-range input.
    Validation,
    /// Referenced shift does not exist.
    NotFound,
    /// State-transition violation or contention.
    Conflict,
    /// Stored data contradicts a ledger invariant.
    InvariantViolation,
    /// Storage backend failure.
    Internal,
}

impl ErrorKind {
    /// Returns the kind as a stable string.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Validation => "VALIDATION",
            Self::NotFound => "NOT_FOUND",
            Self::Conflict => "CONFLICT",
            Self::InvariantViolation => "INVARIANT_VIOLATION",
            Self::Internal => "INTERNAL",
        }
    }
}

/// Errors that can occur during shift ledger operations.
#[derive(Debug, Error)]
pub enum ShiftError {
    // ========== Validation Errors ==========
    /// Opening float must be strictly positive.
    #[error("Opening amount must be positive, got {0}")]
    InvalidOpeningAmount(Decimal),

    /// Transaction amount must be strictly positive.
    #[error("Transaction amount must be positive, got {0}")]
    NonPositiveAmount(Decimal),

    /// Closing amount cannot be negative.
    #[error("Closing amount cannot be negative, got {0}")]
    NegativeClosingAmount(Decimal),

    /// Amount carries more than cent precision.
    #[error("Amount {0} has more than 2 decimal places")]
    ExcessPrecision(Decimal),

    /// Amount exceeds the largest accepted cash amount.
    #[error("Amount {amount} exceeds the limit of {limit}")]
    AmountExceedsLimit {
        /// Offending amount.
        amount: Decimal,
        /// Largest accepted amount.
        limit: Decimal,
    },

    /// Applying the amount would take the balance outside the accepted range.
    #[error("Balance out of range in shift {shift_id}: balance {balance}, amount {amount}")]
    BalanceOutOfRange {
        /// The shift.
        shift_id: ShiftId,
        /// Reconciled balance at validation time.
        balance: Decimal,
        /// Amount being applied.
        amount: Decimal,
    },

    /// Drawer or teller code is blank.
    #[error("{0} code must not be blank")]
    BlankCode(&'static str),

    /// OPEN and CLOSE are produced by the shift lifecycle only.
    #[error("{0} transactions cannot be submitted directly")]
    LifecycleKindNotSubmittable(TransactionKind),

    /// Bill value outside the accepted set.
    #[error("Invalid denomination: {0}")]
    InvalidDenomination(Decimal),

    /// Denomination lines do not add up to the declared amount.
    #[error("Declared amount {declared} does not match denomination total {computed}")]
    DenominationMismatch {
        /// Amount declared by the caller.
        declared: Decimal,
        /// Sum of value x count across lines.
        computed: Decimal,
    },

    /// Withdrawal would drive the reconciled balance negative.
    #[error("Insufficient funds in shift {shift_id}: balance {balance}, requested {requested}")]
    InsufficientFunds {
        /// The shift.
        shift_id: ShiftId,
        /// Reconciled balance at validation time.
        balance: Decimal,
        /// Requested withdrawal.
        requested: Decimal,
    },

    /// Declared closing cash differs from the reconciled balance.
    #[error("Closing amount does not reconcile for shift {shift_id}: expected {expected}, actual {actual}")]
    ReconciliationMismatch {
        /// The shift.
        shift_id: ShiftId,
        /// Engine-derived balance.
        expected: Decimal,
        /// Caller-declared closing amount.
        actual: Decimal,
    },

    // ========== Not Found Errors ==========
    /// Shift not found.
    #[error("Shift not found: {0}")]
    ShiftNotFound(ShiftId),

    // ========== Conflict Errors ==========
    /// The drawer already has an open shift.
    #[error("Drawer {drawer_code} already has open shift {shift_id}")]
    DrawerHasOpenShift {
        /// Drawer code.
        drawer_code: String,
        /// The open shift.
        shift_id: ShiftId,
    },

    /// The teller already has an open shift.
    #[error("Teller {teller_code} already has open shift {shift_id}")]
    TellerHasOpenShift {
        /// Teller code.
        teller_code: String,
        /// The open shift.
        shift_id: ShiftId,
    },

    /// Shift is closed; no further transactions or closes.
    #[error("Shift {0} is closed")]
    ShiftClosed(ShiftId),

    /// Could not acquire a lock within the configured wait.
    #[error("Timed out after {waited_ms}ms waiting for lock on {key}")]
    LockTimeout {
        /// Lock key description.
        key: String,
        /// Time waited.
        waited_ms: u64,
    },

    /// Stale write rejected by compare-and-swap.
    #[error("Version mismatch for shift {shift_id}: expected {expected}, got {actual}")]
    VersionMismatch {
        /// The shift.
        shift_id: ShiftId,
        /// Version presented by the writer.
        expected: u64,
        /// Version found in the store.
        actual: u64,
    },

    // ========== Integrity Errors ==========
    /// The transaction log contradicts a ledger invariant.
    #[error("Invariant violation in shift {shift_id}: {detail}")]
    InvariantViolation {
        /// The shift.
        shift_id: ShiftId,
        /// What was found.
        detail: String,
    },

    // ========== Storage Errors ==========
    /// Storage backend error.
    #[error("Storage error: {0}")]
    Storage(String),
}

impl ShiftError {
    /// Returns the coarse kind of this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidOpeningAmount(_)
            | Self::NonPositiveAmount(_)
            | Self::NegativeClosingAmount(_)
            | Self::ExcessPrecision(_)
            | Self::AmountExceedsLimit { .. }
            | Self::BalanceOutOfRange { .. }
            | Self::BlankCode(_)
            | Self::LifecycleKindNotSubmittable(_)
            | Self::InvalidDenomination(_)
            | Self::DenominationMismatch { .. }
            | Self::InsufficientFunds { .. }
            | Self::ReconciliationMismatch { .. } => ErrorKind::Validation,

            Self::ShiftNotFound(_) => ErrorKind::NotFound,

            Self::DrawerHasOpenShift { .. }
            | Self::TellerHasOpenShift { .. }
            | Self::ShiftClosed(_)
            | Self::LockTimeout { .. }
            | Self::VersionMismatch { .. } => ErrorKind::Conflict,

            Self::InvariantViolation { .. } => ErrorKind::InvariantViolation,

            Self::Storage(_) => ErrorKind::Internal,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidOpeningAmount(_) => "INVALID_OPENING_AMOUNT",
            Self::NonPositiveAmount(_) => "NON_POSITIVE_AMOUNT",
            Self::NegativeClosingAmount(_) => "NEGATIVE_CLOSING_AMOUNT",
            Self::ExcessPrecision(_) => "EXCESS_PRECISION",
            Self::AmountExceedsLimit { .. } => "AMOUNT_EXCEEDS_LIMIT",
            Self::BalanceOutOfRange { .. } => "BALANCE_OUT_OF_RANGE",
            Self::BlankCode(_) => "BLANK_CODE",
            Self::LifecycleKindNotSubmittable(_) => "LIFECYCLE_KIND_NOT_SUBMITTABLE",
            Self::InvalidDenomination(_) => "INVALID_DENOMINATION",
            Self::DenominationMismatch { .. } => "DENOMINATION_MISMATCH",
            Self::InsufficientFunds { .. } => "INSUFFICIENT_FUNDS",
            Self::ReconciliationMismatch { .. } => "RECONCILIATION_MISMATCH",
            Self::ShiftNotFound(_) => "SHIFT_NOT_FOUND",
            Self::DrawerHasOpenShift { .. } => "DRAWER_HAS_OPEN_SHIFT",
            Self::TellerHasOpenShift { .. } => "TELLER_HAS_OPEN_SHIFT",
            Self::ShiftClosed(_) => "SHIFT_CLOSED",
            Self::LockTimeout { .. } => "LOCK_TIMEOUT",
            Self::VersionMismatch { .. } => "VERSION_MISMATCH",
            Self::InvariantViolation { .. } => "INVARIANT_VIOLATION",
            Self::Storage(_) => "STORAGE_ERROR",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn http_status_code(&self) -> u16 {
        match self.kind() {
            ErrorKind::Validation => 400,
            ErrorKind::NotFound => 404,
            ErrorKind::Conflict => 409,
            ErrorKind::InvariantViolation | ErrorKind::Internal => 500,
        }
    }
}

impl From<ShiftError> for AppError {
    fn from(err: ShiftError) -> Self {
        let message = err.to_string();
        match err.kind() {
            ErrorKind::Validation => Self::Validation(message),
            ErrorKind::NotFound => Self::NotFound(message),
            ErrorKind::Conflict => Self::Conflict(message),
            ErrorKind::InvariantViolation => Self::InvariantViolation(message),
            ErrorKind::Internal => Self::Storage(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    fn nil_shift() -> ShiftId {
        ShiftId::from_uuid(Uuid::nil())
    }

    #[rstest]
    #[case(ShiftError::NonPositiveAmount(dec!(0)), ErrorKind::Validation, 400)]
    #[case(ShiftError::LifecycleKindNotSubmittable(TransactionKind::Open), ErrorKind::Validation, 400)]
    #[case(
        ShiftError::BalanceOutOfRange { shift_id: nil_shift(), balance: dec!(1), amount: dec!(2) },
        ErrorKind::Validation,
        400
    )]
    #[case(ShiftError::ShiftNotFound(nil_shift()), ErrorKind::NotFound, 404)]
    #[case(ShiftError::ShiftClosed(nil_shift()), ErrorKind::Conflict, 409)]
    #[case(
        ShiftError::LockTimeout { key: "shift:x".into(), waited_ms: 10 },
        ErrorKind::Conflict,
        409
    )]
    #[case(
        ShiftError::InvariantViolation { shift_id: nil_shift(), detail: "x".into() },
        ErrorKind::InvariantViolation,
        500
    )]
    #[case(ShiftError::Storage("down".into()), ErrorKind::Internal, 500)]
    fn test_kind_and_status(
        #[case] err: ShiftError,
        #[case] kind: ErrorKind,
        #[case] status: u16,
    ) {
        assert_eq!(err.kind(), kind);
        assert_eq!(err.http_status_code(), status);
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(
            ShiftError::InsufficientFunds {
                shift_id: nil_shift(),
                balance: dec!(1000.00),
                requested: dec!(1500.00),
            }
            .error_code(),
            "INSUFFICIENT_FUNDS"
        );
        assert_eq!(
            ShiftError::DrawerHasOpenShift {
                drawer_code: "CAJA-01".into(),
                shift_id: nil_shift(),
            }
            .error_code(),
            "DRAWER_HAS_OPEN_SHIFT"
        );
    }

    #[test]
    fn test_mismatch_display_reports_both_amounts() {
        let err = ShiftError::ReconciliationMismatch {
            shift_id: nil_shift(),
            expected: dec!(1300.00),
            actual: dec!(1250.00),
        };
        assert_eq!(
            err.to_string(),
            format!(
                "Closing amount does not reconcile for shift {}: expected 1300.00, actual 1250.00",
                Uuid::nil()
            )
        );

        let err = ShiftError::DenominationMismatch {
            declared: dec!(500.00),
            computed: dec!(499.99),
        };
        assert_eq!(
            err.to_string(),
            "Declared amount 500.00 does not match denomination total 499.99"
        );
    }

    #[test]
    fn test_into_app_error() {
        let app: AppError = ShiftError::ShiftClosed(nil_shift()).into();
        assert_eq!(app.status_code(), 409);
        assert_eq!(app.error_code(), "CONFLICT");

        let app: AppError = ShiftError::ExcessPrecision(dec!(1.001)).into();
        assert_eq!(app.status_code(), 400);
    }
}
