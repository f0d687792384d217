//! Reconciliation engine.
//!
//! Derives a shift's expected cash balance from its transaction log and
//! validates withdrawals and closes against it. Everything here is pure: the
//! same shift and log always produce the same report.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use teller_shared::ReconciliationPolicy;
use teller_shared::types::{
    ShiftId, ShiftTransactionId, checked_total_add, checked_total_sub, within_amount_limit,
};

use super::error::ShiftError;
use super::types::{Shift, ShiftStatus, ShiftTransaction, TransactionKind};

/// A data-integrity fault found in a shift's transaction log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "fault", rename_all = "snake_case")]
pub enum IntegrityFault {
    /// Transaction is filed under another shift.
    ForeignShift {
        /// Shift the transaction claims to belong to.
        found: ShiftId,
    },
    /// DEPOSIT or WITHDRAWAL with a zero or negative amount.
    NonPositiveAmount {
        /// Recorded amount.
        amount: Decimal,
    },
    /// DEPOSIT or WITHDRAWAL that would push a running total past the
    /// range kept exact at cent precision.
    AmountOutOfRange {
        /// Recorded amount.
        amount: Decimal,
    },
    /// OPEN transaction that is not the first entry of the log.
    UnexpectedOpen,
    /// The log has no OPEN transaction at position 1.
    MissingOpen,
    /// OPEN amount disagrees with the shift's opening amount.
    OpeningAmountMismatch {
        /// Amount on the OPEN transaction.
        recorded: Decimal,
        /// Amount on the shift record.
        expected: Decimal,
    },
    /// CLOSE transaction on a shift that is still open, or a second CLOSE.
    UnexpectedClose,
    /// Timestamp earlier than the preceding entry's.
    OutOfOrder {
        /// Timestamp of the preceding entry.
        previous: DateTime<Utc>,
        /// Timestamp of this entry.
        found: DateTime<Utc>,
    },
}

/// One integrity fault, tied to the offending entry when there is one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IntegrityWarning {
    /// Offending transaction.
    pub transaction_id: Option<ShiftTransactionId>,
    /// Its position in the log.
    pub sequence: Option<u64>,
    /// What is wrong.
    pub fault: IntegrityFault,
    /// Whether the entry was left out of the balance.
    pub excluded: bool,
}

impl IntegrityWarning {
    fn for_transaction(tx: &ShiftTransaction, fault: IntegrityFault, excluded: bool) -> Self {
        Self {
            transaction_id: Some(tx.id),
            sequence: Some(tx.sequence),
            fault,
            excluded,
        }
    }
}

/// Result of reconciling a shift's log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Reconciliation {
    /// The shift.
    pub shift_id: ShiftId,
    /// Starting float.
    pub opening_amount: Decimal,
    /// Sum of counted deposits.
    pub total_deposits: Decimal,
    /// Sum of counted withdrawals.
    pub total_withdrawals: Decimal,
    /// Opening + deposits - withdrawals.
    pub expected_balance: Decimal,
    /// Number of DEPOSIT/WITHDRAWAL entries that went into the balance.
    pub transactions_counted: usize,
    /// Integrity faults found along the way.
    pub warnings: Vec<IntegrityWarning>,
}

impl Reconciliation {
    /// Returns true if no integrity fault was found.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }

    /// Declared amount minus expected balance.
    #[must_use]
    pub fn difference(&self, actual: Decimal) -> Decimal {
        actual.saturating_sub(self.expected_balance)
    }
}

/// Outcome of checking a closing amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClosingOutcome {
    /// Declared cash matches the reconciled balance.
    Balanced,
    /// Declared cash differs and the lenient policy let it through.
    Discrepancy {
        /// Engine-derived balance.
        expected: Decimal,
        /// Declared closing cash.
        actual: Decimal,
        /// `actual - expected`.
        difference: Decimal,
    },
}

/// Stateless reconciliation functions.
pub struct ReconciliationEngine;

impl ReconciliationEngine {
    /// Reconciles a shift against its transaction log.
    ///
    /// Entries are taken in sequence order. OPEN and CLOSE entries never
    /// touch the balance; DEPOSIT adds and WITHDRAWAL subtracts. Faulty
    /// entries are reported in `warnings`, and excluded when they would
    /// otherwise move the balance.
    #[must_use]
    pub fn reconcile(shift: &Shift, transactions: &[ShiftTransaction]) -> Reconciliation {
        let mut ordered: Vec<&ShiftTransaction> = transactions.iter().collect();
        ordered.sort_by_key(|tx| tx.sequence);

        let mut total_deposits = Decimal::ZERO;
        let mut total_withdrawals = Decimal::ZERO;
        let mut balance = shift.opening_amount;
        let mut transactions_counted = 0;
        let mut warnings = Vec::new();
        let mut previous_at: Option<DateTime<Utc>> = None;
        let mut seen_close = false;

        if ordered.first().is_none_or(|tx| tx.kind != TransactionKind::Open) {
            warnings.push(IntegrityWarning {
                transaction_id: None,
                sequence: None,
                fault: IntegrityFault::MissingOpen,
                excluded: false,
            });
        }

        for (index, tx) in ordered.into_iter().enumerate() {
            if let Some(previous) = previous_at
                && tx.occurred_at < previous
            {
                warnings.push(IntegrityWarning::for_transaction(
                    tx,
                    IntegrityFault::OutOfOrder {
                        previous,
                        found: tx.occurred_at,
                    },
                    false,
                ));
            }
            previous_at = Some(tx.occurred_at);

            if tx.shift_id != shift.id {
                warnings.push(IntegrityWarning::for_transaction(
                    tx,
                    IntegrityFault::ForeignShift { found: tx.shift_id },
                    true,
                ));
                continue;
            }

            match tx.kind {
                TransactionKind::Open => {
                    if index != 0 {
                        warnings.push(IntegrityWarning::for_transaction(
                            tx,
                            IntegrityFault::UnexpectedOpen,
                            false,
                        ));
                    } else if tx.amount != shift.opening_amount {
                        warnings.push(IntegrityWarning::for_transaction(
                            tx,
                            IntegrityFault::OpeningAmountMismatch {
                                recorded: tx.amount,
                                expected: shift.opening_amount,
                            },
                            false,
                        ));
                    }
                }
                TransactionKind::Close => {
                    if shift.status == ShiftStatus::Open || seen_close {
                        warnings.push(IntegrityWarning::for_transaction(
                            tx,
                            IntegrityFault::UnexpectedClose,
                            false,
                        ));
                    }
                    seen_close = true;
                }
                TransactionKind::Deposit | TransactionKind::Withdrawal
                    if tx.amount <= Decimal::ZERO =>
                {
                    warnings.push(IntegrityWarning::for_transaction(
                        tx,
                        IntegrityFault::NonPositiveAmount { amount: tx.amount },
                        true,
                    ));
                }
                TransactionKind::Deposit | TransactionKind::Withdrawal => {
                    let applied = if tx.kind == TransactionKind::Deposit {
                        checked_total_add(total_deposits, tx.amount)
                            .zip(checked_total_add(balance, tx.amount))
                            .map(|(deposits, balance)| (deposits, total_withdrawals, balance))
                    } else {
                        checked_total_add(total_withdrawals, tx.amount)
                            .zip(checked_total_sub(balance, tx.amount))
                            .map(|(withdrawals, balance)| (total_deposits, withdrawals, balance))
                    };
                    match applied {
                        Some((deposits, withdrawals, next)) => {
                            total_deposits = deposits;
                            total_withdrawals = withdrawals;
                            balance = next;
                            transactions_counted += 1;
                        }
                        None => warnings.push(IntegrityWarning::for_transaction(
                            tx,
                            IntegrityFault::AmountOutOfRange { amount: tx.amount },
                            true,
                        )),
                    }
                }
            }
        }

        Reconciliation {
            shift_id: shift.id,
            opening_amount: shift.opening_amount,
            total_deposits,
            total_withdrawals,
            expected_balance: balance,
            transactions_counted,
            warnings,
        }
    }

    /// Checks that a withdrawal leaves the balance non-negative.
    ///
    /// # Errors
    ///
    /// Returns `InsufficientFunds` if `balance < amount`.
    pub fn check_withdrawal(
        shift_id: ShiftId,
        balance: Decimal,
        amount: Decimal,
    ) -> Result<(), ShiftError> {
        if balance < amount {
            return Err(ShiftError::InsufficientFunds {
                shift_id,
                balance,
                requested: amount,
            });
        }
        Ok(())
    }

    /// Balance after applying a DEPOSIT or WITHDRAWAL to `balance`.
    ///
    /// Lifecycle kinds leave the balance unchanged.
    ///
    /// # Errors
    ///
    /// Returns `InsufficientFunds` for an overdrawing withdrawal, and
    /// `BalanceOutOfRange` if the result would exceed `MAX_AMOUNT` or could not
    /// be represented exactly.
    pub fn balance_after(
        shift_id: ShiftId,
        balance: Decimal,
        kind: TransactionKind,
        amount: Decimal,
    ) -> Result<Decimal, ShiftError> {
        let next = match kind {
            TransactionKind::Deposit => balance.checked_add(amount),
            TransactionKind::Withdrawal => {
                Self::check_withdrawal(shift_id, balance, amount)?;
                balance.checked_sub(amount)
            }
            TransactionKind::Open | TransactionKind::Close => Some(balance),
        };
        next.filter(|b| within_amount_limit(*b))
            .ok_or(ShiftError::BalanceOutOfRange {
                shift_id,
                balance,
                amount,
            })
    }

    /// Checks a declared closing amount against a reconciliation.
    ///
    /// # Errors
    ///
    /// Returns `InvariantViolation` if the log has integrity faults (the
    /// expected balance is only best-effort), and `ReconciliationMismatch`
    /// under the strict policy when the amounts differ.
    pub fn check_closing(
        reconciliation: &Reconciliation,
        closing_amount: Decimal,
        policy: ReconciliationPolicy,
    ) -> Result<ClosingOutcome, ShiftError> {
        if !reconciliation.is_clean() {
            return Err(ShiftError::InvariantViolation {
                shift_id: reconciliation.shift_id,
                detail: format!(
                    "{} integrity fault(s) in transaction log, refusing to close",
                    reconciliation.warnings.len()
                ),
            });
        }

        let expected = reconciliation.expected_balance;
        if closing_amount == expected {
            return Ok(ClosingOutcome::Balanced);
        }

        match policy {
            ReconciliationPolicy::Strict => Err(ShiftError::ReconciliationMismatch {
                shift_id: reconciliation.shift_id,
                expected,
                actual: closing_amount,
            }),
            ReconciliationPolicy::Lenient => Ok(ClosingOutcome::Discrepancy {
                expected,
                actual: closing_amount,
                difference: reconciliation.difference(closing_amount),
            }),
        }
    }
}
