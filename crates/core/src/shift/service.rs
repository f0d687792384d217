//! Shift ledger service.
//!
//! Orchestrates the shift lifecycle: validates input, serializes work per
//! shift, reconciles against the stored log, persists through a
//! [`ShiftStore`] and reports through an [`AuditSink`].

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use teller_shared::types::{ShiftId, normalize_amount};
use teller_shared::{LedgerConfig, ReconciliationPolicy};
use tracing::{debug, info, warn};

use super::error::ShiftError;
use super::locks::{KeyedLocks, LockKey};
use super::reconciliation::{ClosingOutcome, Reconciliation, ReconciliationEngine};
use super::types::{
    CloseShiftInput, OpenShiftInput, RecordTransactionInput, Shift, ShiftTransaction,
    TransactionKind, Versioned,
};
use super::validation;
use crate::audit::{AuditEvent, AuditSink, TracingAuditSink};
use crate::clock::{Clock, SystemClock};
use crate::store::ShiftStore;

/// The shift ledger: lifecycle operations, transactions and reconciliation.
pub struct ShiftLedger<S> {
    store: S,
    audit: Arc<dyn AuditSink>,
    clock: Arc<dyn Clock>,
    locks: KeyedLocks,
    policy: ReconciliationPolicy,
}

impl<S: ShiftStore> ShiftLedger<S> {
    /// Creates a ledger over `store` using the wall clock and tracing audit sink.
    #[must_use]
    pub fn new(store: S, config: &LedgerConfig) -> Self {
        Self {
            store,
            audit: Arc::new(TracingAuditSink),
            clock: Arc::new(SystemClock),
            locks: KeyedLocks::new(config.lock_timeout()),
            policy: config.reconciliation_policy,
        }
    }

    /// Replaces the audit sink.
    #[must_use]
    pub fn with_audit_sink(mut self, audit: Arc<dyn AuditSink>) -> Self {
        self.audit = audit;
        self
    }

    /// Replaces the clock.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// The closing policy in force.
    #[must_use]
    pub const fn policy(&self) -> ReconciliationPolicy {
        self.policy
    }

    /// Opens a shift and records its OPEN transaction.
    ///
    /// Fails if either the drawer or the teller already has an open shift.
    ///
    /// # Errors
    ///
    /// `BlankCode`, `InvalidOpeningAmount`, `ExcessPrecision`,
    /// `AmountExceedsLimit`, `DenominationMismatch`, `DrawerHasOpenShift`,
    /// `TellerHasOpenShift`, `LockTimeout`, or a storage error.
    pub async fn open_shift(&self, input: OpenShiftInput) -> Result<Shift, ShiftError> {
        let drawer_code = input.drawer_code.trim().to_string();
        let teller_code = input.teller_code.trim().to_string();
        validation::validate_code("Drawer", &drawer_code)?;
        validation::validate_code("Teller", &teller_code)?;
        validation::validate_opening_amount(input.opening_amount)?;
        validation::validate_denominations(input.opening_amount, &input.opening_denominations)?;
        let opening_amount = normalize_amount(input.opening_amount);

        // Fixed order: drawer before teller.
        let _drawer = self.locks.acquire(LockKey::Drawer(drawer_code.clone())).await?;
        let _teller = self.locks.acquire(LockKey::Teller(teller_code.clone())).await?;

        let existing = self
            .store
            .find_open_shifts(Some(&drawer_code), Some(&teller_code))
            .await?;
        if let Some(open) = existing.iter().find(|s| s.record.drawer_code == drawer_code) {
            return Err(ShiftError::DrawerHasOpenShift {
                drawer_code,
                shift_id: open.record.id,
            });
        }
        if let Some(open) = existing.first() {
            return Err(ShiftError::TellerHasOpenShift {
                teller_code,
                shift_id: open.record.id,
            });
        }

        let now = self.clock.now();
        let shift = Shift::open(
            drawer_code,
            teller_code,
            input.business_date,
            opening_amount,
            now,
        );
        let opening = ShiftTransaction::new(
            shift.id,
            TransactionKind::Open,
            opening_amount,
            1,
            now,
            input.opening_denominations,
        );

        let created = self.store.create_shift(shift, opening).await?.record;

        info!(
            shift_id = %created.id,
            drawer_code = %created.drawer_code,
            teller_code = %created.teller_code,
            opening_amount = %created.opening_amount,
            "Shift opened"
        );
        self.audit.record(AuditEvent::ShiftOpened {
            shift_id: created.id,
            drawer_code: created.drawer_code.clone(),
            teller_code: created.teller_code.clone(),
            opening_amount: created.opening_amount,
            at: now,
        });

        Ok(created)
    }

    /// Records a DEPOSIT or WITHDRAWAL against an open shift.
    ///
    /// Withdrawals are checked against the latest committed balance while
    /// the shift lock is held, so concurrent withdrawals cannot overdraw.
    ///
    /// # Errors
    ///
    /// `LifecycleKindNotSubmittable`, `NonPositiveAmount`, `ExcessPrecision`,
    /// `AmountExceedsLimit`, `DenominationMismatch`, `ShiftNotFound`,
    /// `ShiftClosed`, `InsufficientFunds`, `BalanceOutOfRange`, `LockTimeout`,
    /// or a storage error.
    pub async fn record_transaction(
        &self,
        input: RecordTransactionInput,
    ) -> Result<ShiftTransaction, ShiftError> {
        validation::validate_submission(input.kind, input.amount)?;
        validation::validate_denominations(input.amount, &input.denominations)?;
        let amount = normalize_amount(input.amount);

        let _guard = self.locks.acquire(LockKey::Shift(input.shift_id)).await?;

        let shift = self.load_shift(input.shift_id).await?.record;
        if !shift.is_open() {
            return Err(ShiftError::ShiftClosed(shift.id));
        }

        let transactions = self.store.list_transactions(shift.id).await?;
        let reconciliation = self.reconcile_log(&shift, &transactions);
        let balance = reconciliation.expected_balance;

        let balance_after =
            ReconciliationEngine::balance_after(shift.id, balance, input.kind, amount)?;

        let transaction = ShiftTransaction::new(
            shift.id,
            input.kind,
            amount,
            next_sequence(&transactions),
            self.next_timestamp(&transactions),
            input.denominations,
        );
        let stored = self.store.append_transaction(transaction).await?;

        debug!(
            shift_id = %shift.id,
            transaction_id = %stored.id,
            kind = %stored.kind,
            amount = %stored.amount,
            balance_after = %balance_after,
            "Transaction recorded"
        );
        self.audit.record(AuditEvent::TransactionRecorded {
            shift_id: shift.id,
            transaction_id: stored.id,
            kind: stored.kind,
            amount: stored.amount,
            balance_after,
            at: stored.occurred_at,
        });

        Ok(stored)
    }

    /// Closes a shift after reconciling the declared cash.
    ///
    /// Under the strict policy a mismatch rejects the close; under the
    /// lenient policy the shift closes and a `ClosingDiscrepancy` is audited.
    ///
    /// # Errors
    ///
    /// `NegativeClosingAmount`, `ExcessPrecision`, `AmountExceedsLimit`,
    /// `DenominationMismatch`, `ShiftNotFound`, `ShiftClosed`,
    /// `ReconciliationMismatch`, `InvariantViolation`, `VersionMismatch`,
    /// `LockTimeout`, or a storage error.
    pub async fn close_shift(&self, input: CloseShiftInput) -> Result<Shift, ShiftError> {
        validation::validate_closing_amount(input.closing_amount)?;
        validation::validate_denominations(input.closing_amount, &input.closing_denominations)?;
        let closing_amount = normalize_amount(input.closing_amount);

        let _guard = self.locks.acquire(LockKey::Shift(input.shift_id)).await?;

        let Versioned { record: shift, version } = self.load_shift(input.shift_id).await?;
        if !shift.is_open() {
            return Err(ShiftError::ShiftClosed(shift.id));
        }

        let transactions = self.store.list_transactions(shift.id).await?;
        let reconciliation = self.reconcile_log(&shift, &transactions);
        let now = self.next_timestamp(&transactions);

        match ReconciliationEngine::check_closing(&reconciliation, closing_amount, self.policy) {
            Ok(ClosingOutcome::Balanced) => {}
            Ok(ClosingOutcome::Discrepancy {
                expected,
                actual,
                difference,
            }) => {
                warn!(
                    shift_id = %shift.id,
                    expected = %expected,
                    actual = %actual,
                    difference = %difference,
                    "Closing shift with unreconciled cash"
                );
                self.audit.record(AuditEvent::ClosingDiscrepancy {
                    shift_id: shift.id,
                    expected,
                    actual,
                    difference,
                    at: now,
                });
            }
            Err(err) => {
                if let ShiftError::ReconciliationMismatch { expected, actual, .. } = &err {
                    self.audit.record(AuditEvent::CloseRejected {
                        shift_id: shift.id,
                        expected: *expected,
                        actual: *actual,
                        at: now,
                    });
                }
                return Err(err);
            }
        }

        let closed = shift.close(closing_amount, now)?;
        let closing = ShiftTransaction::new(
            shift.id,
            TransactionKind::Close,
            closing_amount,
            next_sequence(&transactions),
            now,
            input.closing_denominations,
        );
        let updated = self.store.update_shift(closed, version, closing).await?.record;

        info!(
            shift_id = %updated.id,
            closing_amount = %closing_amount,
            expected_balance = %reconciliation.expected_balance,
            "Shift closed"
        );
        self.audit.record(AuditEvent::ShiftClosed {
            shift_id: updated.id,
            closing_amount,
            expected_balance: reconciliation.expected_balance,
            at: now,
        });

        Ok(updated)
    }

    /// Expected cash balance of a shift, derived from its log.
    ///
    /// # Errors
    ///
    /// `ShiftNotFound` or a storage error.
    pub async fn reconcile_balance(&self, shift_id: ShiftId) -> Result<Decimal, ShiftError> {
        Ok(self.reconcile(shift_id).await?.expected_balance)
    }

    /// Full reconciliation report for a shift.
    ///
    /// Integrity faults do not fail the read; they are listed in the report,
    /// logged and audited.
    ///
    /// # Errors
    ///
    /// `ShiftNotFound` or a storage error.
    pub async fn reconcile(&self, shift_id: ShiftId) -> Result<Reconciliation, ShiftError> {
        let shift = self.load_shift(shift_id).await?.record;
        let transactions = self.store.list_transactions(shift_id).await?;
        Ok(self.reconcile_log(&shift, &transactions))
    }

    /// Reads a shift.
    ///
    /// # Errors
    ///
    /// `ShiftNotFound` or a storage error.
    pub async fn get_shift(&self, shift_id: ShiftId) -> Result<Shift, ShiftError> {
        Ok(self.load_shift(shift_id).await?.record)
    }

    /// Open shifts for the drawer OR the teller; all open shifts if neither
    /// is given.
    ///
    /// # Errors
    ///
    /// Storage errors only.
    pub async fn find_open_shifts(
        &self,
        drawer_code: Option<&str>,
        teller_code: Option<&str>,
    ) -> Result<Vec<Shift>, ShiftError> {
        let shifts = self
            .store
            .find_open_shifts(drawer_code.map(str::trim), teller_code.map(str::trim))
            .await?;
        Ok(shifts.into_iter().map(|s| s.record).collect())
    }

    /// A shift's transactions in log order, optionally of one kind.
    ///
    /// # Errors
    ///
    /// `ShiftNotFound` or a storage error.
    pub async fn list_transactions(
        &self,
        shift_id: ShiftId,
        kind: Option<TransactionKind>,
    ) -> Result<Vec<ShiftTransaction>, ShiftError> {
        self.load_shift(shift_id).await?;
        let mut transactions = self.store.list_transactions(shift_id).await?;
        if let Some(kind) = kind {
            transactions.retain(|tx| tx.kind == kind);
        }
        Ok(transactions)
    }

    #[cfg(test)]
    pub(crate) const fn locks_for_test(&self) -> &KeyedLocks {
        &self.locks
    }

    async fn load_shift(&self, shift_id: ShiftId) -> Result<Versioned<Shift>, ShiftError> {
        self.store
            .get_shift(shift_id)
            .await?
            .ok_or(ShiftError::ShiftNotFound(shift_id))
    }

    fn reconcile_log(&self, shift: &Shift, transactions: &[ShiftTransaction]) -> Reconciliation {
        let reconciliation = ReconciliationEngine::reconcile(shift, transactions);
        for warning in &reconciliation.warnings {
            warn!(
                shift_id = %shift.id,
                transaction_id = ?warning.transaction_id,
                fault = ?warning.fault,
                excluded = warning.excluded,
                "Integrity fault in shift transaction log"
            );
            self.audit.record(AuditEvent::IntegrityViolation {
                shift_id: shift.id,
                warning: warning.clone(),
            });
        }
        reconciliation
    }

    /// Never earlier than the last entry, so time order and sequence agree.
    fn next_timestamp(&self, transactions: &[ShiftTransaction]) -> DateTime<Utc> {
        let now = self.clock.now();
        transactions
            .iter()
            .map(|tx| tx.occurred_at)
            .max()
            .map_or(now, |last| last.max(now))
    }
}

fn next_sequence(transactions: &[ShiftTransaction]) -> u64 {
    transactions.iter().map(|tx| tx.sequence).max().unwrap_or(0) + 1
}
