//! Teller shift ledger.
//!
//! This module implements the cash-drawer shift lifecycle:
//! - Shift and transaction records, denominations
//! - Input validation (amounts, precision, denomination breakdowns)
//! - Reconciliation of a shift's log into an expected balance
//! - Per-key async locking for shifts, drawers and tellers
//! - The `ShiftLedger` service tying it together

pub mod error;
pub mod locks;
pub mod reconciliation;
pub mod service;
pub mod types;
pub mod validation;

#[cfg(test)]
mod service_props;

pub use error::{ErrorKind, ShiftError};
pub use locks::{KeyGuard, KeyedLocks, LockKey};
pub use reconciliation::{
    ClosingOutcome, IntegrityFault, IntegrityWarning, Reconciliation, ReconciliationEngine,
};
pub use service::ShiftLedger;
pub use types::{
    CloseShiftInput, Denomination, DenominationLine, OpenShiftInput, RecordTransactionInput,
    Shift, ShiftStatus, ShiftTransaction, TransactionKind, Versioned, denomination_total,
};
