//! Audit event payloads.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use teller_shared::types::{ShiftId, ShiftTransactionId};

use crate::shift::{IntegrityWarning, TransactionKind};

/// Something the ledger did or found that an auditor may need to see.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum AuditEvent {
    /// A shift was opened.
    ShiftOpened {
        /// The shift.
        shift_id: ShiftId,
        /// Drawer code.
        drawer_code: String,
        /// Teller code.
        teller_code: String,
        /// Starting float.
        opening_amount: Decimal,
        /// When.
        at: DateTime<Utc>,
    },
    /// A deposit or withdrawal was recorded.
    TransactionRecorded {
        /// The shift.
        shift_id: ShiftId,
        /// The new transaction.
        transaction_id: ShiftTransactionId,
        /// DEPOSIT or WITHDRAWAL.
        kind: TransactionKind,
        /// Amount moved.
        amount: Decimal,
        /// Reconciled balance after the movement.
        balance_after: Decimal,
        /// When.
        at: DateTime<Utc>,
    },
    /// A shift was closed.
    ShiftClosed {
        /// The shift.
        shift_id: ShiftId,
        /// Declared closing cash.
        closing_amount: Decimal,
        /// Reconciled balance at close.
        expected_balance: Decimal,
        /// When.
        at: DateTime<Utc>,
    },
    /// A shift was closed under the lenient policy with unreconciled cash.
    ClosingDiscrepancy {
        /// The shift.
        shift_id: ShiftId,
        /// Reconciled balance.
        expected: Decimal,
        /// Declared closing cash.
        actual: Decimal,
        /// `actual - expected`.
        difference: Decimal,
        /// When.
        at: DateTime<Utc>,
    },
    /// A close was refused because the cash did not reconcile.
    CloseRejected {
        /// The shift.
        shift_id: ShiftId,
        /// Reconciled balance.
        expected: Decimal,
        /// Declared closing cash.
        actual: Decimal,
        /// When.
        at: DateTime<Utc>,
    },
    /// Reconciliation found a faulty log entry.
    IntegrityViolation {
        /// The shift.
        shift_id: ShiftId,
        /// The fault.
        warning: IntegrityWarning,
    },
}

impl AuditEvent {
    /// Shift the event is about.
    #[must_use]
    pub const fn shift_id(&self) -> ShiftId {
        match self {
            Self::ShiftOpened { shift_id, .. }
            | Self::TransactionRecorded { shift_id, .. }
            | Self::ShiftClosed { shift_id, .. }
            | Self::ClosingDiscrepancy { shift_id, .. }
            | Self::CloseRejected { shift_id, .. }
            | Self::IntegrityViolation { shift_id, .. } => *shift_id,
        }
    }

    /// Stable event name, matching the serialized `event` tag.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::ShiftOpened { .. } => "shift_opened",
            Self::TransactionRecorded { .. } => "transaction_recorded",
            Self::ShiftClosed { .. } => "shift_closed",
            Self::ClosingDiscrepancy { .. } => "closing_discrepancy",
            Self::CloseRejected { .. } => "close_rejected",
            Self::IntegrityViolation { .. } => "integrity_violation",
        }
    }

    /// Returns true for events that need human follow-up.
    #[must_use]
    pub const fn needs_attention(&self) -> bool {
        matches!(
            self,
            Self::ClosingDiscrepancy { .. } | Self::CloseRejected { .. } | Self::IntegrityViolation { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_serialized_tag_matches_name() {
        let event = AuditEvent::ClosingDiscrepancy {
            shift_id: ShiftId::new(),
            expected: dec!(1300.00),
            actual: dec!(1250.00),
            difference: dec!(-50.00),
            at: Utc::now(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], event.name());
        assert_eq!(json["expected"], "1300.00");
        assert_eq!(json["actual"], "1250.00");
        assert!(event.needs_attention());
    }

    #[test]
    fn test_routine_events_need_no_attention() {
        let event = AuditEvent::ShiftOpened {
            shift_id: ShiftId::new(),
            drawer_code: "CAJA-01".into(),
            teller_code: "CAJERO-07".into(),
            opening_amount: dec!(1000.00),
            at: Utc::now(),
        };
        assert!(!event.needs_attention());
    }
}
