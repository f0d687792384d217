//! Property-based tests for ShiftLedger.
//!
//! - Balance: expected balance equals opening + deposits - accepted withdrawals
//! - Non-negativity: no sequence of withdrawals drives the drawer below zero
//! - Closing: only the exact expected balance closes a strict shift
//! - Denominations: a breakdown that does not sum to the amount is rejected

use chrono::NaiveDate;
use proptest::prelude::*;
use rust_decimal::Decimal;
use teller_shared::{LedgerConfig, ReconciliationPolicy};

use super::error::ShiftError;
use super::service::ShiftLedger;
use super::types::{
    CloseShiftInput, Denomination, DenominationLine, OpenShiftInput, RecordTransactionInput,
    ShiftStatus, TransactionKind, denomination_total,
};
use crate::store::InMemoryShiftStore;

/// Strategy to generate positive decimal amounts (0.01 to 10,000.00).
fn positive_amount() -> impl Strategy<Value = Decimal> {
    (1i64..1_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

/// Strategy to generate a submittable transaction kind.
fn movement_kind() -> impl Strategy<Value = TransactionKind> {
    prop_oneof![
        Just(TransactionKind::Deposit),
        Just(TransactionKind::Withdrawal)
    ]
}

/// Strategy to generate a non-empty denomination breakdown.
fn breakdown() -> impl Strategy<Value = Vec<DenominationLine>> {
    prop::collection::vec(
        (prop::sample::select(Denomination::ALL.to_vec()), 1u32..50),
        1..6,
    )
    .prop_map(|lines| {
        lines
            .into_iter()
            .map(|(d, count)| DenominationLine::new(d, count))
            .collect()
    })
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
}

fn ledger() -> ShiftLedger<InMemoryShiftStore> {
    let config = LedgerConfig {
        lock_timeout_ms: 1_000,
        reconciliation_policy: ReconciliationPolicy::Strict,
    };
    ShiftLedger::new(InMemoryShiftStore::new(), &config)
}

fn open_input(amount: Decimal) -> OpenShiftInput {
    OpenShiftInput {
        drawer_code: "CAJA-01".to_string(),
        teller_code: "CAJERO-07".to_string(),
        business_date: NaiveDate::from_ymd_opt(2025, 3, 14).unwrap(),
        opening_amount: amount,
        opening_denominations: vec![],
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// *For any* sequence of movements, the reconciled balance equals the
    /// opening float plus accepted deposits minus accepted withdrawals, and
    /// a withdrawal is rejected exactly when it exceeds the running balance.
    #[test]
    fn prop_balance_matches_accepted_movements(
        opening in positive_amount(),
        movements in prop::collection::vec((movement_kind(), positive_amount()), 0..25),
    ) {
        let rt = runtime();
        rt.block_on(async {
            let ledger = ledger();
            let shift = ledger.open_shift(open_input(opening)).await.unwrap();

            let mut model = opening;
            for (kind, amount) in movements {
                let result = ledger
                    .record_transaction(RecordTransactionInput {
                        shift_id: shift.id,
                        kind,
                        amount,
                        denominations: vec![],
                    })
                    .await;

                match kind {
                    TransactionKind::Withdrawal if amount > model => {
                        let rejected = matches!(result, Err(ShiftError::InsufficientFunds { .. }));
                        prop_assert!(rejected);
                    }
                    TransactionKind::Withdrawal => {
                        prop_assert!(result.is_ok());
                        model -= amount;
                    }
                    _ => {
                        prop_assert!(result.is_ok());
                        model += amount;
                    }
                }
                prop_assert!(model >= Decimal::ZERO);
            }

            let report = ledger.reconcile(shift.id).await.unwrap();
            prop_assert_eq!(report.expected_balance, model);
            prop_assert_eq!(
                report.expected_balance,
                report.opening_amount + report.total_deposits - report.total_withdrawals
            );
            prop_assert!(report.is_clean());
            Ok(())
        })?;
    }

    /// *For any* closing amount other than the expected balance, a strict
    /// close fails and leaves the shift open; the exact amount closes it.
    #[test]
    fn prop_strict_close_requires_exact_balance(
        opening in positive_amount(),
        deposit in positive_amount(),
        offset in 1i64..100_000i64,
    ) {
        let rt = runtime();
        rt.block_on(async {
            let ledger = ledger();
            let shift = ledger.open_shift(open_input(opening)).await.unwrap();
            ledger
                .record_transaction(RecordTransactionInput {
                    shift_id: shift.id,
                    kind: TransactionKind::Deposit,
                    amount: deposit,
                    denominations: vec![],
                })
                .await
                .unwrap();

            let expected = opening + deposit;
            let wrong = expected + Decimal::new(offset, 2);
            let result = ledger
                .close_shift(CloseShiftInput {
                    shift_id: shift.id,
                    closing_amount: wrong,
                    closing_denominations: vec![],
                })
                .await;
            let mismatch = matches!(result, Err(ShiftError::ReconciliationMismatch { .. }));
            prop_assert!(mismatch);
            prop_assert_eq!(ledger.get_shift(shift.id).await.unwrap().status, ShiftStatus::Open);

            let closed = ledger
                .close_shift(CloseShiftInput {
                    shift_id: shift.id,
                    closing_amount: expected,
                    closing_denominations: vec![],
                })
                .await
                .unwrap();
            prop_assert_eq!(closed.status, ShiftStatus::Closed);
            Ok(())
        })?;
    }

    /// *For any* breakdown, a declared amount that differs from its total is
    /// rejected, and the exact total is accepted.
    #[test]
    fn prop_denomination_total_must_match(
        lines in breakdown(),
        skew in 1i64..10_000i64,
    ) {
        let rt = runtime();
        rt.block_on(async {
            let ledger = ledger();
            let total = denomination_total(&lines);

            let mut bad = open_input(total + Decimal::new(skew, 2));
            bad.opening_denominations.clone_from(&lines);
            let result = ledger.open_shift(bad).await;
            let mismatch = matches!(result, Err(ShiftError::DenominationMismatch { .. }));
            prop_assert!(mismatch);

            let mut good = open_input(total);
            good.opening_denominations = lines;
            prop_assert!(ledger.open_shift(good).await.is_ok());
            Ok(())
        })?;
    }
}

#[cfg(test)]
mod unit_tests {
    use super::*;
    use rust_decimal_macros::dec;

    /// Worked example: 1000 + 500 in five hundreds - 200 = 1300.
    #[test]
    fn test_worked_example_balance() {
        runtime().block_on(async {
            let ledger = ledger();
            let shift = ledger.open_shift(open_input(dec!(1000.00))).await.unwrap();
            ledger
                .record_transaction(RecordTransactionInput {
                    shift_id: shift.id,
                    kind: TransactionKind::Deposit,
                    amount: dec!(500.00),
                    denominations: vec![DenominationLine::new(Denomination::Hundred, 5)],
                })
                .await
                .unwrap();
            ledger
                .record_transaction(RecordTransactionInput {
                    shift_id: shift.id,
                    kind: TransactionKind::Withdrawal,
                    amount: dec!(200.00),
                    denominations: vec![],
                })
                .await
                .unwrap();

            assert_eq!(
                ledger.reconcile_balance(shift.id).await.unwrap(),
                dec!(1300.00)
            );
        });
    }
}
