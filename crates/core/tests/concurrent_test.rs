//! Concurrent access stress tests for shift transactions.
//!
//! These tests verify that:
//! - Concurrent withdrawals never drive a drawer below zero
//! - Concurrent deposits all land, with gap-free sequence numbers
//! - Racing opens on one drawer admit exactly one shift
//! - A shift held past the lock timeout fails fast with a conflict

#![allow(clippy::uninlined_format_args)]
#![allow(clippy::cast_possible_wrap)]

use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use futures::future::join_all;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use teller_core::shift::{
    ErrorKind, KeyedLocks, LockKey, OpenShiftInput, RecordTransactionInput, TransactionKind,
};
use teller_core::{InMemoryShiftStore, ShiftError, ShiftLedger};
use teller_shared::{LedgerConfig, ReconciliationPolicy};
use tokio::sync::Barrier;

fn ledger(lock_timeout_ms: u64) -> Arc<ShiftLedger<InMemoryShiftStore>> {
    let config = LedgerConfig {
        lock_timeout_ms,
        reconciliation_policy: ReconciliationPolicy::Strict,
    };
    Arc::new(ShiftLedger::new(InMemoryShiftStore::new(), &config))
}

fn open_input(drawer: &str, teller: &str, amount: Decimal) -> OpenShiftInput {
    OpenShiftInput {
        drawer_code: drawer.to_string(),
        teller_code: teller.to_string(),
        business_date: NaiveDate::from_ymd_opt(2025, 6, 2).unwrap(),
        opening_amount: amount,
        opening_denominations: vec![],
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_withdrawals_never_overdraw() {
    let ledger = ledger(5_000);
    let shift = ledger
        .open_shift(open_input("CAJA-01", "CAJERO-07", dec!(1000.00)))
        .await
        .unwrap();

    const NUM_WITHDRAWALS: usize = 50;
    let amount = dec!(30.00);
    let shift_id = shift.id;
    let barrier = Arc::new(Barrier::new(NUM_WITHDRAWALS));

    let mut handles = Vec::with_capacity(NUM_WITHDRAWALS);
    for _ in 0..NUM_WITHDRAWALS {
        let ledger = Arc::clone(&ledger);
        let barrier = Arc::clone(&barrier);
        handles.push(tokio::spawn(async move {
            barrier.wait().await;
            ledger
                .record_transaction(RecordTransactionInput {
                    shift_id,
                    kind: TransactionKind::Withdrawal,
                    amount,
                    denominations: vec![],
                })
                .await
        }));
    }

    let mut accepted = 0i64;
    for result in join_all(handles).await {
        match result.unwrap() {
            Ok(_) => accepted += 1,
            Err(ShiftError::InsufficientFunds { .. }) => {}
            Err(e) => panic!("unexpected error: {}", e),
        }
    }

    // floor(1000 / 30) = 33 withdrawals fit
    assert_eq!(accepted, 33);
    let balance = ledger.reconcile_balance(shift.id).await.unwrap();
    assert_eq!(balance, dec!(1000.00) - amount * Decimal::from(accepted));
    assert!(balance >= Decimal::ZERO);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_deposits_get_unique_sequences() {
    let ledger = ledger(5_000);
    let shift = ledger
        .open_shift(open_input("CAJA-01", "CAJERO-07", dec!(10.00)))
        .await
        .unwrap();

    const NUM_DEPOSITS: usize = 100;
    let shift_id = shift.id;
    let barrier = Arc::new(Barrier::new(NUM_DEPOSITS));

    let handles: Vec<_> = (0..NUM_DEPOSITS)
        .map(|_| {
            let ledger = Arc::clone(&ledger);
            let barrier = Arc::clone(&barrier);
            tokio::spawn(async move {
                barrier.wait().await;
                ledger
                    .record_transaction(RecordTransactionInput {
                        shift_id,
                        kind: TransactionKind::Deposit,
                        amount: dec!(1.50),
                        denominations: vec![],
                    })
                    .await
            })
        })
        .collect();

    for result in join_all(handles).await {
        result.unwrap().unwrap();
    }

    let log = ledger.list_transactions(shift.id, None).await.unwrap();
    let sequences: Vec<u64> = log.iter().map(|t| t.sequence).collect();
    let expected: Vec<u64> = (1..=NUM_DEPOSITS as u64 + 1).collect();
    assert_eq!(sequences, expected);

    let report = ledger.reconcile(shift.id).await.unwrap();
    assert!(report.is_clean(), "warnings: {:?}", report.warnings);
    assert_eq!(report.expected_balance, dec!(160.00));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_racing_opens_admit_one_shift_per_drawer() {
    let ledger = ledger(5_000);

    const NUM_TELLERS: usize = 20;
    let barrier = Arc::new(Barrier::new(NUM_TELLERS));

    let handles: Vec<_> = (0..NUM_TELLERS)
        .map(|i| {
            let ledger = Arc::clone(&ledger);
            let barrier = Arc::clone(&barrier);
            tokio::spawn(async move {
                barrier.wait().await;
                ledger
                    .open_shift(open_input("CAJA-01", &format!("CAJERO-{:02}", i), dec!(100)))
                    .await
            })
        })
        .collect();

    let mut opened = 0;
    for result in join_all(handles).await {
        match result.unwrap() {
            Ok(_) => opened += 1,
            Err(e) => assert!(matches!(e, ShiftError::DrawerHasOpenShift { .. })),
        }
    }

    assert_eq!(opened, 1);
    assert_eq!(
        ledger
            .find_open_shifts(Some("CAJA-01"), None)
            .await
            .unwrap()
            .len(),
        1
    );
}

#[tokio::test]
async fn test_lock_timeout_is_a_conflict() {
    let locks = KeyedLocks::new(Duration::from_millis(25));
    let key = LockKey::Drawer("CAJA-01".to_string());

    let held = locks.acquire(key.clone()).await.unwrap();
    let err = locks.acquire(key.clone()).await.unwrap_err();
    assert!(matches!(err, ShiftError::LockTimeout { waited_ms: 25, .. }));
    assert_eq!(err.kind(), ErrorKind::Conflict);

    drop(held);
    assert!(locks.acquire(key).await.is_ok());
}
