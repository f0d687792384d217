//! Teller Shift Simulator
//!
//! Drives one teller's day through the shift ledger against the in-memory
//! store: open, deposits and withdrawals, a miscounted close, then the
//! correct close.

use anyhow::Context;
use chrono::Utc;
use rust_decimal_macros::dec;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use teller_core::shift::{
    CloseShiftInput, Denomination, DenominationLine, OpenShiftInput, RecordTransactionInput,
    TransactionKind,
};
use teller_core::{InMemoryShiftStore, ShiftLedger};
use teller_shared::{AppConfig, AppError, LoggingConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let config = AppConfig::load().context("failed to load configuration")?;
    init_tracing(&config.logging);

    info!(
        policy = ?config.ledger.reconciliation_policy,
        lock_timeout_ms = config.ledger.lock_timeout_ms,
        "Starting teller simulator"
    );

    let ledger = ShiftLedger::new(InMemoryShiftStore::new(), &config.ledger);

    let shift = ledger
        .open_shift(OpenShiftInput {
            drawer_code: "CAJA-01".to_string(),
            teller_code: "CAJERO-07".to_string(),
            business_date: Utc::now().date_naive(),
            opening_amount: dec!(1000.00),
            opening_denominations: vec![
                DenominationLine::new(Denomination::Hundred, 8),
                DenominationLine::new(Denomination::Fifty, 3),
                DenominationLine::new(Denomination::Twenty, 2),
                DenominationLine::new(Denomination::Ten, 1),
            ],
        })
        .await?;

    let movements = [
        (
            TransactionKind::Deposit,
            dec!(500.00),
            vec![DenominationLine::new(Denomination::Hundred, 5)],
        ),
        (TransactionKind::Withdrawal, dec!(200.00), vec![]),
        (TransactionKind::Withdrawal, dec!(1500.00), vec![]),
        (
            TransactionKind::Deposit,
            dec!(35.00),
            vec![
                DenominationLine::new(Denomination::Twenty, 1),
                DenominationLine::new(Denomination::Five, 3),
            ],
        ),
    ];
    for (kind, amount, denominations) in movements {
        let result = ledger
            .record_transaction(RecordTransactionInput {
                shift_id: shift.id,
                kind,
                amount,
                denominations,
            })
            .await;
        if let Err(err) = result {
            report_rejection("record_transaction", err.into());
        }
    }

    let report = ledger.reconcile(shift.id).await?;
    info!(
        shift_id = %shift.id,
        expected_balance = %report.expected_balance,
        deposits = %report.total_deposits,
        withdrawals = %report.total_withdrawals,
        counted = report.transactions_counted,
        "Reconciled shift"
    );

    // Miscounted drawer: short by 50
    let short = report.expected_balance - dec!(50.00);
    if let Err(err) = ledger
        .close_shift(CloseShiftInput {
            shift_id: shift.id,
            closing_amount: short,
            closing_denominations: vec![],
        })
        .await
    {
        report_rejection("close_shift", err.into());
    }

    let closed = ledger
        .close_shift(CloseShiftInput {
            shift_id: shift.id,
            closing_amount: report.expected_balance,
            closing_denominations: vec![],
        })
        .await?;

    info!(
        shift_id = %closed.id,
        closing_amount = ?closed.closing_amount,
        status = ?closed.status,
        "Simulation complete"
    );

    Ok(())
}

fn init_tracing(logging: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.filter));

    tracing_subscriber::registry()
        .with(filter)
        .with(logging.json.then(|| fmt::layer().json()))
        .with((!logging.json).then(fmt::layer))
        .init();
}

fn report_rejection(operation: &str, err: AppError) {
    warn!(
        operation,
        code = err.error_code(),
        status = err.status_code(),
        error = %err,
        "Request rejected"
    );
}
