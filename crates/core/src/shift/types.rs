//! Shift ledger domain types.
//!
//! A shift is one open-to-close working period for a drawer/teller pair. Its
//! balance is never stored; it is always derived from the transaction log.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use teller_shared::types::{ShiftId, ShiftTransactionId};

use super::error::ShiftError;

/// Banknote denominations accepted at the drawer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub enum Denomination {
    /// 1-unit bill.
    One,
    /// 5-unit bill.
    Five,
    /// 10-unit bill.
    Ten,
    /// 20-unit bill.
    Twenty,
    /// 50-unit bill.
    Fifty,
    /// 100-unit bill.
    Hundred,
}

impl Denomination {
    /// Every accepted denomination, smallest first.
    pub const ALL: [Self; 6] = [
        Self::One,
        Self::Five,
        Self::Ten,
        Self::Twenty,
        Self::Fifty,
        Self::Hundred,
    ];

    /// Face value of the bill.
    #[must_use]
    pub fn value(self) -> Decimal {
        match self {
            Self::One => Decimal::ONE,
            Self::Five => Decimal::from(5),
            Self::Ten => Decimal::TEN,
            Self::Twenty => Decimal::from(20),
            Self::Fifty => Decimal::from(50),
            Self::Hundred => Decimal::ONE_HUNDRED,
        }
    }
}

impl From<Denomination> for Decimal {
    fn from(denomination: Denomination) -> Self {
        denomination.value()
    }
}

impl TryFrom<Decimal> for Denomination {
    type Error = ShiftError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::ALL
            .into_iter()
            .find(|d| d.value() == value)
            .ok_or(ShiftError::InvalidDenomination(value))
    }
}

impl std::fmt::Display for Denomination {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.value())
    }
}

/// One (bill, count) pair of a transaction's cash breakdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DenominationLine {
    /// Bill value.
    pub denomination: Denomination,
    /// Number of bills.
    pub count: u32,
}

impl DenominationLine {
    /// Creates a new denomination line.
    #[must_use]
    pub const fn new(denomination: Denomination, count: u32) -> Self {
        Self {
            denomination,
            count,
        }
    }

    /// Bill value times count.
    #[must_use]
    pub fn sub_amount(&self) -> Decimal {
        self.denomination.value() * Decimal::from(self.count)
    }
}

/// Sums the sub-amounts of a set of denomination lines.
///
/// Saturates at `Decimal::MAX` rather than overflowing; such a total never
/// matches a valid declared amount.
#[must_use]
pub fn denomination_total(lines: &[DenominationLine]) -> Decimal {
    lines
        .iter()
        .map(DenominationLine::sub_amount)
        .fold(Decimal::ZERO, Decimal::saturating_add)
}

/// Kind of movement recorded against a shift.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionKind {
    /// Opening float (INICIO). Lifecycle-internal.
    Open,
    /// Cash received into the drawer (DEPOSITO).
    Deposit,
    /// Cash paid out of the drawer (AHORRO).
    Withdrawal,
    /// Counted closing cash (CIERRE). Lifecycle-internal.
    Close,
}

impl TransactionKind {
    /// Returns true for kinds only the shift lifecycle may produce.
    #[must_use]
    pub const fn is_lifecycle(self) -> bool {
        matches!(self, Self::Open | Self::Close)
    }

    /// Wire name of the kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Open => "OPEN",
            Self::Deposit => "DEPOSIT",
            Self::Withdrawal => "WITHDRAWAL",
            Self::Close => "CLOSE",
        }
    }
}

impl std::fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TransactionKind {
    type Err = String;

    /// Accepts both the English names and the branch-system names
    /// (`INICIO`, `DEPOSITO`, `AHORRO`, `CIERRE`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "OPEN" | "INICIO" => Ok(Self::Open),
            "DEPOSIT" | "DEPOSITO" => Ok(Self::Deposit),
            "WITHDRAWAL" | "AHORRO" => Ok(Self::Withdrawal),
            "CLOSE" | "CIERRE" => Ok(Self::Close),
            _ => Err(format!("Unknown transaction kind: {s}")),
        }
    }
}

/// Shift status. `Open -> Closed` is the only transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ShiftStatus {
    /// Accepting transactions.
    Open,
    /// Reconciled and terminal.
    Closed,
}

/// A cash-drawer shift: the aggregate root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shift {
    /// Generated shift identity.
    pub id: ShiftId,
    /// Drawer (caja) code.
    pub drawer_code: String,
    /// Teller (cajero) code.
    pub teller_code: String,
    /// Business date the shift belongs to.
    pub business_date: NaiveDate,
    /// When the shift was opened.
    pub opened_at: DateTime<Utc>,
    /// Starting float.
    pub opening_amount: Decimal,
    /// When the shift was closed.
    pub closed_at: Option<DateTime<Utc>>,
    /// Declared closing cash.
    pub closing_amount: Option<Decimal>,
    /// Current status.
    pub status: ShiftStatus,
}

impl Shift {
    /// Creates a freshly opened shift.
    #[must_use]
    pub fn open(
        drawer_code: String,
        teller_code: String,
        business_date: NaiveDate,
        opening_amount: Decimal,
        opened_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: ShiftId::new(),
            drawer_code,
            teller_code,
            business_date,
            opened_at,
            opening_amount,
            closed_at: None,
            closing_amount: None,
            status: ShiftStatus::Open,
        }
    }

    /// Returns true while the shift accepts transactions.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.status == ShiftStatus::Open
    }

    /// Returns the closed form of this shift.
    ///
    /// # Errors
    ///
    /// Returns `ShiftClosed` if the shift is already closed.
    pub fn close(&self, closing_amount: Decimal, closed_at: DateTime<Utc>) -> Result<Self, ShiftError> {
        if !self.is_open() {
            return Err(ShiftError::ShiftClosed(self.id));
        }
        Ok(Self {
            closed_at: Some(closed_at),
            closing_amount: Some(closing_amount),
            status: ShiftStatus::Closed,
            ..self.clone()
        })
    }
}

/// One immutable movement in a shift's transaction log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShiftTransaction {
    /// Generated transaction identity.
    pub id: ShiftTransactionId,
    /// The shift this transaction belongs to.
    pub shift_id: ShiftId,
    /// Kind of movement.
    pub kind: TransactionKind,
    /// Amount moved.
    pub amount: Decimal,
    /// 1-based position in the shift's log.
    pub sequence: u64,
    /// When the movement was recorded.
    pub occurred_at: DateTime<Utc>,
    /// Optional cash breakdown, audit only.
    pub denominations: Vec<DenominationLine>,
}

impl ShiftTransaction {
    /// Creates a new transaction with a generated id.
    #[must_use]
    pub fn new(
        shift_id: ShiftId,
        kind: TransactionKind,
        amount: Decimal,
        sequence: u64,
        occurred_at: DateTime<Utc>,
        denominations: Vec<DenominationLine>,
    ) -> Self {
        Self {
            id: ShiftTransactionId::new(),
            shift_id,
            kind,
            amount,
            sequence,
            occurred_at,
            denominations,
        }
    }
}

/// A stored record paired with its optimistic-concurrency version.
///
/// Every read returns the version; every update must present it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Versioned<T> {
    /// The record.
    pub record: T,
    /// Compare-and-swap token.
    pub version: u64,
}

impl<T> Versioned<T> {
    /// Wraps a record at the given version.
    #[must_use]
    pub const fn new(record: T, version: u64) -> Self {
        Self { record, version }
    }
}

/// Input for opening a shift.
#[derive(Debug, Clone)]
pub struct OpenShiftInput {
    /// Drawer code.
    pub drawer_code: String,
    /// Teller code.
    pub teller_code: String,
    /// Business date.
    pub business_date: NaiveDate,
    /// Starting float (must be positive).
    pub opening_amount: Decimal,
    /// Optional breakdown of the starting float.
    pub opening_denominations: Vec<DenominationLine>,
}

/// Input for recording a deposit or withdrawal.
#[derive(Debug, Clone)]
pub struct RecordTransactionInput {
    /// Target shift.
    pub shift_id: ShiftId,
    /// DEPOSIT or WITHDRAWAL.
    pub kind: TransactionKind,
    /// Amount (must be positive).
    pub amount: Decimal,
    /// Optional cash breakdown.
    pub denominations: Vec<DenominationLine>,
}

/// Input for closing a shift.
#[derive(Debug, Clone)]
pub struct CloseShiftInput {
    /// Target shift.
    pub shift_id: ShiftId,
    /// Counted closing cash (non-negative).
    pub closing_amount: Decimal,
    /// Optional breakdown of the counted cash.
    pub closing_denominations: Vec<DenominationLine>,
}
