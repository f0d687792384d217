//! Storage port for shifts and their transaction logs.
//!
//! The engine needs only a handful of operations from persistence, so any
//! backend (relational, document, in-memory) can implement [`ShiftStore`].
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                       ShiftStore                             │
//! ├──────────────────────────────────────────────────────────────┤
//! │ create_shift(shift, OPEN tx)     │ get_shift(id)             │
//! │ update_shift(shift, ver, CLOSE)  │ list_transactions(id)     │
//! │ append_transaction(tx)           │ find_open_shifts(d, t)    │
//! └──────────────────────────────────────────────────────────────┘
//! ```

mod error;
mod memory;

pub use error::StoreError;
pub use memory::InMemoryShiftStore;

use async_trait::async_trait;
use teller_shared::types::ShiftId;

use crate::shift::{Shift, ShiftTransaction, Versioned};

/// Persistence operations required by the shift ledger.
#[async_trait]
pub trait ShiftStore: Send + Sync {
    /// Inserts a new shift together with its OPEN transaction, atomically.
    async fn create_shift(
        &self,
        shift: Shift,
        opening: ShiftTransaction,
    ) -> Result<Versioned<Shift>, StoreError>;

    /// Reads a shift and its current version.
    async fn get_shift(&self, id: ShiftId) -> Result<Option<Versioned<Shift>>, StoreError>;

    /// Replaces a shift if its stored version still equals `expected_version`,
    /// appending the CLOSE transaction in the same unit of work.
    async fn update_shift(
        &self,
        shift: Shift,
        expected_version: u64,
        closing: ShiftTransaction,
    ) -> Result<Versioned<Shift>, StoreError>;

    /// Appends a transaction to its shift's log.
    async fn append_transaction(
        &self,
        transaction: ShiftTransaction,
    ) -> Result<ShiftTransaction, StoreError>;

    /// Lists a shift's transactions in log order.
    async fn list_transactions(&self, shift_id: ShiftId)
    -> Result<Vec<ShiftTransaction>, StoreError>;

    /// Finds open shifts for the drawer OR the teller.
    ///
    /// With both filters absent every open shift is returned.
    async fn find_open_shifts(
        &self,
        drawer_code: Option<&str>,
        teller_code: Option<&str>,
    ) -> Result<Vec<Versioned<Shift>>, StoreError>;
}
