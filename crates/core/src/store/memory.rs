//! In-memory `ShiftStore` for tests and local runs.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use teller_shared::types::ShiftId;
use tokio::sync::RwLock;

use super::{ShiftStore, StoreError};
use crate::shift::{Shift, ShiftTransaction, Versioned};

#[derive(Debug, Default)]
struct Inner {
    shifts: HashMap<ShiftId, Versioned<Shift>>,
    transactions: HashMap<ShiftId, Vec<ShiftTransaction>>,
    open_by_drawer: HashMap<String, ShiftId>,
    open_by_teller: HashMap<String, ShiftId>,
}

impl Inner {
    fn index_open(&mut self, shift: &Shift) {
        if shift.is_open() {
            self.open_by_drawer.insert(shift.drawer_code.clone(), shift.id);
            self.open_by_teller.insert(shift.teller_code.clone(), shift.id);
        } else {
            self.open_by_drawer.retain(|_, id| *id != shift.id);
            self.open_by_teller.retain(|_, id| *id != shift.id);
        }
    }

    fn push_transaction(&mut self, transaction: ShiftTransaction) -> Result<(), StoreError> {
        let log = self.transactions.entry(transaction.shift_id).or_default();
        if log.iter().any(|tx| tx.id == transaction.id) {
            return Err(StoreError::DuplicateTransaction(transaction.id));
        }
        log.push(transaction);
        log.sort_by_key(|tx| tx.sequence);
        Ok(())
    }
}

/// Thread-safe in-memory shift store.
///
/// Keeps a secondary index of open shifts by drawer and by teller.
#[derive(Debug, Clone, Default)]
pub struct InMemoryShiftStore {
    inner: Arc<RwLock<Inner>>,
}

impl InMemoryShiftStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a transaction without any check, bypassing the engine.
    ///
    /// Used to simulate a corrupted log in tests.
    #[cfg(any(test, feature = "test-util"))]
    pub async fn insert_raw_transaction(&self, transaction: ShiftTransaction) {
        let mut inner = self.inner.write().await;
        inner
            .transactions
            .entry(transaction.shift_id)
            .or_default()
            .push(transaction);
    }
}

#[async_trait]
impl ShiftStore for InMemoryShiftStore {
    async fn create_shift(
        &self,
        shift: Shift,
        opening: ShiftTransaction,
    ) -> Result<Versioned<Shift>, StoreError> {
        let mut inner = self.inner.write().await;
        if inner.shifts.contains_key(&shift.id) {
            return Err(StoreError::DuplicateShift(shift.id));
        }
        if opening.shift_id != shift.id {
            return Err(StoreError::backend(format!(
                "opening transaction {} does not belong to shift {}",
                opening.id, shift.id
            )));
        }

        let versioned = Versioned::new(shift, 1);
        inner.index_open(&versioned.record);
        inner.shifts.insert(versioned.record.id, versioned.clone());
        inner.push_transaction(opening)?;
        Ok(versioned)
    }

    async fn get_shift(&self, id: ShiftId) -> Result<Option<Versioned<Shift>>, StoreError> {
        Ok(self.inner.read().await.shifts.get(&id).cloned())
    }

    async fn update_shift(
        &self,
        shift: Shift,
        expected_version: u64,
        closing: ShiftTransaction,
    ) -> Result<Versioned<Shift>, StoreError> {
        let mut inner = self.inner.write().await;
        let current = inner
            .shifts
            .get(&shift.id)
            .ok_or(StoreError::ShiftNotFound(shift.id))?;
        if current.version != expected_version {
            return Err(StoreError::VersionMismatch {
                shift_id: shift.id,
                expected: expected_version,
                actual: current.version,
            });
        }

        let versioned = Versioned::new(shift, expected_version + 1);
        inner.push_transaction(closing)?;
        inner.index_open(&versioned.record);
        inner.shifts.insert(versioned.record.id, versioned.clone());
        Ok(versioned)
    }

    async fn append_transaction(
        &self,
        transaction: ShiftTransaction,
    ) -> Result<ShiftTransaction, StoreError> {
        let mut inner = self.inner.write().await;
        if !inner.shifts.contains_key(&transaction.shift_id) {
            return Err(StoreError::ShiftNotFound(transaction.shift_id));
        }
        inner.push_transaction(transaction.clone())?;
        Ok(transaction)
    }

    async fn list_transactions(
        &self,
        shift_id: ShiftId,
    ) -> Result<Vec<ShiftTransaction>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner.transactions.get(&shift_id).cloned().unwrap_or_default())
    }

    async fn find_open_shifts(
        &self,
        drawer_code: Option<&str>,
        teller_code: Option<&str>,
    ) -> Result<Vec<Versioned<Shift>>, StoreError> {
        let inner = self.inner.read().await;

        let ids: BTreeSet<ShiftId> = if drawer_code.is_none() && teller_code.is_none() {
            inner.open_by_drawer.values().copied().collect()
        } else {
            drawer_code
                .and_then(|code| inner.open_by_drawer.get(code))
                .into_iter()
                .chain(teller_code.and_then(|code| inner.open_by_teller.get(code)))
                .copied()
                .collect()
        };

        let mut shifts: Vec<Versioned<Shift>> = ids
            .into_iter()
            .filter_map(|id| inner.shifts.get(&id).cloned())
            .collect();
        shifts.sort_by_key(|s| s.record.opened_at);
        Ok(shifts)
    }
}
