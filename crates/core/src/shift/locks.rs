//! Per-key async locks with bounded waits.
//!
//! Each shift, drawer and teller is its own lock; work on different keys
//! never contends. Entries are dropped from the registry once nobody holds
//! or waits on them.

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use teller_shared::types::ShiftId;
use tokio::sync::{Mutex, OwnedMutexGuard};

use super::error::ShiftError;

/// Something a ledger operation serializes on.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LockKey {
    /// An existing shift.
    Shift(ShiftId),
    /// A drawer, while deciding whether it may open a shift.
    Drawer(String),
    /// A teller, while deciding whether they may open a shift.
    Teller(String),
}

impl std::fmt::Display for LockKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Shift(id) => write!(f, "shift:{id}"),
            Self::Drawer(code) => write!(f, "drawer:{code}"),
            Self::Teller(code) => write!(f, "teller:{code}"),
        }
    }
}

/// Registry of per-key mutexes.
#[derive(Debug)]
pub struct KeyedLocks {
    locks: DashMap<LockKey, Arc<Mutex<()>>>,
    timeout: Duration,
}

/// Held lock; released (and pruned from the registry if idle) on drop.
#[derive(Debug)]
pub struct KeyGuard<'a> {
    registry: &'a KeyedLocks,
    key: LockKey,
    guard: Option<OwnedMutexGuard<()>>,
}

impl KeyedLocks {
    /// Creates a registry whose acquisitions wait at most `timeout`.
    #[must_use]
    pub fn new(timeout: Duration) -> Self {
        Self {
            locks: DashMap::new(),
            timeout,
        }
    }

    /// Acquires the lock for `key`.
    ///
    /// # Errors
    ///
    /// Returns `LockTimeout` if the lock is not free within the timeout.
    pub async fn acquire(&self, key: LockKey) -> Result<KeyGuard<'_>, ShiftError> {
        // Clone the Arc out so no map shard stays locked across the await.
        let mutex = Arc::clone(self.locks.entry(key.clone()).or_default().value());

        match tokio::time::timeout(self.timeout, mutex.lock_owned()).await {
            Ok(guard) => Ok(KeyGuard {
                registry: self,
                key,
                guard: Some(guard),
            }),
            Err(_) => {
                self.prune(&key);
                Err(ShiftError::LockTimeout {
                    key: key.to_string(),
                    waited_ms: u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX),
                })
            }
        }
    }

    /// Number of keys currently tracked.
    #[must_use]
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    /// Returns true if no key is tracked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }

    fn prune(&self, key: &LockKey) {
        self.locks
            .remove_if(key, |_, mutex| Arc::strong_count(mutex) == 1);
    }
}

impl Drop for KeyGuard<'_> {
    fn drop(&mut self) {
        drop(self.guard.take());
        self.registry.prune(&self.key);
    }
}
