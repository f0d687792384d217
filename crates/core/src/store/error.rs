//! Storage error types.

use teller_shared::types::{ShiftId, ShiftTransactionId};
use thiserror::Error;

use crate::shift::ShiftError;

/// Storage operation errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Shift not found in storage.
    #[error("shift not found: {0}")]
    ShiftNotFound(ShiftId),

    /// A shift with this id already exists.
    #[error("shift already exists: {0}")]
    DuplicateShift(ShiftId),

    /// A transaction with this id already exists.
    #[error("transaction already exists: {0}")]
    DuplicateTransaction(ShiftTransactionId),

    /// Compare-and-swap failed.
    #[error("version mismatch for shift {shift_id}: expected {expected}, found {actual}")]
    VersionMismatch {
        /// The shift.
        shift_id: ShiftId,
        /// Version presented by the writer.
        expected: u64,
        /// Version currently stored.
        actual: u64,
    },

    /// Backend failure.
    #[error("storage backend error: {0}")]
    Backend(String),
}

impl StoreError {
    /// Create a backend error.
    #[must_use]
    pub fn backend(msg: impl Into<String>) -> Self {
        Self::Backend(msg.into())
    }
}

impl From<StoreError> for ShiftError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::ShiftNotFound(id) => Self::ShiftNotFound(id),
            StoreError::VersionMismatch {
                shift_id,
                expected,
                actual,
            } => Self::VersionMismatch {
                shift_id,
                expected,
                actual,
            },
            other => Self::Storage(other.to_string()),
        }
    }
}
