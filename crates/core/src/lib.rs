//! Core business logic for the teller shift ledger.
//!
//! This crate contains the shift engine with ZERO web or database dependencies.
//! Persistence, auditing and time are injected through small traits.
//!
//! # Modules
//!
//! - `shift` - Shift lifecycle, transactions and reconciliation
//! - `store` - Storage port and the in-memory store
//! - `audit` - Structured audit events and sinks
//! - `clock` - Injectable time source

pub mod audit;
pub mod clock;
pub mod shift;
pub mod store;

pub use shift::{ShiftError, ShiftLedger};
pub use store::{InMemoryShiftStore, ShiftStore};
