//! Shared types, errors, and configuration for the teller shift ledger.
//!
//! This crate provides common types used across all other crates:
//! - Typed IDs for shifts and shift transactions
//! - Currency-precision helpers for cash amounts
//! - Application-wide error types
//! - Configuration management

pub mod config;
pub mod error;
pub mod types;

pub use config::{AppConfig, LedgerConfig, LoggingConfig, ReconciliationPolicy};
pub use error::{AppError, AppResult};
