//! Common types used across the application.

pub mod id;
pub mod money;

pub use id::*;
pub use money::{
    CURRENCY_SCALE, MAX_AMOUNT, MAX_TOTAL, checked_total_add, checked_total_sub,
    has_currency_precision, normalize_amount, within_amount_limit,
};
