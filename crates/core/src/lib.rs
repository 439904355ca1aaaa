//! Ledger and voucher domain logic for Tally.
//!
//! This crate contains pure business logic with ZERO web or database dependencies.
//! All domain types, invariants, and state machines live here; the `tally-db`
//! crate applies them inside database transactions.
//!
//! # Modules
//!
//! - `voucher` - Vouchers, the double-entry invariant, status workflow, red-flush
//! - `period` - Accounting period keys and lock guards
//! - `budget` - Budget check/occupy/release arithmetic
//! - `rules` - Event-to-voucher rule registry
//! - `ledger` - Ledger entries, balances, consolidation
//! - `cash` - Cash movements and import planning
//! - `error` - The `LedgerError` taxonomy

pub mod budget;
pub mod cash;
pub mod error;
pub mod ledger;
pub mod period;
pub mod rules;
pub mod voucher;

pub use error::{LedgerError, ValidationError};
