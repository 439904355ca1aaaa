//! Ledger read side: entries, balances and consolidation.
//!
//! Sign convention: every balance is `debit_total - credit_total`, for every
//! account and every report. Debit-normal accounts (assets, expenses) come
//! out positive, credit-normal accounts (liabilities, revenue) negative.

pub mod balance;
pub mod consolidation;
pub mod entry;

#[cfg(test)]
mod balance_props;

pub use balance::{AccountBalance, aggregate_balances, merge_balances, signed_amount};
pub use consolidation::{ConsolidatedReport, ConsolidationService, EntityBalances, GroupBy};
pub use entry::{LedgerEntry, LedgerFilter, LedgerQuery};
