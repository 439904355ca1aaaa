//! Repository abstractions for data access.
//!
//! Repositories provide a clean interface for database operations,
//! hiding the `SeaORM` implementation details from the rest of the application.
//! Every mutating method runs in a single database transaction and is
//! retried on concurrency conflicts.

pub mod budget;
pub mod cash;
pub mod consolidation;
pub mod event;
pub mod ledger;
pub mod period;
pub mod voucher;

pub use budget::{BudgetRepository, UpsertBudgetInput};
pub use cash::{CashFilter, CashRepository};
pub use consolidation::{ConsolidationRepository, ConsolidationRequest};
pub use event::{EventRepository, IngestOutcome};
pub use ledger::LedgerRepository;
pub use period::PeriodRepository;
pub use voucher::{RedFlushOutcome, VoucherFilter, VoucherRepository};
