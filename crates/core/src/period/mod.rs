//! Accounting periods.
//!
//! A period is a natural calendar month identified by a [`PeriodKey`]
//! (`YYYY-MM`). Periods are created lazily the first time anything touches
//! them and can be closed to lock every voucher dated inside.

pub mod guard;
pub mod key;
pub mod types;

pub use guard::{PeriodChange, PeriodGuard, PeriodStatus};
pub use key::PeriodKey;
pub use types::Period;
