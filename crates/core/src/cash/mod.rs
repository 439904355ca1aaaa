//! Cash transaction ledger.
//!
//! Cash movements are recorded independently of vouchers. A movement may
//! generate a linked draft voucher; matching against an external flow never
//! touches that voucher.

pub mod import;
pub mod types;

pub use import::{ImportDecision, ImportPlanner, ImportReport, ImportRowResult, ImportRowStatus};
pub use types::{
    CashAccount, CashDirection, CashService, CashTransaction, CashTransactionInput, MatchStatus,
};
