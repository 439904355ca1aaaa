//! Vouchers: double-entry accounting documents and their lifecycle.
//!
//! - `types` - voucher, line and draft types
//! - `validation` - the double-entry invariant
//! - `workflow` - the status state machine
//! - `reversal` - red-flush (debit/credit swap) vouchers

pub mod reversal;
pub mod types;
pub mod validation;
pub mod workflow;

#[cfg(test)]
mod reversal_props;
#[cfg(test)]
mod validation_props;
#[cfg(test)]
mod workflow_props;

pub use reversal::ReversalService;
pub use types::{
    Voucher, VoucherAction, VoucherDraft, VoucherLine, VoucherLineInput, VoucherSource,
    VoucherStatus, VoucherTotals, format_voucher_no,
};
pub use validation::{has_rounding_drift, validate_draft, validate_lines};
pub use workflow::VoucherWorkflow;
