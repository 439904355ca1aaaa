//! The double-entry invariant.
//!
//! A voucher is accepted only when it has at least one line, every line is
//! one-sided with a non-negative amount and an account code, and total debit
//! equals total credit within [`BALANCE_TOLERANCE`].

use rust_decimal::Decimal;
use tally_shared::types::{BALANCE_TOLERANCE, is_balanced};

use super::types::{VoucherDraft, VoucherLineInput, VoucherTotals};
use crate::error::ValidationError;

/// Validates voucher lines and returns their totals.
///
/// # Errors
///
/// Returns the first violated rule, checking lines in order before the
/// balance.
pub fn validate_lines(lines: &[VoucherLineInput]) -> Result<VoucherTotals, ValidationError> {
    if lines.is_empty() {
        return Err(ValidationError::NoLines);
    }

    let mut totals = VoucherTotals::default();

    for (line_no, line) in (1u32..).zip(lines) {
        if line.account_code.trim().is_empty() {
            return Err(ValidationError::MissingAccountCode { line_no });
        }
        if line.debit < Decimal::ZERO || line.credit < Decimal::ZERO {
            return Err(ValidationError::NegativeAmount { line_no });
        }
        match (line.debit.is_zero(), line.credit.is_zero()) {
            (true, true) => return Err(ValidationError::ZeroLine { line_no }),
            (false, false) => return Err(ValidationError::BothSides { line_no }),
            _ => {}
        }

        totals.debit += line.debit;
        totals.credit += line.credit;
    }

    if !is_balanced(totals.debit, totals.credit) {
        return Err(ValidationError::Unbalanced {
            debit: totals.debit,
            credit: totals.credit,
        });
    }

    Ok(totals)
}

/// Validates a whole draft: lines, description and budget claim.
///
/// # Errors
///
/// See [`validate_lines`]; additionally rejects a blank description and a
/// negative budget amount.
pub fn validate_draft(draft: &VoucherDraft) -> Result<VoucherTotals, ValidationError> {
    if draft.description.trim().is_empty() {
        return Err(ValidationError::MissingField("description"));
    }
    if draft.budget_amount.is_some_and(|amount| amount < Decimal::ZERO) {
        return Err(ValidationError::InvalidAmount);
    }
    if draft
        .budget_category
        .as_deref()
        .is_some_and(|category| category.trim().is_empty())
    {
        return Err(ValidationError::MissingField("budget_category"));
    }
    validate_lines(&draft.lines)
}

/// Whether the difference between the totals is within tolerance but not
/// exactly zero; such vouchers are accepted and the drift is logged.
#[must_use]
pub fn has_rounding_drift(totals: VoucherTotals) -> bool {
    let diff = (totals.debit - totals.credit).abs();
    !diff.is_zero() && diff <= BALANCE_TOLERANCE
}
