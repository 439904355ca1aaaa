//! Red-flush: reversing a posted voucher with a mirror voucher.
//!
//! The original stays `posted` and is linked to its reversal; the reversal
//! is posted with every leg's debit and credit swapped, so the two net to
//! zero in every account.

use chrono::NaiveDate;

use super::types::{Voucher, VoucherAction, VoucherDraft, VoucherLineInput, VoucherSource};
use super::workflow::VoucherWorkflow;
use crate::error::LedgerError;

/// Stateless service for building red-flush vouchers.
pub struct ReversalService;

impl ReversalService {
    /// Checks that `original` can be red-flushed.
    ///
    /// # Errors
    ///
    /// - `InvalidTransition` if the voucher is not posted, or is itself a
    ///   reversal
    /// - `AlreadyReversed` if a reversal has already been recorded
    pub fn ensure_reversible(original: &Voucher) -> Result<(), LedgerError> {
        if VoucherWorkflow::next_status(original.status, VoucherAction::RedFlush).is_none()
            || original.reverses_voucher_id.is_some()
        {
            return Err(LedgerError::InvalidTransition {
                from: original.status,
                action: VoucherAction::RedFlush,
            });
        }
        if let Some(reversed_by) = original.reversed_by_voucher_id {
            return Err(LedgerError::AlreadyReversed {
                voucher_id: original.id.into_inner(),
                reversed_by: reversed_by.into_inner(),
            });
        }
        Ok(())
    }

    /// Checks that voiding `voucher` would not break a red-flush pair.
    ///
    /// Either leg of a reversed pair stays posted for good: voiding one of
    /// them would leave the other's amounts on the books unmatched.
    ///
    /// # Errors
    ///
    /// - `AlreadyReversed` if the voucher has been red-flushed
    /// - `InvalidTransition` if the voucher is itself a reversal
    pub fn ensure_voidable(voucher: &Voucher) -> Result<(), LedgerError> {
        if let Some(reversed_by) = voucher.reversed_by_voucher_id {
            return Err(LedgerError::AlreadyReversed {
                voucher_id: voucher.id.into_inner(),
                reversed_by: reversed_by.into_inner(),
            });
        }
        if voucher.reverses_voucher_id.is_some() {
            return Err(LedgerError::InvalidTransition {
                from: voucher.status,
                action: VoucherAction::Void,
            });
        }
        Ok(())
    }

    /// Swaps debit and credit on every line, keeping order and accounts.
    #[must_use]
    pub fn reverse_lines(lines: &[VoucherLineInput]) -> Vec<VoucherLineInput> {
        lines
            .iter()
            .map(|line| VoucherLineInput {
                account_code: line.account_code.clone(),
                account_name: line.account_name.clone(),
                debit: line.credit,
                credit: line.debit,
                memo: Some(match &line.memo {
                    Some(memo) => format!("Red-flush: {memo}"),
                    None => "Red-flush".to_string(),
                }),
            })
            .collect()
    }

    /// Builds the reversal draft for `original`.
    ///
    /// The reversal is dated `business_date`, or the original's date when
    /// none is given, and carries no budget claim; the original's
    /// occupation is released instead.
    pub fn build_reversal(
        original: &Voucher,
        business_date: Option<NaiveDate>,
        reason: Option<&str>,
    ) -> Result<VoucherDraft, LedgerError> {
        Self::ensure_reversible(original)?;

        let lines: Vec<VoucherLineInput> = original.lines.iter().map(VoucherLineInput::from).collect();
        let description = match reason.map(str::trim).filter(|r| !r.is_empty()) {
            Some(reason) => format!("Red-flush of {}: {reason}", original.voucher_no),
            None => format!("Red-flush of {}", original.voucher_no),
        };

        Ok(VoucherDraft {
            entity_id: original.entity_id,
            business_date: business_date.unwrap_or(original.business_date),
            description,
            lines: Self::reverse_lines(&lines),
            attachments: original.attachments.clone(),
            source: VoucherSource::RedFlush,
            budget_category: None,
            budget_amount: None,
        })
    }
}
