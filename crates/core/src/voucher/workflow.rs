//! Voucher status state machine.

use super::types::{VoucherAction, VoucherStatus};
use crate::error::{LedgerError, ValidationError};

/// Stateless service validating voucher status transitions.
///
/// Guards that need storage (period status, budget) are applied by the
/// caller inside the same transaction that writes the new status.
pub struct VoucherWorkflow;

impl VoucherWorkflow {
    /// Reject a draft or pending voucher.
    ///
    /// # Errors
    ///
    /// `MissingField("reason")` when the reason is blank, otherwise
    /// `InvalidTransition` for any other status.
    pub fn reject(current: VoucherStatus, reason: Option<&str>) -> Result<VoucherStatus, LedgerError> {
        if reason.is_none_or(|r| r.trim().is_empty()) {
            return Err(ValidationError::MissingField("reason").into());
        }
        Self::apply(current, VoucherAction::Reject)
    }

    /// Moves a voucher to a requested target status, as `PATCH /status` does.
    pub fn transition(
        current: VoucherStatus,
        target: VoucherStatus,
        reason: Option<&str>,
    ) -> Result<VoucherStatus, LedgerError> {
        match VoucherAction::for_target(target) {
            Some(VoucherAction::Reject) => Self::reject(current, reason),
            Some(action) => Self::apply(current, action),
            None => Err(ValidationError::InvalidTargetStatus(target).into()),
        }
    }

    /// The status an action leads to from `from`, if the action is allowed.
    #[must_use]
    pub const fn next_status(from: VoucherStatus, action: VoucherAction) -> Option<VoucherStatus> {
        use VoucherAction as A;
        use VoucherStatus as S;

        match (from, action) {
            (S::Draft, A::Submit) => Some(S::Pending),
            (S::Pending, A::Approve) => Some(S::Approved),
            (S::Draft | S::Approved, A::Post) => Some(S::Posted),
            (S::Draft | S::Pending, A::Reject) => Some(S::Rejected),
            (S::Draft | S::Posted, A::Void) => Some(S::Voided),
            (S::Posted, A::RedFlush) => Some(S::Posted),
            _ => None,
        }
    }

    /// Check if a status transition is valid.
    #[must_use]
    pub fn is_valid_transition(from: VoucherStatus, to: VoucherStatus) -> bool {
        VoucherAction::for_target(to)
            .and_then(|action| Self::next_status(from, action))
            .is_some_and(|next| next == to)
    }

    fn apply(current: VoucherStatus, action: VoucherAction) -> Result<VoucherStatus, LedgerError> {
        Self::next_status(current, action).ok_or(LedgerError::InvalidTransition {
            from: current,
            action,
        })
    }
}
