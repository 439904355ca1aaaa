//! Property-based tests for the voucher state machine.

use proptest::prelude::*;

use super::types::{VoucherAction, VoucherStatus};
use super::workflow::VoucherWorkflow;
use crate::error::LedgerError;

fn arb_status() -> impl Strategy<Value = VoucherStatus> {
    prop::sample::select(VoucherStatus::ALL.to_vec())
}

fn arb_action() -> impl Strategy<Value = VoucherAction> {
    prop_oneof![
        Just(VoucherAction::Submit),
        Just(VoucherAction::Approve),
        Just(VoucherAction::Post),
        Just(VoucherAction::Reject),
        Just(VoucherAction::Void),
        Just(VoucherAction::RedFlush),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Terminal statuses accept no action at all.
    #[test]
    fn prop_terminal_statuses_are_final(action in arb_action()) {
        for status in [VoucherStatus::Rejected, VoucherStatus::Voided] {
            prop_assert!(VoucherWorkflow::next_status(status, action).is_none());
        }
    }

    /// A failed transition names the status it was attempted from.
    #[test]
    fn prop_failures_report_current_status(from in arb_status(), to in arb_status()) {
        match VoucherWorkflow::transition(from, to, Some("because")) {
            Ok(next) => {
                prop_assert_eq!(next, to);
                prop_assert!(VoucherWorkflow::is_valid_transition(from, to));
            }
            Err(LedgerError::InvalidTransition { from: reported, .. }) => {
                prop_assert_eq!(reported, from);
                prop_assert!(!VoucherWorkflow::is_valid_transition(from, to));
            }
            Err(LedgerError::Validation(_)) => prop_assert_eq!(to, VoucherStatus::Draft),
            Err(other) => prop_assert!(false, "unexpected error {other:?}"),
        }
    }

    /// Nothing ever leads back to draft.
    #[test]
    fn prop_no_path_back_to_draft(from in arb_status(), action in arb_action()) {
        prop_assert_ne!(VoucherWorkflow::next_status(from, action), Some(VoucherStatus::Draft));
    }

    /// Once posted, a voucher can only be voided or red-flushed.
    #[test]
    fn prop_posted_only_voids_or_reverses(action in arb_action()) {
        let next = VoucherWorkflow::next_status(VoucherStatus::Posted, action);
        match action {
            VoucherAction::Void => prop_assert_eq!(next, Some(VoucherStatus::Voided)),
            VoucherAction::RedFlush => prop_assert_eq!(next, Some(VoucherStatus::Posted)),
            _ => prop_assert!(next.is_none()),
        }
    }
}
