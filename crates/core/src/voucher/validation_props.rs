//! Property-based tests for the double-entry invariant.

use proptest::prelude::*;
use rust_decimal::Decimal;
use tally_shared::types::is_balanced;

use super::types::VoucherLineInput;
use super::validation::validate_lines;
use crate::error::ValidationError;

/// Amounts from 0.01 to 1,000,000.00.
fn positive_amount() -> impl Strategy<Value = Decimal> {
    (1i64..100_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

fn account_code() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("1001".to_string()),
        Just("1002".to_string()),
        Just("6001".to_string()),
        Just("6602".to_string()),
    ]
}

/// A balanced voucher: random debit legs plus credit legs splitting the same total.
fn balanced_lines() -> impl Strategy<Value = Vec<VoucherLineInput>> {
    (
        prop::collection::vec((account_code(), positive_amount()), 1..6),
        account_code(),
    )
        .prop_map(|(debits, credit_account)| {
            let total: Decimal = debits.iter().map(|(_, amount)| *amount).sum();
            let mut lines: Vec<VoucherLineInput> = debits
                .into_iter()
                .map(|(code, amount)| VoucherLineInput::debit(code, amount))
                .collect();
            lines.push(VoucherLineInput::credit(credit_account, total));
            lines
        })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Every accepted voucher has equal totals within tolerance.
    #[test]
    fn prop_accepted_vouchers_balance(lines in balanced_lines()) {
        let totals = validate_lines(&lines).unwrap();
        prop_assert!(is_balanced(totals.debit, totals.credit));
    }

    /// Skewing any balanced voucher by more than the tolerance is rejected.
    #[test]
    fn prop_skewed_vouchers_rejected(
        lines in balanced_lines(),
        skew in (2i64..1_000_000i64).prop_map(|cents| Decimal::new(cents, 2)),
    ) {
        let mut lines = lines;
        lines[0].debit += skew;
        let result = validate_lines(&lines);
        prop_assert!(
            matches!(result, Err(ValidationError::Unbalanced { .. })),
            "expected Unbalanced, got {:?}",
            result
        );
    }

    /// A negative amount anywhere is rejected with its line number.
    #[test]
    fn prop_negative_amount_rejected(
        lines in balanced_lines(),
        index in any::<prop::sample::Index>(),
    ) {
        let mut lines = lines;
        let i = index.index(lines.len());
        let line = &mut lines[i];
        if line.debit.is_zero() {
            line.credit = -line.credit;
        } else {
            line.debit = -line.debit;
        }
        let expected = u32::try_from(i + 1).unwrap();
        prop_assert_eq!(
            validate_lines(&lines),
            Err(ValidationError::NegativeAmount { line_no: expected })
        );
    }
}
