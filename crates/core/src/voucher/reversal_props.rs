//! Property-based tests for red-flush vouchers.

use std::collections::BTreeMap;

use proptest::prelude::*;
use rust_decimal::Decimal;

use super::reversal::ReversalService;
use super::types::VoucherLineInput;
use super::validation::validate_lines;

fn arb_line() -> impl Strategy<Value = VoucherLineInput> {
    (
        prop_oneof![Just("1001"), Just("1002"), Just("2202"), Just("6602")],
        (1i64..10_000_000i64).prop_map(|cents| Decimal::new(cents, 2)),
        any::<bool>(),
    )
        .prop_map(|(code, amount, is_debit)| {
            if is_debit {
                VoucherLineInput::debit(code, amount)
            } else {
                VoucherLineInput::credit(code, amount)
            }
        })
}

fn net_by_account(lines: &[VoucherLineInput]) -> BTreeMap<String, Decimal> {
    let mut net = BTreeMap::new();
    for line in lines {
        *net.entry(line.account_code.clone()).or_insert(Decimal::ZERO) += line.debit - line.credit;
    }
    net
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Original plus reversal nets to zero in every account.
    #[test]
    fn prop_reversal_nets_to_zero(lines in prop::collection::vec(arb_line(), 1..8)) {
        let reversal = ReversalService::reverse_lines(&lines);
        let mut combined = lines.clone();
        combined.extend(reversal);
        for (account, net) in net_by_account(&combined) {
            prop_assert!(net.is_zero(), "account {} nets to {}", account, net);
        }
    }

    /// Reversing twice gives back the original amounts.
    #[test]
    fn prop_reversal_is_an_involution(lines in prop::collection::vec(arb_line(), 1..8)) {
        let twice = ReversalService::reverse_lines(&ReversalService::reverse_lines(&lines));
        for (original, back) in lines.iter().zip(&twice) {
            prop_assert_eq!(original.debit, back.debit);
            prop_assert_eq!(original.credit, back.credit);
        }
    }

    /// The reversal of a balanced voucher is balanced with the totals swapped.
    #[test]
    fn prop_reversal_of_balanced_is_balanced(
        amounts in prop::collection::vec((1i64..1_000_000i64).prop_map(|c| Decimal::new(c, 2)), 1..5)
    ) {
        let total: Decimal = amounts.iter().copied().sum();
        let mut lines: Vec<VoucherLineInput> =
            amounts.into_iter().map(|a| VoucherLineInput::debit("6602", a)).collect();
        lines.push(VoucherLineInput::credit("1001", total));

        let original = validate_lines(&lines).unwrap();
        let reversed = validate_lines(&ReversalService::reverse_lines(&lines)).unwrap();
        prop_assert_eq!(original.debit, reversed.credit);
        prop_assert_eq!(original.credit, reversed.debit);
    }
}
