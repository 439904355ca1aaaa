//! Property-based tests for balance aggregation.

use proptest::prelude::*;
use rust_decimal::Decimal;

use super::balance::{aggregate_balances, merge_balances};
use super::balance::tests::entry;
use super::entry::LedgerEntry;
use crate::voucher::{ReversalService, VoucherLineInput};

fn arb_entry() -> impl Strategy<Value = LedgerEntry> {
    (
        prop_oneof![Just("1001"), Just("1002"), Just("2202"), Just("6001"), Just("6602")],
        (1i64..10_000_000i64).prop_map(|cents| Decimal::new(cents, 2)),
        any::<bool>(),
    )
        .prop_map(|(code, amount, is_debit)| {
            if is_debit {
                entry(code, amount, Decimal::ZERO)
            } else {
                entry(code, Decimal::ZERO, amount)
            }
        })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Each account's balance equals the signed sum of its entries.
    #[test]
    fn prop_balance_equals_signed_entry_sum(entries in prop::collection::vec(arb_entry(), 0..40)) {
        for balance in aggregate_balances(&entries) {
            let expected: Decimal = entries
                .iter()
                .filter(|e| e.account_code == balance.account_code)
                .map(LedgerEntry::signed_amount)
                .sum();
            prop_assert_eq!(balance.balance, expected);
        }
    }

    /// Aggregating in two halves and merging equals aggregating everything.
    #[test]
    fn prop_merge_is_split_invariant(
        entries in prop::collection::vec(arb_entry(), 0..40),
        split in any::<prop::sample::Index>(),
    ) {
        let at = if entries.is_empty() { 0 } else { split.index(entries.len()) };
        let (left, right) = entries.split_at(at);
        let left = aggregate_balances(left);
        let right = aggregate_balances(right);
        prop_assert_eq!(
            merge_balances([left.as_slice(), right.as_slice()]),
            aggregate_balances(&entries)
        );
    }

    /// Entries plus their red-flush leave every account at zero.
    #[test]
    fn prop_red_flush_zeroes_balances(entries in prop::collection::vec(arb_entry(), 1..20)) {
        let lines: Vec<VoucherLineInput> = entries
            .iter()
            .map(|e| VoucherLineInput {
                account_code: e.account_code.clone(),
                account_name: None,
                debit: e.debit,
                credit: e.credit,
                memo: None,
            })
            .collect();
        let mut combined = entries.clone();
        combined.extend(
            ReversalService::reverse_lines(&lines)
                .into_iter()
                .map(|l| entry(&l.account_code, l.debit, l.credit)),
        );
        for balance in aggregate_balances(&combined) {
            prop_assert!(balance.balance.is_zero());
        }
    }
}
