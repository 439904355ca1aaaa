//! Amount helpers with decimal precision.
//!
//! CRITICAL: Never use floating-point for money calculations.
//! Every amount in the ledger is a `rust_decimal::Decimal`.

use rust_decimal::{Decimal, RoundingStrategy};

/// Largest debit/credit difference still accepted as balanced (0.01 currency unit).
pub const BALANCE_TOLERANCE: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

/// Number of decimal places amounts are rounded to before they are stored.
pub const AMOUNT_SCALE: u32 = 2;

/// Returns true if the debit and credit totals match within [`BALANCE_TOLERANCE`].
#[must_use]
pub fn is_balanced(debit: Decimal, credit: Decimal) -> bool {
    (debit - credit).abs() <= BALANCE_TOLERANCE
}

/// Rounds an amount to [`AMOUNT_SCALE`] places, half away from zero.
#[must_use]
pub fn round_amount(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(AMOUNT_SCALE, RoundingStrategy::MidpointAwayFromZero)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    #[test]
    fn test_tolerance_is_one_cent() {
        assert_eq!(BALANCE_TOLERANCE, dec!(0.01));
    }

    #[rstest]
    #[case(dec!(100), dec!(100), true)]
    #[case(dec!(100.00), dec!(99.99), true)]
    #[case(dec!(99.99), dec!(100.00), true)]
    #[case(dec!(100.00), dec!(99.98), false)]
    #[case(dec!(0), dec!(0.02), false)]
    fn test_is_balanced(#[case] debit: Decimal, #[case] credit: Decimal, #[case] expected: bool) {
        assert_eq!(is_balanced(debit, credit), expected);
    }

    #[rstest]
    #[case(dec!(10.005), dec!(10.01))]
    #[case(dec!(10.004), dec!(10.00))]
    #[case(dec!(-10.005), dec!(-10.01))]
    #[case(dec!(7), dec!(7))]
    fn test_round_amount(#[case] input: Decimal, #[case] expected: Decimal) {
        assert_eq!(round_amount(input), expected);
    }
}
