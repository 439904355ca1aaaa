//! Property-based tests for budget occupation.

use proptest::prelude::*;
use rust_decimal::Decimal;
use tally_shared::types::EntityId;

use super::service::BudgetService;
use super::types::{BudgetKey, BudgetStanding};

fn amount() -> impl Strategy<Value = Decimal> {
    (1i64..1_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Under enforcement, a sequence of occupations never pushes the occupied
    /// amount past the budget, and every refused request leaves it unchanged.
    #[test]
    fn prop_enforced_occupation_never_exceeds_budget(
        budget in amount(),
        requests in prop::collection::vec(amount(), 1..20),
    ) {
        let key = BudgetKey {
            entity_id: EntityId::new(),
            category: "supplies".into(),
            period_key: "2024-03".parse().unwrap(),
        };
        let mut occupied = Decimal::ZERO;
        for requested in requests {
            let before = occupied;
            match BudgetService::occupy(&key, BudgetStanding { amount: budget, occupied }, requested, true) {
                Ok(next) => {
                    prop_assert_eq!(next, before + requested);
                    occupied = next;
                }
                Err(_) => prop_assert_eq!(occupied, before),
            }
            prop_assert!(occupied <= budget);
        }
    }

    /// Occupation is monotonic until something is released.
    #[test]
    fn prop_occupation_is_monotonic(
        budget in amount(),
        occupied in amount(),
        requested in amount(),
    ) {
        let key = BudgetKey {
            entity_id: EntityId::new(),
            category: "supplies".into(),
            period_key: "2024-03".parse().unwrap(),
        };
        let next = BudgetService::occupy(&key, BudgetStanding { amount: budget, occupied }, requested, false).unwrap();
        prop_assert!(next > occupied);
        let released = BudgetService::release(next, requested).unwrap();
        prop_assert_eq!(released, occupied);
    }
}
