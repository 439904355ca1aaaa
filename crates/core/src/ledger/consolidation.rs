//! Consolidation across the entities of one tenant.
//!
//! No intercompany elimination is performed; totals are plain sums.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tally_shared::types::EntityId;

use super::balance::{AccountBalance, merge_balances};
use crate::error::ValidationError;
use crate::period::PeriodKey;

/// How consolidated balances are grouped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupBy {
    /// One balance list per entity, paged.
    #[default]
    Entity,
    /// A single list summed across every entity.
    None,
}

impl fmt::Display for GroupBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Entity => "entity",
            Self::None => "none",
        })
    }
}

impl FromStr for GroupBy {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "entity" => Ok(Self::Entity),
            "none" => Ok(Self::None),
            other => Err(ValidationError::Payload(format!(
                "group_by must be 'entity' or 'none', got '{other}'"
            ))),
        }
    }
}

/// Balances of one entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityBalances {
    /// The entity.
    pub entity_id: EntityId,
    /// Its account balances.
    pub balances: Vec<AccountBalance>,
}

/// A consolidation result.
///
/// With `group_by = entity` the report covers one page of entities and
/// `next_cursor` is set while more remain; `totals` is empty. With
/// `group_by = none` `entities` is empty and `totals` covers all entities.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsolidatedReport {
    /// Period consolidated.
    pub period_key: PeriodKey,
    /// Grouping used.
    pub group_by: GroupBy,
    /// Per-entity breakdown.
    pub entities: Vec<EntityBalances>,
    /// Sum across entities.
    pub totals: Vec<AccountBalance>,
    /// Pass as `cursor` to fetch the next page.
    pub next_cursor: Option<EntityId>,
}

/// Stateless consolidation folding.
pub struct ConsolidationService;

impl ConsolidationService {
    /// Builds a per-entity page. `has_more` says whether entities remain
    /// after the last one in `per_entity`.
    #[must_use]
    pub fn entity_page(
        period_key: PeriodKey,
        per_entity: Vec<EntityBalances>,
        has_more: bool,
    ) -> ConsolidatedReport {
        let next_cursor = if has_more {
            per_entity.last().map(|e| e.entity_id)
        } else {
            None
        };

        ConsolidatedReport {
            period_key,
            group_by: GroupBy::Entity,
            entities: per_entity,
            totals: Vec::new(),
            next_cursor,
        }
    }

    /// Sums every entity into one list.
    #[must_use]
    pub fn summed(period_key: PeriodKey, per_entity: &[EntityBalances]) -> ConsolidatedReport {
        ConsolidatedReport {
            period_key,
            group_by: GroupBy::None,
            entities: Vec::new(),
            totals: merge_balances(per_entity.iter().map(|e| e.balances.as_slice())),
            next_cursor: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn balances(entity_id: EntityId, cash: Decimal) -> EntityBalances {
        let mut balance = AccountBalance::new("1001".into(), None);
        balance.add(cash, Decimal::ZERO);
        EntityBalances {
            entity_id,
            balances: vec![balance],
        }
    }

    fn period() -> PeriodKey {
        "2024-03".parse().unwrap()
    }

    #[test]
    fn test_entity_page_sets_cursor_when_more_remain() {
        let ids: Vec<EntityId> = (0..2).map(|_| EntityId::new()).collect();
        let per_entity = ids.iter().map(|id| balances(*id, dec!(10))).collect();
        let report = ConsolidationService::entity_page(period(), per_entity, true);
        assert_eq!(report.entities.len(), 2);
        assert_eq!(report.next_cursor, Some(ids[1]));
    }

    #[test]
    fn test_last_page_has_no_cursor() {
        let per_entity = vec![balances(EntityId::new(), dec!(10))];
        let report = ConsolidationService::entity_page(period(), per_entity, false);
        assert_eq!(report.entities.len(), 1);
        assert!(report.next_cursor.is_none());
    }

    #[test]
    fn test_summed_report() {
        let per_entity = vec![
            balances(EntityId::new(), dec!(10)),
            balances(EntityId::new(), dec!(32.5)),
        ];
        let report = ConsolidationService::summed(period(), &per_entity);
        assert_eq!(report.group_by, GroupBy::None);
        assert!(report.entities.is_empty());
        assert_eq!(report.totals[0].balance, dec!(42.5));
    }

    #[test]
    fn test_group_by_parse() {
        assert_eq!("none".parse::<GroupBy>().unwrap(), GroupBy::None);
        assert_eq!("entity".parse::<GroupBy>().unwrap(), GroupBy::Entity);
        assert!("store".parse::<GroupBy>().is_err());
    }
}
