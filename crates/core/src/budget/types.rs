//! Budget data types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tally_shared::types::{BudgetControlId, BudgetId, EntityId, TenantId};

use crate::period::PeriodKey;

/// Identifies one budget within a tenant.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BudgetKey {
    /// Business entity.
    pub entity_id: EntityId,
    /// Budget category, e.g. `marketing`.
    pub category: String,
    /// Budget period.
    pub period_key: PeriodKey,
}

/// Per-(entity, category) control flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BudgetControlConfig {
    /// Refuse occupations that would exceed the budget.
    #[serde(default)]
    pub enforce_check: bool,
    /// Occupy the budget whenever a voucher claiming it is posted.
    #[serde(default)]
    pub auto_occupy: bool,
}

/// A stored budget control.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BudgetControl {
    /// Control id.
    pub id: BudgetControlId,
    /// Owning tenant.
    pub tenant_id: TenantId,
    /// Business entity.
    pub entity_id: EntityId,
    /// Budget category.
    pub category: String,
    /// Flags.
    #[serde(flatten)]
    pub config: BudgetControlConfig,
    /// Last change.
    pub updated_at: DateTime<Utc>,
}

/// A stored budget with its running occupation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Budget {
    /// Budget id.
    pub id: BudgetId,
    /// Owning tenant.
    pub tenant_id: TenantId,
    /// Business entity.
    pub entity_id: EntityId,
    /// Budget category.
    pub category: String,
    /// Budget period.
    pub period_key: PeriodKey,
    /// Budgeted amount.
    pub amount: Decimal,
    /// Amount occupied so far.
    pub occupied_amount: Decimal,
    /// `amount - occupied_amount`; negative when a lowered budget is overrun.
    pub remaining: Decimal,
    /// Last change.
    pub updated_at: DateTime<Utc>,
}

/// Budgeted and occupied amounts at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BudgetStanding {
    /// Budgeted amount.
    pub amount: Decimal,
    /// Amount occupied so far.
    pub occupied: Decimal,
}

impl BudgetStanding {
    /// `amount - occupied`.
    #[must_use]
    pub fn remaining(self) -> Decimal {
        self.amount - self.occupied
    }
}

/// Result of a budget check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BudgetCheck {
    /// Whether occupying `requested` stays within the budget.
    pub allowed: bool,
    /// Budgeted amount.
    pub budget: Decimal,
    /// Amount occupied so far.
    pub occupied: Decimal,
    /// Amount the caller asked about.
    pub requested: Decimal,
    /// Budget left before the request.
    pub remaining: Decimal,
}

/// Budget behaviour a caller asks for when posting a voucher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PostingBudgetRequest {
    /// Check the voucher's claim against the budget.
    #[serde(default)]
    pub check_budget: bool,
    /// Occupy the voucher's claim.
    #[serde(default)]
    pub occupy_budget: bool,
}

/// What a posting will do to the budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BudgetPlan {
    /// Fail the posting if the claim exceeds the remaining budget.
    pub enforce: bool,
    /// Add the claim to the occupied amount.
    pub occupy: bool,
}

impl BudgetPlan {
    /// Whether the posting touches the budget at all.
    #[must_use]
    pub const fn is_active(self) -> bool {
        self.enforce || self.occupy
    }
}
