//! Budget control: check, occupy and release against per-period budgets.
//!
//! A budget is keyed by (entity, category, period). A budget control holds
//! the per-(entity, category) configuration deciding whether postings are
//! checked against the budget and whether they occupy it automatically.

pub mod service;
pub mod types;

#[cfg(test)]
mod service_props;

pub use service::BudgetService;
pub use types::{
    Budget, BudgetCheck, BudgetControl, BudgetControlConfig, BudgetKey, BudgetPlan, BudgetStanding,
    PostingBudgetRequest,
};
