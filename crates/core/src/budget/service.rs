//! Budget arithmetic: check, occupy and release.

use rust_decimal::Decimal;

use super::types::{BudgetCheck, BudgetControlConfig, BudgetKey, BudgetPlan, BudgetStanding, PostingBudgetRequest};
use crate::error::{LedgerError, ValidationError};

/// Budget service for business logic.
pub struct BudgetService;

impl BudgetService {
    /// Validate a budget definition before it is upserted.
    ///
    /// # Errors
    ///
    /// `MissingField("category")` for a blank category, `InvalidAmount` for a
    /// negative amount.
    pub fn validate_definition(category: &str, amount: Decimal) -> Result<(), ValidationError> {
        if category.trim().is_empty() {
            return Err(ValidationError::MissingField("category"));
        }
        if amount < Decimal::ZERO {
            return Err(ValidationError::InvalidAmount);
        }
        Ok(())
    }

    /// Whether `requested` fits in what is left of the budget.
    ///
    /// # Errors
    ///
    /// `InvalidAmount` unless `requested` is positive.
    pub fn check(standing: BudgetStanding, requested: Decimal) -> Result<BudgetCheck, ValidationError> {
        if requested <= Decimal::ZERO {
            return Err(ValidationError::InvalidAmount);
        }
        Ok(BudgetCheck {
            allowed: standing.occupied + requested <= standing.amount,
            budget: standing.amount,
            occupied: standing.occupied,
            requested,
            remaining: standing.remaining(),
        })
    }

    /// Computes the occupied amount after occupying `requested`.
    ///
    /// When `enforce` is set and the request does not fit, nothing changes
    /// and `BudgetExceeded` is returned with the remaining budget.
    pub fn occupy(
        key: &BudgetKey,
        standing: BudgetStanding,
        requested: Decimal,
        enforce: bool,
    ) -> Result<Decimal, LedgerError> {
        let check = Self::check(standing, requested)?;
        if enforce && !check.allowed {
            return Err(LedgerError::BudgetExceeded {
                category: key.category.clone(),
                period_key: key.period_key,
                budget: check.budget,
                occupied: check.occupied,
                requested,
                remaining: check.remaining,
            });
        }
        Ok(standing.occupied + requested)
    }

    /// Computes the occupied amount after releasing `amount`.
    ///
    /// Occupation never drops below zero.
    ///
    /// # Errors
    ///
    /// `InvalidAmount` unless `amount` is positive.
    pub fn release(occupied: Decimal, amount: Decimal) -> Result<Decimal, ValidationError> {
        if amount <= Decimal::ZERO {
            return Err(ValidationError::InvalidAmount);
        }
        Ok((occupied - amount).max(Decimal::ZERO))
    }

    /// Combines the control flags with what the caller asked for.
    ///
    /// With no control on record only the caller's flags apply.
    #[must_use]
    pub fn plan_for_posting(
        control: Option<BudgetControlConfig>,
        request: PostingBudgetRequest,
    ) -> BudgetPlan {
        let config = control.unwrap_or_default();
        BudgetPlan {
            enforce: config.enforce_check || request.check_budget,
            occupy: config.auto_occupy || request.occupy_budget,
        }
    }
}
