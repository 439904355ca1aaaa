//! Budget routes: amounts, controls, check, occupy and release.

use axum::{
    Json, Router,
    extract::{Query, State},
    response::{IntoResponse, Response},
    routing::{get, post, put},
};
use rust_decimal::Decimal;
use serde::Deserialize;
use tally_core::budget::{Budget, BudgetCheck, BudgetControl, BudgetControlConfig, BudgetKey};
use tally_core::period::PeriodKey;
use tally_db::UpsertBudgetInput;
use tally_shared::types::EntityId;

use crate::{AppState, error::ApiError, middleware::Tenant};

/// Creates the budget routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/budgets", put(upsert_budget).get(list_budgets))
        .route("/budgets/check", get(check_budget))
        .route("/budgets/occupy", post(occupy_budget))
        .route("/budgets/release", post(release_budget))
        .route("/budgets/control", put(upsert_control).get(get_controls))
}

// ============================================================================
// Request Types
// ============================================================================

/// Query parameters for listing budgets.
#[derive(Debug, Deserialize)]
pub struct ListBudgetsQuery {
    /// Only this entity.
    #[serde(default)]
    pub entity_id: Option<EntityId>,
    /// Only this period.
    #[serde(default)]
    pub period_key: Option<PeriodKey>,
}

/// A budget key plus an amount, used by check, occupy and release.
#[derive(Debug, Deserialize)]
pub struct BudgetAmountRequest {
    /// Business entity.
    pub entity_id: EntityId,
    /// Budget category.
    pub category: String,
    /// Budget period.
    pub period_key: PeriodKey,
    /// Amount to check, occupy or release.
    pub amount: Decimal,
}

impl BudgetAmountRequest {
    fn key(&self) -> BudgetKey {
        BudgetKey {
            entity_id: self.entity_id,
            category: self.category.trim().to_string(),
            period_key: self.period_key,
        }
    }
}

/// Request body for setting a control.
#[derive(Debug, Deserialize)]
pub struct UpsertControlRequest {
    /// Business entity.
    pub entity_id: EntityId,
    /// Budget category.
    pub category: String,
    /// Control flags.
    #[serde(flatten)]
    pub config: BudgetControlConfig,
}

/// Query parameters for reading controls.
#[derive(Debug, Deserialize)]
pub struct ControlQuery {
    /// Only this entity.
    #[serde(default)]
    pub entity_id: Option<EntityId>,
    /// With `entity_id`, return the single control for this category.
    #[serde(default)]
    pub category: Option<String>,
}

// ============================================================================
// Handlers
// ============================================================================

/// PUT `/budgets` - Create a budget or replace its amount.
async fn upsert_budget(
    State(state): State<AppState>,
    tenant: Tenant,
    Json(payload): Json<UpsertBudgetInput>,
) -> Result<Json<Budget>, ApiError> {
    Ok(Json(state.budgets.upsert(tenant.id(), payload).await?))
}

/// GET `/budgets` - List budgets.
async fn list_budgets(
    State(state): State<AppState>,
    tenant: Tenant,
    Query(query): Query<ListBudgetsQuery>,
) -> Result<Json<Vec<Budget>>, ApiError> {
    let budgets = state
        .budgets
        .list(tenant.id(), query.entity_id, query.period_key)
        .await?;
    Ok(Json(budgets))
}

/// GET `/budgets/check` - Whether an amount still fits. Changes nothing.
async fn check_budget(
    State(state): State<AppState>,
    tenant: Tenant,
    Query(query): Query<BudgetAmountRequest>,
) -> Result<Json<BudgetCheck>, ApiError> {
    let check = state
        .budgets
        .check(tenant.id(), &query.key(), query.amount)
        .await?;
    Ok(Json(check))
}

/// POST `/budgets/occupy` - Occupy an amount.
async fn occupy_budget(
    State(state): State<AppState>,
    tenant: Tenant,
    Json(payload): Json<BudgetAmountRequest>,
) -> Result<Json<Budget>, ApiError> {
    let budget = state
        .budgets
        .occupy(tenant.id(), &payload.key(), payload.amount)
        .await?;
    Ok(Json(budget))
}

/// POST `/budgets/release` - Release an occupied amount.
async fn release_budget(
    State(state): State<AppState>,
    tenant: Tenant,
    Json(payload): Json<BudgetAmountRequest>,
) -> Result<Json<Budget>, ApiError> {
    let budget = state
        .budgets
        .release(tenant.id(), &payload.key(), payload.amount)
        .await?;
    Ok(Json(budget))
}

/// PUT `/budgets/control` - Set the control for an entity and category.
async fn upsert_control(
    State(state): State<AppState>,
    tenant: Tenant,
    Json(payload): Json<UpsertControlRequest>,
) -> Result<Json<BudgetControl>, ApiError> {
    let control = state
        .budgets
        .upsert_control(tenant.id(), payload.entity_id, &payload.category, payload.config)
        .await?;
    Ok(Json(control))
}

/// GET `/budgets/control` - One control by entity and category, or a list.
async fn get_controls(
    State(state): State<AppState>,
    tenant: Tenant,
    Query(query): Query<ControlQuery>,
) -> Result<Response, ApiError> {
    match (query.entity_id, query.category.as_deref()) {
        (Some(entity_id), Some(category)) => {
            let control = state
                .budgets
                .get_control(tenant.id(), entity_id, category.trim())
                .await?;
            Ok(Json(control).into_response())
        }
        (entity_id, _) => {
            let controls = state.budgets.list_controls(tenant.id(), entity_id).await?;
            Ok(Json(controls).into_response())
        }
    }
}
