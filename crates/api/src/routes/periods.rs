//! Accounting period routes.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
};
use serde::Deserialize;
use tally_core::period::{Period, PeriodKey};
use tracing::info;

use crate::{AppState, error::ApiError, middleware::Tenant};

/// Creates the period routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/periods", get(list_periods).post(create_period))
        .route("/periods/{key}/close", post(close_period))
        .route("/periods/{key}/reopen", post(reopen_period))
}

/// Query parameters for listing periods.
#[derive(Debug, Deserialize)]
pub struct ListPeriodsQuery {
    /// First period, inclusive.
    pub from: PeriodKey,
    /// Last period, inclusive.
    pub to: PeriodKey,
}

/// Request body for creating a period.
#[derive(Debug, Deserialize)]
pub struct CreatePeriodRequest {
    /// Period key, e.g. `2024-03`.
    pub period_key: PeriodKey,
}

/// GET `/periods?from=YYYY-MM&to=YYYY-MM` - Periods in range, untouched months included.
async fn list_periods(
    State(state): State<AppState>,
    tenant: Tenant,
    Query(query): Query<ListPeriodsQuery>,
) -> Result<Json<Vec<Period>>, ApiError> {
    Ok(Json(state.periods.list(tenant.id(), query.from, query.to).await?))
}

/// POST `/periods` - Store a period. Idempotent.
async fn create_period(
    State(state): State<AppState>,
    tenant: Tenant,
    Json(payload): Json<CreatePeriodRequest>,
) -> Result<(StatusCode, Json<Period>), ApiError> {
    let period = state.periods.create(tenant.id(), payload.period_key).await?;
    Ok((StatusCode::CREATED, Json(period)))
}

/// POST `/periods/{key}/close` - Close a period.
async fn close_period(
    State(state): State<AppState>,
    tenant: Tenant,
    Path(key): Path<PeriodKey>,
) -> Result<Json<Period>, ApiError> {
    Ok(Json(state.periods.close(tenant.id(), key).await?))
}

/// POST `/periods/{key}/reopen` - Reopen a period. Tenant admins only.
async fn reopen_period(
    State(state): State<AppState>,
    tenant: Tenant,
    Path(key): Path<PeriodKey>,
) -> Result<Json<Period>, ApiError> {
    tenant.require_admin()?;
    let period = state.periods.reopen(tenant.id(), key).await?;
    info!(tenant_id = %tenant.id(), period_key = %key, role = ?tenant.role(), "Period reopened by admin");
    Ok(Json(period))
}
