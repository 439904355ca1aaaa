//! Consolidated reports.

use axum::{
    Json, Router,
    extract::{Query, State},
    routing::get,
};
use serde::Deserialize;
use tally_core::ledger::{ConsolidatedReport, GroupBy};
use tally_core::period::PeriodKey;
use tally_db::ConsolidationRequest;
use tally_shared::types::EntityId;

use crate::{AppState, error::ApiError, middleware::Tenant};

/// Creates the report routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/reports/consolidated", get(consolidated))
}

/// Query parameters for the consolidated report.
#[derive(Debug, Deserialize)]
pub struct ConsolidatedQuery {
    /// Period to consolidate.
    pub period_key: PeriodKey,
    /// `entity` (default) or `none`.
    #[serde(default)]
    pub group_by: GroupBy,
    /// `next_cursor` of the previous page.
    #[serde(default)]
    pub cursor: Option<EntityId>,
    /// Page size override.
    #[serde(default)]
    pub limit: Option<u64>,
}

/// GET `/reports/consolidated` - Posted balances across entities.
///
/// Server shutdown cancels the work and the caller gets `499 CANCELLED`. A
/// dropped request (client disconnect or the request timeout) stops the work
/// through the drop guard and sends no response. Nothing partial is ever
/// returned.
async fn consolidated(
    State(state): State<AppState>,
    tenant: Tenant,
    Query(query): Query<ConsolidatedQuery>,
) -> Result<Json<ConsolidatedReport>, ApiError> {
    let cancel = state.shutdown.child_token();
    let _guard = cancel.clone().drop_guard();

    let request = ConsolidationRequest {
        period_key: query.period_key,
        group_by: query.group_by,
        cursor: query.cursor,
        limit: query.limit,
    };
    let report = state
        .consolidation
        .consolidated(tenant.id(), request, &cancel)
        .await?;
    Ok(Json(report))
}
