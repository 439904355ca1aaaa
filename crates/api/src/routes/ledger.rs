//! Ledger query routes.

use axum::{
    Json, Router,
    extract::{Query, State},
    routing::get,
};
use tally_core::ledger::{AccountBalance, LedgerEntry, LedgerFilter};

use crate::{AppState, error::ApiError, middleware::Tenant};

/// Creates the ledger routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/ledger/entries", get(list_entries))
        .route("/ledger/balances", get(list_balances))
}

/// GET `/ledger/entries` - Ledger lines in date order.
async fn list_entries(
    State(state): State<AppState>,
    tenant: Tenant,
    Query(filter): Query<LedgerFilter>,
) -> Result<Json<Vec<LedgerEntry>>, ApiError> {
    Ok(Json(state.ledger.entries(tenant.id(), filter).await?))
}

/// GET `/ledger/balances` - Per-account balances, `debit - credit`.
async fn list_balances(
    State(state): State<AppState>,
    tenant: Tenant,
    Query(filter): Query<LedgerFilter>,
) -> Result<Json<Vec<AccountBalance>>, ApiError> {
    Ok(Json(state.ledger.balances(tenant.id(), filter).await?))
}
