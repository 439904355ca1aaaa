//! Cash transaction routes.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, patch, post},
};
use serde::Deserialize;
use tally_core::cash::{CashTransaction, CashTransactionInput, ImportReport};
use tally_db::CashFilter;
use tally_shared::types::{CashTransactionId, PageRequest, PageResponse};

use crate::{AppState, error::ApiError, middleware::Tenant};

/// Creates the cash routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/cash/transactions",
            post(create_transaction).get(list_transactions),
        )
        .route("/cash/transactions/import", post(import_transactions))
        .route("/cash/transactions/{id}", get(get_transaction))
        .route("/cash/transactions/{id}/match", patch(match_transaction))
        .route("/cash/transactions/{id}/unmatch", patch(unmatch_transaction))
}

/// Request body for recording a movement.
#[derive(Debug, Deserialize)]
pub struct CreateCashRequest {
    /// The movement.
    #[serde(flatten)]
    pub transaction: CashTransactionInput,
    /// Also create a draft voucher for it.
    #[serde(default)]
    pub generate_voucher: bool,
}

/// Request body for matching.
#[derive(Debug, Deserialize)]
pub struct MatchRequest {
    /// Reconciliation reference, e.g. a bank statement line.
    pub match_id: String,
}

/// Request body for a batch import.
#[derive(Debug, Deserialize)]
pub struct ImportRequest {
    /// Rows in file order.
    pub rows: Vec<CashTransactionInput>,
    /// Skip rows whose `external_ref` is already stored or repeated in the batch.
    #[serde(default)]
    pub skip_duplicate: bool,
    /// Also create a draft voucher per imported row.
    #[serde(default)]
    pub generate_voucher: bool,
}

/// POST `/cash/transactions` - Record a movement.
async fn create_transaction(
    State(state): State<AppState>,
    tenant: Tenant,
    Json(payload): Json<CreateCashRequest>,
) -> Result<(StatusCode, Json<CashTransaction>), ApiError> {
    let transaction = state
        .cash
        .create(tenant.id(), payload.transaction, payload.generate_voucher)
        .await?;
    Ok((StatusCode::CREATED, Json(transaction)))
}

/// GET `/cash/transactions` - List movements.
async fn list_transactions(
    State(state): State<AppState>,
    tenant: Tenant,
    Query(filter): Query<CashFilter>,
    Query(page): Query<PageRequest>,
) -> Result<Json<PageResponse<CashTransaction>>, ApiError> {
    Ok(Json(state.cash.list(tenant.id(), &filter, &page).await?))
}

/// GET `/cash/transactions/{id}` - Get one movement.
async fn get_transaction(
    State(state): State<AppState>,
    tenant: Tenant,
    Path(id): Path<CashTransactionId>,
) -> Result<Json<CashTransaction>, ApiError> {
    Ok(Json(state.cash.get(tenant.id(), id).await?))
}

/// PATCH `/cash/transactions/{id}/match` - Mark as matched.
async fn match_transaction(
    State(state): State<AppState>,
    tenant: Tenant,
    Path(id): Path<CashTransactionId>,
    Json(payload): Json<MatchRequest>,
) -> Result<Json<CashTransaction>, ApiError> {
    let transaction = state
        .cash
        .match_transaction(tenant.id(), id, &payload.match_id)
        .await?;
    Ok(Json(transaction))
}

/// PATCH `/cash/transactions/{id}/unmatch` - Back to pending.
async fn unmatch_transaction(
    State(state): State<AppState>,
    tenant: Tenant,
    Path(id): Path<CashTransactionId>,
) -> Result<Json<CashTransaction>, ApiError> {
    Ok(Json(state.cash.unmatch(tenant.id(), id).await?))
}

/// POST `/cash/transactions/import` - Import a batch; per-row results.
async fn import_transactions(
    State(state): State<AppState>,
    tenant: Tenant,
    Json(payload): Json<ImportRequest>,
) -> Result<Json<ImportReport>, ApiError> {
    let report = state
        .cash
        .import(
            tenant.id(),
            payload.rows,
            payload.skip_duplicate,
            payload.generate_voucher,
        )
        .await?;
    Ok(Json(report))
}
