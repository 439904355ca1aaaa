//! Voucher routes: manual drafts, status changes, void and red-flush.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, patch, post},
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use tally_core::budget::PostingBudgetRequest;
use tally_core::voucher::{Voucher, VoucherDraft, VoucherLineInput, VoucherSource, VoucherStatus};
use tally_db::{RedFlushOutcome, VoucherFilter};
use tally_shared::types::{EntityId, PageRequest, PageResponse, VoucherId};

use crate::{AppState, error::ApiError, middleware::Tenant};

/// Creates the voucher routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/vouchers", post(create_voucher).get(list_vouchers))
        .route("/vouchers/{id}", get(get_voucher))
        .route("/vouchers/{id}/status", patch(change_status))
        .route("/vouchers/{id}/void", post(void_voucher))
        .route("/vouchers/{id}/red-flush", post(red_flush_voucher))
}

// ============================================================================
// Request Types
// ============================================================================

/// Request body for a manual draft.
#[derive(Debug, Deserialize)]
pub struct CreateVoucherRequest {
    /// Business entity.
    pub entity_id: EntityId,
    /// Business date; decides the period.
    pub business_date: NaiveDate,
    /// Description.
    pub description: String,
    /// Debit and credit legs.
    pub lines: Vec<VoucherLineInput>,
    /// Attachment references.
    #[serde(default)]
    pub attachments: Option<serde_json::Value>,
    /// Budget category the voucher spends from.
    #[serde(default)]
    pub budget_category: Option<String>,
    /// Amount claimed against the budget; defaults to the total debit.
    #[serde(default)]
    pub budget_amount: Option<Decimal>,
}

/// Request body for a status change.
#[derive(Debug, Deserialize)]
pub struct ChangeStatusRequest {
    /// Target status: `pending`, `approved`, `posted` or `rejected`.
    pub status: VoucherStatus,
    /// Required when rejecting.
    #[serde(default)]
    pub reason: Option<String>,
    /// Enforce the budget on posting even without a control.
    #[serde(default)]
    pub check_budget: bool,
    /// Occupy the budget on posting even without a control.
    #[serde(default)]
    pub occupy_budget: bool,
}

/// Request body for voiding.
#[derive(Debug, Default, Deserialize)]
pub struct VoidRequest {
    /// Why the voucher is voided.
    #[serde(default)]
    pub reason: Option<String>,
}

/// Request body for a red-flush.
#[derive(Debug, Default, Deserialize)]
pub struct RedFlushRequest {
    /// Date of the reversal; the original's date when absent.
    #[serde(default)]
    pub business_date: Option<NaiveDate>,
    /// Why the voucher is reversed.
    #[serde(default)]
    pub reason: Option<String>,
}

// ============================================================================
// Handlers
// ============================================================================

/// POST `/vouchers` - Create a manual draft.
async fn create_voucher(
    State(state): State<AppState>,
    tenant: Tenant,
    Json(payload): Json<CreateVoucherRequest>,
) -> Result<(StatusCode, Json<Voucher>), ApiError> {
    let draft = VoucherDraft {
        entity_id: payload.entity_id,
        business_date: payload.business_date,
        description: payload.description,
        lines: payload.lines,
        attachments: payload.attachments,
        source: VoucherSource::Manual,
        budget_category: payload.budget_category,
        budget_amount: payload.budget_amount,
    };
    let voucher = state.vouchers.create_draft(tenant.id(), draft).await?;
    Ok((StatusCode::CREATED, Json(voucher)))
}

/// GET `/vouchers` - List vouchers.
async fn list_vouchers(
    State(state): State<AppState>,
    tenant: Tenant,
    Query(filter): Query<VoucherFilter>,
    Query(page): Query<PageRequest>,
) -> Result<Json<PageResponse<Voucher>>, ApiError> {
    Ok(Json(state.vouchers.list(tenant.id(), &filter, &page).await?))
}

/// GET `/vouchers/{id}` - Get one voucher with its lines.
async fn get_voucher(
    State(state): State<AppState>,
    tenant: Tenant,
    Path(id): Path<VoucherId>,
) -> Result<Json<Voucher>, ApiError> {
    Ok(Json(state.vouchers.get(tenant.id(), id).await?))
}

/// PATCH `/vouchers/{id}/status` - Submit, approve, post or reject.
async fn change_status(
    State(state): State<AppState>,
    tenant: Tenant,
    Path(id): Path<VoucherId>,
    Json(payload): Json<ChangeStatusRequest>,
) -> Result<Json<Voucher>, ApiError> {
    let budget = PostingBudgetRequest {
        check_budget: payload.check_budget,
        occupy_budget: payload.occupy_budget,
    };
    let voucher = state
        .vouchers
        .transition(
            tenant.id(),
            id,
            payload.status,
            payload.reason.as_deref(),
            budget,
        )
        .await?;
    Ok(Json(voucher))
}

/// POST `/vouchers/{id}/void` - Void a draft or posted voucher.
async fn void_voucher(
    State(state): State<AppState>,
    tenant: Tenant,
    Path(id): Path<VoucherId>,
    Json(payload): Json<VoidRequest>,
) -> Result<Json<Voucher>, ApiError> {
    let voucher = state
        .vouchers
        .void(tenant.id(), id, payload.reason.as_deref())
        .await?;
    Ok(Json(voucher))
}

/// POST `/vouchers/{id}/red-flush` - Reverse a posted voucher.
async fn red_flush_voucher(
    State(state): State<AppState>,
    tenant: Tenant,
    Path(id): Path<VoucherId>,
    Json(payload): Json<RedFlushRequest>,
) -> Result<(StatusCode, Json<RedFlushOutcome>), ApiError> {
    let outcome = state
        .vouchers
        .red_flush(
            tenant.id(),
            id,
            payload.business_date,
            payload.reason.as_deref(),
        )
        .await?;
    Ok((StatusCode::CREATED, Json(outcome)))
}
