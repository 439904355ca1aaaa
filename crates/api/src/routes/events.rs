//! Business event ingestion.

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{get, post},
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tally_core::rules::BusinessEvent;
use tally_db::IngestOutcome;
use tally_shared::types::EntityId;

use crate::{AppState, error::ApiError, middleware::Tenant};

/// Creates the event routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/events", post(ingest_event))
        .route("/events/types", get(list_event_types))
}

/// Request body for an event. The tenant comes from the request headers.
#[derive(Debug, Deserialize)]
pub struct IngestEventRequest {
    /// Registered event type.
    pub event_type: String,
    /// Producer-assigned id; replays return the first voucher.
    pub event_id: String,
    /// Store or legal entity.
    pub entity_id: EntityId,
    /// When the business fact happened.
    pub occurred_at: DateTime<Utc>,
    /// Rule-specific body.
    pub payload: serde_json::Value,
    /// Post the generated voucher straight away.
    #[serde(default)]
    pub auto_post: bool,
}

/// POST `/events` - Generate (and optionally post) the voucher for an event.
///
/// Answers `201` for a new voucher and `200` for a replayed event.
async fn ingest_event(
    State(state): State<AppState>,
    tenant: Tenant,
    Json(payload): Json<IngestEventRequest>,
) -> Result<(StatusCode, Json<IngestOutcome>), ApiError> {
    let event = BusinessEvent {
        event_type: payload.event_type,
        event_id: payload.event_id,
        tenant_id: tenant.id(),
        entity_id: payload.entity_id,
        occurred_at: payload.occurred_at,
        payload: payload.payload,
    };

    let outcome = state.events.ingest(&event, payload.auto_post).await?;
    let status = if outcome.created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(outcome)))
}

/// GET `/events/types` - Event types with a registered rule.
async fn list_event_types(State(state): State<AppState>) -> Json<Vec<&'static str>> {
    Json(state.events.event_types())
}
