//! HTTP API layer with Axum routes and middleware.
//!
//! This crate provides:
//! - REST routes for vouchers, ledger queries, periods, budgets, cash,
//!   events and consolidated reports
//! - The tenant extractor every route is scoped by
//! - The mapping from `LedgerError` to JSON error responses

pub mod error;
pub mod middleware;
pub mod routes;

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use sea_orm::DatabaseConnection;
use tally_core::rules::RuleRegistry;
use tally_db::{
    BudgetRepository, CashRepository, ConsolidationRepository, EventRepository, LedgerRepository,
    PeriodRepository, VoucherRepository,
};
use tally_shared::LedgerConfig;
use tokio_util::sync::CancellationToken;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

pub use error::ApiError;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Connection pool, for health checks.
    pub db: DatabaseConnection,
    /// Voucher lifecycle.
    pub vouchers: VoucherRepository,
    /// Period registry.
    pub periods: PeriodRepository,
    /// Budgets and controls.
    pub budgets: BudgetRepository,
    /// Ledger queries.
    pub ledger: LedgerRepository,
    /// Cash transactions.
    pub cash: CashRepository,
    /// Event ingestion.
    pub events: EventRepository,
    /// Consolidated reports.
    pub consolidation: ConsolidationRepository,
    /// Cancelled when the server shuts down; long-running reports stop on it.
    pub shutdown: CancellationToken,
}

impl AppState {
    /// Builds every repository over one connection pool.
    #[must_use]
    pub fn new(db: DatabaseConnection, config: &LedgerConfig) -> Self {
        Self {
            vouchers: VoucherRepository::new(db.clone(), config.retry),
            periods: PeriodRepository::new(db.clone(), config.retry),
            budgets: BudgetRepository::new(db.clone(), config.retry),
            ledger: LedgerRepository::new(db.clone()),
            cash: CashRepository::new(db.clone(), config.accounts.clone(), config.retry),
            events: EventRepository::new(
                db.clone(),
                Arc::new(RuleRegistry::with_defaults()),
                config.accounts.clone(),
                config.retry,
            ),
            consolidation: ConsolidationRepository::new(db.clone(), config.consolidation),
            shutdown: CancellationToken::new(),
            db,
        }
    }
}

/// Creates the main application router.
pub fn create_router(state: AppState, request_timeout: Duration) -> Router {
    Router::new()
        .merge(routes::api_routes())
        .layer(TimeoutLayer::new(request_timeout))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
