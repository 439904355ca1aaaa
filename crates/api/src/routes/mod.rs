//! API route definitions.

use axum::Router;

use crate::AppState;

pub mod budgets;
pub mod cash;
pub mod events;
pub mod health;
pub mod ledger;
pub mod periods;
pub mod reports;
pub mod vouchers;

/// Creates the API router with all routes.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(health::routes())
        .merge(vouchers::routes())
        .merge(ledger::routes())
        .merge(periods::routes())
        .merge(budgets::routes())
        .merge(cash::routes())
        .merge(events::routes())
        .merge(reports::routes())
}
