//! Database layer with `SeaORM` entities and repositories.
//!
//! This crate provides:
//! - `SeaORM` entity definitions
//! - Database migrations
//! - Transactional repositories applying the ledger guards
//! - Mapping of database failures onto `LedgerError`

pub mod entities;
pub mod error;
pub mod migration;
pub mod repositories;
pub mod retry;

pub use error::db_err;
pub use repositories::{
    BudgetRepository, CashFilter, CashRepository, ConsolidationRepository, ConsolidationRequest,
    EventRepository, IngestOutcome, LedgerRepository, PeriodRepository, RedFlushOutcome,
    UpsertBudgetInput, VoucherFilter, VoucherRepository,
};

use std::time::Duration;

use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};
use tally_shared::DatabaseConfig;
use tracing::info;

/// Establishes a connection pool to the database.
///
/// # Errors
///
/// Returns an error if the connection cannot be established.
pub async fn connect(config: &DatabaseConfig) -> Result<DatabaseConnection, DbErr> {
    let mut options = ConnectOptions::new(config.url.clone());
    options
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .connect_timeout(Duration::from_secs(10))
        .sqlx_logging(false);

    let db = Database::connect(options).await?;
    info!(max_connections = config.max_connections, "Database connected");
    Ok(db)
}
