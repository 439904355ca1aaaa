//! Applies the ledger schema (vouchers, periods, budgets, cash) to the
//! database named by `DATABASE_URL`.
//!
//! Usage:
//!   tally-migrator up      - Run all pending migrations
//!   tally-migrator down    - Roll back the last migration
//!   tally-migrator status  - Show migration status
//!   tally-migrator fresh   - Drop all tables and re-run migrations

use sea_orm_migration::prelude::*;
use tally_db::migration::Migrator;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // The CLI installs its own tracing subscriber.
    cli::run_cli(Migrator).await;
}
