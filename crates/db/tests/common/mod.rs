//! Shared setup for the repository integration tests.
//!
//! Each test gets its own in-memory SQLite database with the real
//! migrations applied. A single pooled connection keeps the database alive
//! for the whole test.

#![allow(dead_code)]

use std::sync::Arc;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use sea_orm_migration::MigratorTrait;
use tally_core::rules::RuleRegistry;
use tally_core::voucher::{VoucherDraft, VoucherLineInput};
use tally_db::migration::Migrator;
use tally_db::{
    BudgetRepository, CashRepository, ConsolidationRepository, EventRepository, LedgerRepository,
    PeriodRepository, VoucherRepository,
};
use tally_shared::types::EntityId;
use tally_shared::{AccountMapping, ConsolidationConfig, RetryConfig};

pub struct Repos {
    pub db: DatabaseConnection,
    pub vouchers: VoucherRepository,
    pub periods: PeriodRepository,
    pub budgets: BudgetRepository,
    pub ledger: LedgerRepository,
    pub cash: CashRepository,
    pub events: EventRepository,
    pub consolidation: ConsolidationRepository,
}

pub async fn setup() -> Repos {
    let mut options = ConnectOptions::new("sqlite::memory:");
    options
        .max_connections(1)
        .min_connections(1)
        .sqlx_logging(false);
    let db = Database::connect(options).await.unwrap();
    Migrator::up(&db, None).await.unwrap();

    let retry = RetryConfig {
        max_attempts: 3,
        base_backoff_ms: 1,
    };
    let accounts = AccountMapping::default();

    Repos {
        vouchers: VoucherRepository::new(db.clone(), retry),
        periods: PeriodRepository::new(db.clone(), retry),
        budgets: BudgetRepository::new(db.clone(), retry),
        ledger: LedgerRepository::new(db.clone()),
        cash: CashRepository::new(db.clone(), accounts.clone(), retry),
        events: EventRepository::new(
            db.clone(),
            Arc::new(RuleRegistry::with_defaults()),
            accounts,
            retry,
        ),
        consolidation: ConsolidationRepository::new(db.clone(), ConsolidationConfig { page_size: 2 }),
        db,
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Cash paid out for an expense: debit 1001, credit 6602.
pub fn cash_draft(entity_id: EntityId, business_date: NaiveDate, amount: Decimal) -> VoucherDraft {
    VoucherDraft::manual(
        entity_id,
        business_date,
        "Petty cash",
        vec![
            VoucherLineInput::debit("1001", amount),
            VoucherLineInput::credit("6602", amount),
        ],
    )
}
