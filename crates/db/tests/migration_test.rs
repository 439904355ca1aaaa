//! Schema migration: indexes and unique keys are created, and the schema
//! can be dropped and re-applied.

mod common;

use common::setup;
use sea_orm::{ConnectionTrait, DbBackend, Statement};
use sea_orm_migration::MigratorTrait;
use tally_db::migration::Migrator;

async fn index_names(db: &sea_orm::DatabaseConnection) -> Vec<String> {
    let rows = db
        .query_all(Statement::from_string(
            DbBackend::Sqlite,
            "SELECT name FROM sqlite_master WHERE type = 'index' ORDER BY name",
        ))
        .await
        .unwrap();
    rows.iter()
        .map(|row| row.try_get::<String>("", "name").unwrap())
        .collect()
}

#[tokio::test]
async fn test_indexes_are_created() {
    let repos = setup().await;
    let names = index_names(&repos.db).await;

    for expected in [
        "uq_periods_tenant_period",
        "uq_vouchers_tenant_no",
        "uq_vouchers_tenant_event",
        "idx_vouchers_tenant_date",
        "idx_voucher_lines_tenant_account",
        "uq_budgets_key",
        "idx_cash_transactions_tenant_ref",
    ] {
        assert!(names.iter().any(|n| n == expected), "missing index {expected}");
    }
}

#[tokio::test]
async fn test_schema_can_be_reapplied() {
    let repos = setup().await;
    Migrator::down(&repos.db, None).await.unwrap();
    assert!(
        !index_names(&repos.db)
            .await
            .iter()
            .any(|n| n == "uq_vouchers_tenant_no")
    );

    Migrator::up(&repos.db, None).await.unwrap();
    assert!(
        index_names(&repos.db)
            .await
            .iter()
            .any(|n| n == "uq_vouchers_tenant_no")
    );
}
