//! Ledger schema.
//!
//! Creates the voucher, period, budget and cash tables with their tenant
//! partitioning indexes. Written with the schema builder so the same
//! migration runs on PostgreSQL and on the SQLite databases used in tests.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // ============================================================
        // PART 1: PERIODS & SEQUENCES
        // ============================================================
        manager
            .create_table(
                Table::create()
                    .table(Periods::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Periods::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Periods::TenantId).uuid().not_null())
                    .col(ColumnDef::new(Periods::PeriodKey).string_len(7).not_null())
                    .col(ColumnDef::new(Periods::StartDate).date().not_null())
                    .col(ColumnDef::new(Periods::EndDate).date().not_null())
                    .col(ColumnDef::new(Periods::Status).string_len(16).not_null())
                    .col(ColumnDef::new(Periods::ClosedAt).timestamp_with_time_zone())
                    .col(
                        ColumnDef::new(Periods::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Periods::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;
        unique_index(manager, "uq_periods_tenant_period", Periods::Table, [
            Periods::TenantId,
            Periods::PeriodKey,
        ])
        .await?;

        manager
            .create_table(
                Table::create()
                    .table(VoucherSequences::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(VoucherSequences::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(VoucherSequences::TenantId).uuid().not_null())
                    .col(
                        ColumnDef::new(VoucherSequences::PeriodKey)
                            .string_len(7)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(VoucherSequences::LastSeq)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .to_owned(),
            )
            .await?;
        unique_index(
            manager,
            "uq_voucher_sequences_tenant_period",
            VoucherSequences::Table,
            [VoucherSequences::TenantId, VoucherSequences::PeriodKey],
        )
        .await?;

        // ============================================================
        // PART 2: VOUCHERS & LINES
        // ============================================================
        manager
            .create_table(
                Table::create()
                    .table(Vouchers::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Vouchers::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Vouchers::TenantId).uuid().not_null())
                    .col(ColumnDef::new(Vouchers::EntityId).uuid().not_null())
                    .col(ColumnDef::new(Vouchers::VoucherNo).string_len(32).not_null())
                    .col(ColumnDef::new(Vouchers::BusinessDate).date().not_null())
                    .col(ColumnDef::new(Vouchers::PeriodKey).string_len(7).not_null())
                    .col(ColumnDef::new(Vouchers::Description).text().not_null())
                    .col(ColumnDef::new(Vouchers::Status).string_len(16).not_null())
                    .col(ColumnDef::new(Vouchers::Source).string_len(16).not_null())
                    .col(ColumnDef::new(Vouchers::SourceEventType).string_len(64))
                    .col(ColumnDef::new(Vouchers::SourceEventId).string_len(128))
                    .col(ColumnDef::new(Vouchers::Attachments).json_binary())
                    .col(ColumnDef::new(Vouchers::BudgetCategory).string_len(64))
                    .col(ColumnDef::new(Vouchers::BudgetAmount).decimal_len(16, 4))
                    .col(
                        ColumnDef::new(Vouchers::TotalDebit)
                            .decimal_len(16, 4)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Vouchers::TotalCredit)
                            .decimal_len(16, 4)
                            .not_null(),
                    )
                    .col(ColumnDef::new(Vouchers::ReversesVoucherId).uuid())
                    .col(ColumnDef::new(Vouchers::ReversedByVoucherId).uuid())
                    .col(ColumnDef::new(Vouchers::StatusReason).text())
                    .col(
                        ColumnDef::new(Vouchers::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Vouchers::PostedAt).timestamp_with_time_zone())
                    .col(
                        ColumnDef::new(Vouchers::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;
        unique_index(manager, "uq_vouchers_tenant_no", Vouchers::Table, [
            Vouchers::TenantId,
            Vouchers::VoucherNo,
        ])
        .await?;
        unique_index(manager, "uq_vouchers_tenant_event", Vouchers::Table, [
            Vouchers::TenantId,
            Vouchers::SourceEventId,
        ])
        .await?;
        index(manager, "idx_vouchers_tenant_date", Vouchers::Table, [
            Vouchers::TenantId,
            Vouchers::BusinessDate,
        ])
        .await?;
        index(manager, "idx_vouchers_tenant_period", Vouchers::Table, [
            Vouchers::TenantId,
            Vouchers::PeriodKey,
        ])
        .await?;

        manager
            .create_table(
                Table::create()
                    .table(VoucherLines::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(VoucherLines::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(VoucherLines::VoucherId).uuid().not_null())
                    .col(ColumnDef::new(VoucherLines::TenantId).uuid().not_null())
                    .col(ColumnDef::new(VoucherLines::EntityId).uuid().not_null())
                    .col(ColumnDef::new(VoucherLines::BusinessDate).date().not_null())
                    .col(ColumnDef::new(VoucherLines::LineNo).integer().not_null())
                    .col(
                        ColumnDef::new(VoucherLines::AccountCode)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(ColumnDef::new(VoucherLines::AccountName).string_len(128))
                    .col(
                        ColumnDef::new(VoucherLines::Debit)
                            .decimal_len(16, 4)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(VoucherLines::Credit)
                            .decimal_len(16, 4)
                            .not_null(),
                    )
                    .col(ColumnDef::new(VoucherLines::Memo).text())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_voucher_lines_voucher")
                            .from(VoucherLines::Table, VoucherLines::VoucherId)
                            .to(Vouchers::Table, Vouchers::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;
        index(manager, "idx_voucher_lines_tenant_date", VoucherLines::Table, [
            VoucherLines::TenantId,
            VoucherLines::BusinessDate,
        ])
        .await?;
        index(manager, "idx_voucher_lines_tenant_account", VoucherLines::Table, [
            VoucherLines::TenantId,
            VoucherLines::AccountCode,
        ])
        .await?;
        index(manager, "idx_voucher_lines_voucher", VoucherLines::Table, [
            VoucherLines::VoucherId,
        ])
        .await?;

        // ============================================================
        // PART 3: BUDGETS
        // ============================================================
        manager
            .create_table(
                Table::create()
                    .table(BudgetControls::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(BudgetControls::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(BudgetControls::TenantId).uuid().not_null())
                    .col(ColumnDef::new(BudgetControls::EntityId).uuid().not_null())
                    .col(
                        ColumnDef::new(BudgetControls::Category)
                            .string_len(64)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(BudgetControls::EnforceCheck)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(BudgetControls::AutoOccupy)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(BudgetControls::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(BudgetControls::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;
        unique_index(manager, "uq_budget_controls_key", BudgetControls::Table, [
            BudgetControls::TenantId,
            BudgetControls::EntityId,
            BudgetControls::Category,
        ])
        .await?;

        manager
            .create_table(
                Table::create()
                    .table(Budgets::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Budgets::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Budgets::TenantId).uuid().not_null())
                    .col(ColumnDef::new(Budgets::EntityId).uuid().not_null())
                    .col(ColumnDef::new(Budgets::Category).string_len(64).not_null())
                    .col(ColumnDef::new(Budgets::PeriodKey).string_len(7).not_null())
                    .col(ColumnDef::new(Budgets::Amount).decimal_len(16, 4).not_null())
                    .col(
                        ColumnDef::new(Budgets::OccupiedAmount)
                            .decimal_len(16, 4)
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Budgets::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Budgets::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;
        unique_index(manager, "uq_budgets_key", Budgets::Table, [
            Budgets::TenantId,
            Budgets::EntityId,
            Budgets::Category,
            Budgets::PeriodKey,
        ])
        .await?;
        index(manager, "idx_budgets_tenant_period", Budgets::Table, [
            Budgets::TenantId,
            Budgets::PeriodKey,
        ])
        .await?;

        manager
            .create_table(
                Table::create()
                    .table(BudgetOccupations::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(BudgetOccupations::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(BudgetOccupations::TenantId).uuid().not_null())
                    .col(ColumnDef::new(BudgetOccupations::BudgetId).uuid().not_null())
                    .col(ColumnDef::new(BudgetOccupations::VoucherId).uuid())
                    .col(
                        ColumnDef::new(BudgetOccupations::Amount)
                            .decimal_len(16, 4)
                            .not_null(),
                    )
                    .col(ColumnDef::new(BudgetOccupations::ReleasedAt).timestamp_with_time_zone())
                    .col(
                        ColumnDef::new(BudgetOccupations::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_budget_occupations_budget")
                            .from(BudgetOccupations::Table, BudgetOccupations::BudgetId)
                            .to(Budgets::Table, Budgets::Id),
                    )
                    .to_owned(),
            )
            .await?;
        index(manager, "idx_budget_occupations_voucher", BudgetOccupations::Table, [
            BudgetOccupations::TenantId,
            BudgetOccupations::VoucherId,
        ])
        .await?;

        // ============================================================
        // PART 4: CASH TRANSACTIONS
        // ============================================================
        manager
            .create_table(
                Table::create()
                    .table(CashTransactions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(CashTransactions::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(CashTransactions::TenantId).uuid().not_null())
                    .col(ColumnDef::new(CashTransactions::EntityId).uuid().not_null())
                    .col(ColumnDef::new(CashTransactions::BusinessDate).date().not_null())
                    .col(
                        ColumnDef::new(CashTransactions::Amount)
                            .decimal_len(16, 4)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CashTransactions::Direction)
                            .string_len(8)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CashTransactions::Account)
                            .string_len(8)
                            .not_null(),
                    )
                    .col(ColumnDef::new(CashTransactions::ExternalRef).string_len(128))
                    .col(ColumnDef::new(CashTransactions::Counterparty).string_len(128))
                    .col(ColumnDef::new(CashTransactions::Memo).text())
                    .col(
                        ColumnDef::new(CashTransactions::MatchStatus)
                            .string_len(16)
                            .not_null(),
                    )
                    .col(ColumnDef::new(CashTransactions::MatchId).string_len(128))
                    .col(ColumnDef::new(CashTransactions::VoucherId).uuid())
                    .col(
                        ColumnDef::new(CashTransactions::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CashTransactions::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;
        index(manager, "idx_cash_transactions_tenant_date", CashTransactions::Table, [
            CashTransactions::TenantId,
            CashTransactions::BusinessDate,
        ])
        .await?;
        index(manager, "idx_cash_transactions_tenant_ref", CashTransactions::Table, [
            CashTransactions::TenantId,
            CashTransactions::ExternalRef,
        ])
        .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(CashTransactions::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(BudgetOccupations::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Budgets::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(BudgetControls::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(VoucherLines::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Vouchers::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(VoucherSequences::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Periods::Table).if_exists().to_owned())
            .await?;
        Ok(())
    }
}

async fn index<T, C, const N: usize>(
    manager: &SchemaManager<'_>,
    name: &str,
    table: T,
    cols: [C; N],
) -> Result<(), DbErr>
where
    T: IntoIden + 'static,
    C: IntoIden + 'static,
{
    let mut stmt = Index::create();
    stmt.name(name).table(table).if_not_exists();
    for col in cols {
        stmt.col(col);
    }
    manager.create_index(stmt).await
}

async fn unique_index<T, C, const N: usize>(
    manager: &SchemaManager<'_>,
    name: &str,
    table: T,
    cols: [C; N],
) -> Result<(), DbErr>
where
    T: IntoIden + 'static,
    C: IntoIden + 'static,
{
    let mut stmt = Index::create();
    stmt.name(name).table(table).unique().if_not_exists();
    for col in cols {
        stmt.col(col);
    }
    manager.create_index(stmt).await
}

#[derive(DeriveIden)]
enum Periods {
    Table,
    Id,
    TenantId,
    PeriodKey,
    StartDate,
    EndDate,
    Status,
    ClosedAt,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum VoucherSequences {
    Table,
    Id,
    TenantId,
    PeriodKey,
    LastSeq,
}

#[derive(DeriveIden)]
enum Vouchers {
    Table,
    Id,
    TenantId,
    EntityId,
    VoucherNo,
    BusinessDate,
    PeriodKey,
    Description,
    Status,
    Source,
    SourceEventType,
    SourceEventId,
    Attachments,
    BudgetCategory,
    BudgetAmount,
    TotalDebit,
    TotalCredit,
    ReversesVoucherId,
    ReversedByVoucherId,
    StatusReason,
    CreatedAt,
    PostedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum VoucherLines {
    Table,
    Id,
    VoucherId,
    TenantId,
    EntityId,
    BusinessDate,
    LineNo,
    AccountCode,
    AccountName,
    Debit,
    Credit,
    Memo,
}

#[derive(DeriveIden)]
enum BudgetControls {
    Table,
    Id,
    TenantId,
    EntityId,
    Category,
    EnforceCheck,
    AutoOccupy,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Budgets {
    Table,
    Id,
    TenantId,
    EntityId,
    Category,
    PeriodKey,
    Amount,
    OccupiedAmount,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum BudgetOccupations {
    Table,
    Id,
    TenantId,
    BudgetId,
    VoucherId,
    Amount,
    ReleasedAt,
    CreatedAt,
}

#[derive(DeriveIden)]
enum CashTransactions {
    Table,
    Id,
    TenantId,
    EntityId,
    BusinessDate,
    Amount,
    Direction,
    Account,
    ExternalRef,
    Counterparty,
    Memo,
    MatchStatus,
    MatchId,
    VoucherId,
    CreatedAt,
    UpdatedAt,
}
