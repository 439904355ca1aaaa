//! Ledger query repository.
//!
//! Balances are folded from the same entry rows `entries()` returns, so the
//! two can never disagree for the same filter.

use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
};
use tally_core::LedgerError;
use tally_core::ledger::{AccountBalance, LedgerEntry, LedgerFilter, LedgerQuery, aggregate_balances};
use tally_shared::types::{EntityId, TenantId, VoucherId};

use crate::entities::{sea_orm_active_enums, voucher_lines, vouchers};
use crate::error::db_err;

/// Ledger query repository.
#[derive(Debug, Clone)]
pub struct LedgerRepository {
    db: DatabaseConnection,
}

impl LedgerRepository {
    /// Creates a new ledger repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Itemized lines with their voucher references, oldest first.
    pub async fn entries(
        &self,
        tenant_id: TenantId,
        filter: LedgerFilter,
    ) -> Result<Vec<LedgerEntry>, LedgerError> {
        let query = filter.resolve()?;
        load_entries(&self.db, tenant_id, &query).await
    }

    /// One balance row per account, `debit - credit`.
    pub async fn balances(
        &self,
        tenant_id: TenantId,
        filter: LedgerFilter,
    ) -> Result<Vec<AccountBalance>, LedgerError> {
        let query = filter.resolve()?;
        let entries = load_entries(&self.db, tenant_id, &query).await?;
        Ok(aggregate_balances(&entries))
    }
}

/// Loads the ledger entries matching `query`.
pub(crate) async fn load_entries<C: ConnectionTrait>(
    conn: &C,
    tenant_id: TenantId,
    query: &LedgerQuery,
) -> Result<Vec<LedgerEntry>, LedgerError> {
    let statuses = query
        .statuses()
        .iter()
        .map(|s| sea_orm_active_enums::VoucherStatus::from(*s));

    let mut select = voucher_lines::Entity::find()
        .find_also_related(vouchers::Entity)
        .filter(voucher_lines::Column::TenantId.eq(tenant_id.into_inner()))
        .filter(vouchers::Column::Status.is_in(statuses));

    if let Some(entity_id) = query.entity_id {
        select = select.filter(voucher_lines::Column::EntityId.eq(entity_id.into_inner()));
    }
    if let Some(account_code) = query.account_code.as_deref() {
        select = select.filter(voucher_lines::Column::AccountCode.eq(account_code));
    }
    if let Some(date_from) = query.date_from {
        select = select.filter(voucher_lines::Column::BusinessDate.gte(date_from));
    }
    if let Some(date_to) = query.date_to {
        select = select.filter(voucher_lines::Column::BusinessDate.lte(date_to));
    }

    let rows = select
        .order_by_asc(voucher_lines::Column::BusinessDate)
        .order_by_asc(vouchers::Column::VoucherNo)
        .order_by_asc(voucher_lines::Column::LineNo)
        .all(conn)
        .await
        .map_err(db_err)?;

    rows.into_iter()
        .filter_map(|(line, voucher)| voucher.map(|v| to_entry(line, v)))
        .collect()
}

fn to_entry(line: voucher_lines::Model, voucher: vouchers::Model) -> Result<LedgerEntry, LedgerError> {
    Ok(LedgerEntry {
        voucher_id: VoucherId::from_uuid(voucher.id),
        voucher_no: voucher.voucher_no,
        entity_id: EntityId::from_uuid(line.entity_id),
        business_date: line.business_date,
        status: voucher.status.into(),
        line_no: u32::try_from(line.line_no)
            .map_err(|_| LedgerError::Internal(format!("line number {}", line.line_no)))?,
        account_code: line.account_code,
        account_name: line.account_name,
        debit: line.debit,
        credit: line.credit,
        memo: line.memo,
        reverses_voucher_id: voucher.reverses_voucher_id.map(VoucherId::from_uuid),
    })
}
