//! Period repository: the lock every ledger mutation goes through.
//!
//! Period rows are created lazily the first time anything touches the
//! month. Mutations take a shared lock on the `(tenant, period)` row, so a
//! concurrent close (which takes an exclusive lock) either waits for them or
//! makes them fail the guard. Nothing here ever locks a whole tenant.

use chrono::{NaiveDate, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DatabaseTransaction,
    EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use tally_core::LedgerError;
use tally_core::period::{Period, PeriodChange, PeriodGuard, PeriodKey, PeriodStatus};
use tally_core::voucher::VoucherStatus;
use tally_shared::RetryConfig;
use tally_shared::types::TenantId;
use tracing::info;
use uuid::Uuid;

use crate::entities::{periods, sea_orm_active_enums, vouchers};
use crate::error::db_err;
use crate::retry::with_retry;

/// Row lock taken on a period.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PeriodLock {
    /// Held by voucher, budget and cash mutations.
    Shared,
    /// Held by close and reopen.
    Exclusive,
}

/// Period repository.
#[derive(Debug, Clone)]
pub struct PeriodRepository {
    db: DatabaseConnection,
    retry: RetryConfig,
}

impl PeriodRepository {
    /// Creates a new period repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection, retry: RetryConfig) -> Self {
        Self { db, retry }
    }

    /// Lists natural-month periods from `from` to `to`, including months
    /// that have never been touched (reported as open).
    pub async fn list(
        &self,
        tenant_id: TenantId,
        from: PeriodKey,
        to: PeriodKey,
    ) -> Result<Vec<Period>, LedgerError> {
        let stored = periods::Entity::find()
            .filter(periods::Column::TenantId.eq(tenant_id.into_inner()))
            .filter(periods::Column::PeriodKey.gte(from.to_string()))
            .filter(periods::Column::PeriodKey.lte(to.to_string()))
            .order_by_asc(periods::Column::PeriodKey)
            .all(&self.db)
            .await
            .map_err(db_err)?
            .into_iter()
            .map(to_period)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Period::merge_range(from, to, stored))
    }

    /// Returns one period, derived if it was never stored.
    pub async fn get(&self, tenant_id: TenantId, key: PeriodKey) -> Result<Period, LedgerError> {
        let stored = periods::Entity::find()
            .filter(periods::Column::TenantId.eq(tenant_id.into_inner()))
            .filter(periods::Column::PeriodKey.eq(key.to_string()))
            .one(&self.db)
            .await
            .map_err(db_err)?;
        stored.map_or_else(|| Ok(Period::derived(key)), to_period)
    }

    /// Stores the period if it does not exist yet. Idempotent.
    pub async fn create(&self, tenant_id: TenantId, key: PeriodKey) -> Result<Period, LedgerError> {
        with_retry(&self.retry, "create_period", || async move {
            let txn = self.db.begin().await.map_err(db_err)?;
            let row = lock_period(&txn, tenant_id, key, PeriodLock::Shared).await?;
            txn.commit().await.map_err(db_err)?;
            to_period(row)
        })
        .await
    }

    /// Closes a period.
    ///
    /// # Errors
    ///
    /// `PeriodHasDrafts` while any draft voucher is dated inside the period.
    /// Closing a closed period succeeds without change.
    pub async fn close(&self, tenant_id: TenantId, key: PeriodKey) -> Result<Period, LedgerError> {
        with_retry(&self.retry, "close_period", || async move {
            let txn = self.db.begin().await.map_err(db_err)?;
            let row = lock_period(&txn, tenant_id, key, PeriodLock::Exclusive).await?;
            let drafts = count_drafts(&txn, tenant_id, key).await?;

            let row = match PeriodGuard::close(key, row.status.into(), drafts)? {
                PeriodChange::Apply(status) => set_status(&txn, row, status).await?,
                PeriodChange::Unchanged => row,
            };
            txn.commit().await.map_err(db_err)?;

            info!(tenant_id = %tenant_id, period_key = %key, "Period closed");
            to_period(row)
        })
        .await
    }

    /// Reopens a period. Privileged: the caller is responsible for checking
    /// the requester may do this.
    pub async fn reopen(&self, tenant_id: TenantId, key: PeriodKey) -> Result<Period, LedgerError> {
        with_retry(&self.retry, "reopen_period", || async move {
            let txn = self.db.begin().await.map_err(db_err)?;
            let row = lock_period(&txn, tenant_id, key, PeriodLock::Exclusive).await?;

            let row = match PeriodGuard::reopen(row.status.into()) {
                PeriodChange::Apply(status) => set_status(&txn, row, status).await?,
                PeriodChange::Unchanged => row,
            };
            txn.commit().await.map_err(db_err)?;

            info!(tenant_id = %tenant_id, period_key = %key, "Period reopened");
            to_period(row)
        })
        .await
    }
}

/// Re-checks inside `txn` that the period holding `business_date` is open,
/// and keeps it open until `txn` ends.
pub(crate) async fn guard_open(
    txn: &DatabaseTransaction,
    tenant_id: TenantId,
    business_date: NaiveDate,
) -> Result<(), LedgerError> {
    let key = PeriodKey::from_date(business_date);
    let row = lock_period(txn, tenant_id, key, PeriodLock::Shared).await?;
    PeriodGuard::ensure_open(row.status.into(), business_date)
}

async fn lock_period(
    txn: &DatabaseTransaction,
    tenant_id: TenantId,
    key: PeriodKey,
    lock: PeriodLock,
) -> Result<periods::Model, LedgerError> {
    let query = periods::Entity::find()
        .filter(periods::Column::TenantId.eq(tenant_id.into_inner()))
        .filter(periods::Column::PeriodKey.eq(key.to_string()));
    let query = match lock {
        PeriodLock::Shared => query.lock_shared(),
        PeriodLock::Exclusive => query.lock_exclusive(),
    };

    if let Some(row) = query.one(txn).await.map_err(db_err)? {
        return Ok(row);
    }

    // A concurrent insert of the same month loses on the unique index and
    // surfaces as a retryable conflict.
    let now = Utc::now().into();
    periods::ActiveModel {
        id: Set(Uuid::now_v7()),
        tenant_id: Set(tenant_id.into_inner()),
        period_key: Set(key.to_string()),
        start_date: Set(key.start_date()),
        end_date: Set(key.end_date()),
        status: Set(sea_orm_active_enums::PeriodStatus::Open),
        closed_at: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(txn)
    .await
    .map_err(db_err)
}

async fn count_drafts<C: ConnectionTrait>(
    conn: &C,
    tenant_id: TenantId,
    key: PeriodKey,
) -> Result<u64, LedgerError> {
    vouchers::Entity::find()
        .filter(vouchers::Column::TenantId.eq(tenant_id.into_inner()))
        .filter(vouchers::Column::BusinessDate.gte(key.start_date()))
        .filter(vouchers::Column::BusinessDate.lte(key.end_date()))
        .filter(
            vouchers::Column::Status.eq(sea_orm_active_enums::VoucherStatus::from(
                VoucherStatus::Draft,
            )),
        )
        .count(conn)
        .await
        .map_err(db_err)
}

async fn set_status(
    txn: &DatabaseTransaction,
    row: periods::Model,
    status: PeriodStatus,
) -> Result<periods::Model, LedgerError> {
    let now = Utc::now();
    let mut active: periods::ActiveModel = row.into();
    active.status = Set(status.into());
    active.closed_at = Set(match status {
        PeriodStatus::Closed => Some(now.into()),
        PeriodStatus::Open => None,
    });
    active.updated_at = Set(now.into());
    active.update(txn).await.map_err(db_err)
}

fn to_period(row: periods::Model) -> Result<Period, LedgerError> {
    let period_key = row
        .period_key
        .parse::<PeriodKey>()
        .map_err(|e| LedgerError::Internal(format!("stored period key: {e}")))?;
    Ok(Period {
        period_key,
        start_date: row.start_date,
        end_date: row.end_date,
        status: row.status.into(),
        closed_at: row.closed_at.map(|t| t.with_timezone(&Utc)),
        persisted: true,
    })
}
