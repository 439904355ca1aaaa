//! Consolidated balances across the entities of a tenant.
//!
//! The per-entity breakdown is paged by entity id; each page is computed
//! with the same query the ledger endpoints use. Cancellation is checked
//! around every query, and a cancelled request returns no data at all.

use std::future::Future;

use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, QuerySelect,
};
use tally_core::LedgerError;
use tally_core::ledger::{
    ConsolidatedReport, ConsolidationService, EntityBalances, GroupBy, LedgerFilter, LedgerQuery,
    aggregate_balances,
};
use tally_core::period::PeriodKey;
use tally_shared::ConsolidationConfig;
use tally_shared::types::{EntityId, TenantId};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use uuid::Uuid;

use super::ledger::load_entries;
use crate::entities::{sea_orm_active_enums, vouchers};
use crate::error::db_err;

/// A consolidation request.
#[derive(Debug, Clone)]
pub struct ConsolidationRequest {
    /// Period to consolidate.
    pub period_key: PeriodKey,
    /// Per-entity breakdown or a single summed list.
    pub group_by: GroupBy,
    /// Continue after this entity (from `next_cursor`).
    pub cursor: Option<EntityId>,
    /// Page size override; the configured page size otherwise.
    pub limit: Option<u64>,
}

/// Consolidation repository.
#[derive(Debug, Clone)]
pub struct ConsolidationRepository {
    db: DatabaseConnection,
    config: ConsolidationConfig,
}

impl ConsolidationRepository {
    /// Creates a new consolidation repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection, config: ConsolidationConfig) -> Self {
        Self { db, config }
    }

    /// Consolidates posted balances of `request.period_key`.
    ///
    /// # Errors
    ///
    /// `Cancelled` if `cancel` fires before the report is complete.
    pub async fn consolidated(
        &self,
        tenant_id: TenantId,
        request: ConsolidationRequest,
        cancel: &CancellationToken,
    ) -> Result<ConsolidatedReport, LedgerError> {
        let query = LedgerFilter {
            period: Some(request.period_key),
            ..LedgerFilter::default()
        }
        .resolve()?;

        let limit = match request.group_by {
            GroupBy::Entity => Some(request.limit.unwrap_or(self.config.page_size).max(1)),
            GroupBy::None => None,
        };

        let mut entity_ids = cancellable(
            cancel,
            self.entity_ids(tenant_id, &query, request.period_key, request.cursor, limit),
        )
        .await?;
        let page_size = limit.map(|l| usize::try_from(l).unwrap_or(usize::MAX));
        let has_more = page_size.is_some_and(|size| entity_ids.len() > size);
        if let Some(size) = page_size {
            entity_ids.truncate(size);
        }

        let mut per_entity = Vec::with_capacity(entity_ids.len());
        for entity_id in entity_ids {
            let entries = cancellable(
                cancel,
                load_entries(&self.db, tenant_id, &query.for_entity(entity_id)),
            )
            .await?;
            per_entity.push(EntityBalances {
                entity_id,
                balances: aggregate_balances(&entries),
            });
        }

        let report = match request.group_by {
            GroupBy::Entity => {
                ConsolidationService::entity_page(request.period_key, per_entity, has_more)
            }
            GroupBy::None => ConsolidationService::summed(request.period_key, &per_entity),
        };

        info!(
            tenant_id = %tenant_id,
            period_key = %request.period_key,
            group_by = %request.group_by,
            entities = report.entities.len(),
            "Consolidated report built"
        );
        Ok(report)
    }

    /// Entities with ledger-visible vouchers in the period, ordered by id, after
    /// `cursor`. Fetches one extra id so the caller can tell whether more
    /// pages exist.
    async fn entity_ids(
        &self,
        tenant_id: TenantId,
        query: &LedgerQuery,
        period_key: PeriodKey,
        cursor: Option<EntityId>,
        limit: Option<u64>,
    ) -> Result<Vec<EntityId>, LedgerError> {
        let visible = query
            .statuses()
            .iter()
            .map(|s| sea_orm_active_enums::VoucherStatus::from(*s));

        let mut select = vouchers::Entity::find()
            .select_only()
            .column(vouchers::Column::EntityId)
            .distinct()
            .filter(vouchers::Column::TenantId.eq(tenant_id.into_inner()))
            .filter(vouchers::Column::PeriodKey.eq(period_key.to_string()))
            .filter(vouchers::Column::Status.is_in(visible))
            .order_by_asc(vouchers::Column::EntityId);
        if let Some(cursor) = cursor {
            select = select.filter(vouchers::Column::EntityId.gt(cursor.into_inner()));
        }
        if let Some(limit) = limit {
            select = select.limit(limit + 1);
        }

        let ids: Vec<Uuid> = select.into_tuple().all(&self.db).await.map_err(db_err)?;
        debug!(tenant_id = %tenant_id, count = ids.len(), "Consolidation entities loaded");
        Ok(ids.into_iter().map(EntityId::from_uuid).collect())
    }
}

async fn cancellable<T>(
    cancel: &CancellationToken,
    fut: impl Future<Output = Result<T, LedgerError>>,
) -> Result<T, LedgerError> {
    tokio::select! {
        biased;
        () = cancel.cancelled() => Err(LedgerError::Cancelled),
        result = fut => result,
    }
}
