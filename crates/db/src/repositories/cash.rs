//! Cash transaction repository.
//!
//! Creating a movement with `generate_voucher` writes the cash row and its
//! draft voucher in one transaction. Match and unmatch never touch the
//! linked voucher.

use chrono::{NaiveDate, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use tally_core::LedgerError;
use tally_core::cash::{
    CashService, CashTransaction, CashTransactionInput, ImportDecision, ImportPlanner,
    ImportReport, ImportRowStatus, MatchStatus,
};
use tally_core::voucher::VoucherStatus;
use tally_shared::types::{
    CashTransactionId, EntityId, PageRequest, PageResponse, TenantId, VoucherId,
};
use tally_shared::{AccountMapping, RetryConfig};
use tracing::{info, warn};

use super::period::guard_open;
use super::voucher::insert_voucher;
use crate::entities::{cash_transactions, sea_orm_active_enums};
use crate::error::db_err;
use crate::retry::with_retry;

/// Filters for listing cash transactions.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CashFilter {
    /// Only this entity.
    #[serde(default)]
    pub entity_id: Option<EntityId>,
    /// Only this match status.
    #[serde(default)]
    pub match_status: Option<MatchStatus>,
    /// Business date lower bound, inclusive.
    #[serde(default)]
    pub date_from: Option<NaiveDate>,
    /// Business date upper bound, inclusive.
    #[serde(default)]
    pub date_to: Option<NaiveDate>,
}

/// Cash transaction repository.
#[derive(Debug, Clone)]
pub struct CashRepository {
    db: DatabaseConnection,
    accounts: AccountMapping,
    retry: RetryConfig,
}

impl CashRepository {
    /// Creates a new cash repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection, accounts: AccountMapping, retry: RetryConfig) -> Self {
        Self {
            db,
            accounts,
            retry,
        }
    }

    /// Records a movement, optionally generating its draft voucher.
    ///
    /// # Errors
    ///
    /// `PeriodClosed` when the business date lies in a closed period.
    pub async fn create(
        &self,
        tenant_id: TenantId,
        input: CashTransactionInput,
        generate_voucher: bool,
    ) -> Result<CashTransaction, LedgerError> {
        CashService::validate(&input)?;
        let input = &input;

        with_retry(&self.retry, "create_cash_transaction", || async move {
            let txn = self.db.begin().await.map_err(db_err)?;
            guard_open(&txn, tenant_id, input.business_date).await?;

            let voucher_id = if generate_voucher {
                let draft = CashService::voucher_draft(input, &self.accounts);
                let voucher =
                    insert_voucher(&txn, tenant_id, &draft, VoucherStatus::Draft, None).await?;
                Some(voucher.id)
            } else {
                None
            };

            let now = Utc::now().into();
            let row = cash_transactions::ActiveModel {
                id: Set(CashTransactionId::new().into_inner()),
                tenant_id: Set(tenant_id.into_inner()),
                entity_id: Set(input.entity_id.into_inner()),
                business_date: Set(input.business_date),
                amount: Set(input.amount),
                direction: Set(input.direction.into()),
                account: Set(input.account.into()),
                external_ref: Set(input.external_ref.as_deref().map(|r| r.trim().to_string())),
                counterparty: Set(input.counterparty.clone()),
                memo: Set(input.memo.clone()),
                match_status: Set(sea_orm_active_enums::MatchStatus::Pending),
                match_id: Set(None),
                voucher_id: Set(voucher_id.map(VoucherId::into_inner)),
                created_at: Set(now),
                updated_at: Set(now),
            }
            .insert(&txn)
            .await
            .map_err(db_err)?;
            txn.commit().await.map_err(db_err)?;

            info!(
                tenant_id = %tenant_id,
                cash_transaction_id = %row.id,
                voucher_id = ?voucher_id,
                "Cash transaction recorded"
            );
            Ok(to_cash_transaction(row))
        })
        .await
    }

    /// Returns one movement.
    pub async fn get(
        &self,
        tenant_id: TenantId,
        id: CashTransactionId,
    ) -> Result<CashTransaction, LedgerError> {
        self.find(tenant_id, id).await.map(to_cash_transaction)
    }

    /// Lists movements, newest first.
    pub async fn list(
        &self,
        tenant_id: TenantId,
        filter: &CashFilter,
        page: &PageRequest,
    ) -> Result<PageResponse<CashTransaction>, LedgerError> {
        let page = PageRequest::new(page.page, page.per_page);
        let mut query = cash_transactions::Entity::find()
            .filter(cash_transactions::Column::TenantId.eq(tenant_id.into_inner()));
        if let Some(entity_id) = filter.entity_id {
            query = query.filter(cash_transactions::Column::EntityId.eq(entity_id.into_inner()));
        }
        if let Some(status) = filter.match_status {
            query = query.filter(
                cash_transactions::Column::MatchStatus
                    .eq(sea_orm_active_enums::MatchStatus::from(status)),
            );
        }
        if let Some(date_from) = filter.date_from {
            query = query.filter(cash_transactions::Column::BusinessDate.gte(date_from));
        }
        if let Some(date_to) = filter.date_to {
            query = query.filter(cash_transactions::Column::BusinessDate.lte(date_to));
        }

        let total = query.clone().count(&self.db).await.map_err(db_err)?;
        let data = query
            .order_by_desc(cash_transactions::Column::BusinessDate)
            .order_by_desc(cash_transactions::Column::CreatedAt)
            .offset(page.offset())
            .limit(page.limit())
            .all(&self.db)
            .await
            .map_err(db_err)?
            .into_iter()
            .map(to_cash_transaction)
            .collect();

        Ok(PageResponse::new(data, page.page, page.per_page, total))
    }

    /// Marks a movement as matched against an external flow.
    pub async fn match_transaction(
        &self,
        tenant_id: TenantId,
        id: CashTransactionId,
        match_id: &str,
    ) -> Result<CashTransaction, LedgerError> {
        let match_id = CashService::validate_match_id(match_id)?;
        let row = self.find(tenant_id, id).await?;

        let mut active: cash_transactions::ActiveModel = row.into();
        active.match_status = Set(sea_orm_active_enums::MatchStatus::Matched);
        active.match_id = Set(Some(match_id.to_string()));
        active.updated_at = Set(Utc::now().into());
        let row = active.update(&self.db).await.map_err(db_err)?;

        info!(tenant_id = %tenant_id, cash_transaction_id = %id, match_id, "Cash transaction matched");
        Ok(to_cash_transaction(row))
    }

    /// Clears the match of a movement.
    pub async fn unmatch(
        &self,
        tenant_id: TenantId,
        id: CashTransactionId,
    ) -> Result<CashTransaction, LedgerError> {
        let row = self.find(tenant_id, id).await?;

        let mut active: cash_transactions::ActiveModel = row.into();
        active.match_status = Set(sea_orm_active_enums::MatchStatus::Pending);
        active.match_id = Set(None);
        active.updated_at = Set(Utc::now().into());
        let row = active.update(&self.db).await.map_err(db_err)?;

        info!(tenant_id = %tenant_id, cash_transaction_id = %id, "Cash transaction unmatched");
        Ok(to_cash_transaction(row))
    }

    /// Imports a batch. Each row is its own transaction; a bad row is
    /// reported and the rest of the batch continues.
    pub async fn import(
        &self,
        tenant_id: TenantId,
        rows: Vec<CashTransactionInput>,
        skip_duplicate: bool,
        generate_voucher: bool,
    ) -> Result<ImportReport, LedgerError> {
        let mut planner = ImportPlanner::new(skip_duplicate);
        let mut report = ImportReport::default();

        for (index, row) in rows.into_iter().enumerate() {
            let external_ref = row.external_ref.clone();
            let exists = match (planner.dedupes(), external_ref.as_deref()) {
                (true, Some(reference)) => match self.reference_exists(tenant_id, reference).await {
                    Ok(exists) => exists,
                    Err(err) => {
                        warn!(tenant_id = %tenant_id, index, error = %err, "Cash import lookup failed");
                        report.record(
                            index,
                            external_ref,
                            ImportRowStatus::Failed {
                                error: err.to_string(),
                            },
                        );
                        continue;
                    }
                },
                _ => false,
            };

            let status = match planner.decide(&row, exists) {
                ImportDecision::SkipDuplicate(reason) => ImportRowStatus::Skipped { reason },
                ImportDecision::Reject(error) => ImportRowStatus::Failed { error },
                ImportDecision::Insert => match self.create(tenant_id, row, generate_voucher).await {
                    Ok(created) => ImportRowStatus::Imported { id: created.id },
                    Err(err) => {
                        warn!(tenant_id = %tenant_id, index, error = %err, "Cash import row failed");
                        ImportRowStatus::Failed {
                            error: err.to_string(),
                        }
                    }
                },
            };
            report.record(index, external_ref, status);
        }

        info!(
            tenant_id = %tenant_id,
            imported = report.imported,
            skipped = report.skipped,
            failed = report.failed,
            "Cash import finished"
        );
        Ok(report)
    }

    async fn reference_exists(&self, tenant_id: TenantId, reference: &str) -> Result<bool, LedgerError> {
        let count = cash_transactions::Entity::find()
            .filter(cash_transactions::Column::TenantId.eq(tenant_id.into_inner()))
            .filter(cash_transactions::Column::ExternalRef.eq(reference.trim()))
            .count(&self.db)
            .await
            .map_err(db_err)?;
        Ok(count > 0)
    }

    async fn find(
        &self,
        tenant_id: TenantId,
        id: CashTransactionId,
    ) -> Result<cash_transactions::Model, LedgerError> {
        cash_transactions::Entity::find_by_id(id.into_inner())
            .filter(cash_transactions::Column::TenantId.eq(tenant_id.into_inner()))
            .one(&self.db)
            .await
            .map_err(db_err)?
            .ok_or_else(|| LedgerError::not_found("cash_transaction", id.to_string()))
    }
}

fn to_cash_transaction(row: cash_transactions::Model) -> CashTransaction {
    CashTransaction {
        id: CashTransactionId::from_uuid(row.id),
        tenant_id: TenantId::from_uuid(row.tenant_id),
        entity_id: EntityId::from_uuid(row.entity_id),
        business_date: row.business_date,
        amount: row.amount,
        direction: row.direction.into(),
        account: row.account.into(),
        external_ref: row.external_ref,
        counterparty: row.counterparty,
        memo: row.memo,
        match_status: row.match_status.into(),
        match_id: row.match_id,
        voucher_id: row.voucher_id.map(VoucherId::from_uuid),
        created_at: row.created_at.with_timezone(&Utc),
        updated_at: row.updated_at.with_timezone(&Utc),
    }
}
