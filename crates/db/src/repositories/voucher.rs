//! Voucher repository: creation, the status workflow and red-flush.
//!
//! Every mutation runs as one database transaction:
//! 1. lock the voucher row (for transitions)
//! 2. re-check the period guard under a shared period lock
//! 3. apply budget occupation or release
//! 4. write the new state
//!
//! A failed guard drops the transaction, so nothing is written.

use std::collections::HashMap;

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DatabaseTransaction,
    EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use tally_core::LedgerError;
use tally_core::budget::{BudgetControlConfig, BudgetKey, BudgetService, PostingBudgetRequest};
use tally_core::period::PeriodKey;
use tally_core::voucher::{
    ReversalService, Voucher, VoucherDraft, VoucherLine, VoucherSource, VoucherStatus,
    VoucherTotals, VoucherWorkflow, format_voucher_no, has_rounding_drift, validate_draft,
};
use tally_shared::RetryConfig;
use tally_shared::types::{EntityId, PageRequest, PageResponse, TenantId, VoucherId};
use tracing::{info, warn};
use uuid::Uuid;

use super::budget::{enforce_in_txn, find_control, occupy_in_txn, release_voucher_in_txn};
use super::period::guard_open;
use crate::entities::{sea_orm_active_enums, voucher_lines, voucher_sequences, vouchers};
use crate::error::db_err;
use crate::retry::with_retry;

/// Filters for listing vouchers.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VoucherFilter {
    /// Only vouchers in this status.
    #[serde(default)]
    pub status: Option<VoucherStatus>,
    /// Only vouchers of this entity.
    #[serde(default)]
    pub entity_id: Option<EntityId>,
    /// Only vouchers in this period.
    #[serde(default)]
    pub period: Option<PeriodKey>,
    /// Business date lower bound, inclusive.
    #[serde(default)]
    pub date_from: Option<NaiveDate>,
    /// Business date upper bound, inclusive.
    #[serde(default)]
    pub date_to: Option<NaiveDate>,
    /// Source kind: `manual`, `event`, `cash` or `red_flush`.
    #[serde(default)]
    pub source: Option<String>,
}

/// Result of a red-flush: the original and its posted reversal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedFlushOutcome {
    /// The original voucher, now linked to its reversal.
    pub original: Voucher,
    /// The reversal voucher.
    pub reversal: Voucher,
}

/// Voucher repository.
#[derive(Debug, Clone)]
pub struct VoucherRepository {
    db: DatabaseConnection,
    retry: RetryConfig,
}

impl VoucherRepository {
    /// Creates a new voucher repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection, retry: RetryConfig) -> Self {
        Self { db, retry }
    }

    /// Creates a draft voucher.
    ///
    /// # Errors
    ///
    /// - `Validation` for an unbalanced or malformed voucher
    /// - `PeriodClosed` when the business date lies in a closed period
    pub async fn create_draft(
        &self,
        tenant_id: TenantId,
        draft: VoucherDraft,
    ) -> Result<Voucher, LedgerError> {
        validate_draft(&draft)?;
        let draft = &draft;

        with_retry(&self.retry, "create_voucher", || async move {
            let txn = self.db.begin().await.map_err(db_err)?;
            let voucher = insert_voucher(&txn, tenant_id, draft, VoucherStatus::Draft, None).await?;
            txn.commit().await.map_err(db_err)?;

            info!(
                tenant_id = %tenant_id,
                voucher_id = %voucher.id,
                voucher_no = %voucher.voucher_no,
                "Voucher created"
            );
            Ok(voucher)
        })
        .await
    }

    /// Returns one voucher with its lines.
    pub async fn get(&self, tenant_id: TenantId, id: VoucherId) -> Result<Voucher, LedgerError> {
        load_voucher(&self.db, tenant_id, id, false).await
    }

    /// Lists vouchers, newest business date first.
    pub async fn list(
        &self,
        tenant_id: TenantId,
        filter: &VoucherFilter,
        page: &PageRequest,
    ) -> Result<PageResponse<Voucher>, LedgerError> {
        let page = PageRequest::new(page.page, page.per_page);
        let mut query =
            vouchers::Entity::find().filter(vouchers::Column::TenantId.eq(tenant_id.into_inner()));

        if let Some(status) = filter.status {
            query = query.filter(
                vouchers::Column::Status.eq(sea_orm_active_enums::VoucherStatus::from(status)),
            );
        }
        if let Some(entity_id) = filter.entity_id {
            query = query.filter(vouchers::Column::EntityId.eq(entity_id.into_inner()));
        }
        if let Some(period) = filter.period {
            query = query.filter(vouchers::Column::PeriodKey.eq(period.to_string()));
        }
        if let Some(date_from) = filter.date_from {
            query = query.filter(vouchers::Column::BusinessDate.gte(date_from));
        }
        if let Some(date_to) = filter.date_to {
            query = query.filter(vouchers::Column::BusinessDate.lte(date_to));
        }
        if let Some(source) = filter.source.as_deref() {
            query = query.filter(vouchers::Column::Source.eq(source));
        }

        let total = query.clone().count(&self.db).await.map_err(db_err)?;
        let rows = query
            .order_by_desc(vouchers::Column::BusinessDate)
            .order_by_desc(vouchers::Column::VoucherNo)
            .offset(page.offset())
            .limit(page.limit())
            .all(&self.db)
            .await
            .map_err(db_err)?;

        let ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();
        let mut lines_by_voucher: HashMap<Uuid, Vec<voucher_lines::Model>> = HashMap::new();
        for line in voucher_lines::Entity::find()
            .filter(voucher_lines::Column::VoucherId.is_in(ids))
            .order_by_asc(voucher_lines::Column::LineNo)
            .all(&self.db)
            .await
            .map_err(db_err)?
        {
            lines_by_voucher.entry(line.voucher_id).or_default().push(line);
        }

        let data = rows
            .into_iter()
            .map(|row| {
                let lines = lines_by_voucher.remove(&row.id).unwrap_or_default();
                to_voucher(row, lines)
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(PageResponse::new(data, page.page, page.per_page, total))
    }

    /// Moves a voucher to `target`.
    ///
    /// Posting occupies or checks the voucher's budget claim according to
    /// the budget control and `budget`. Voiding a posted voucher releases
    /// what it occupied.
    ///
    /// # Errors
    ///
    /// - `InvalidTransition` when the state machine forbids the move
    /// - `PeriodClosed` when the voucher's period is closed
    /// - `BudgetExceeded` / `BudgetNotFound` from the budget guard
    pub async fn transition(
        &self,
        tenant_id: TenantId,
        id: VoucherId,
        target: VoucherStatus,
        reason: Option<&str>,
        budget: PostingBudgetRequest,
    ) -> Result<Voucher, LedgerError> {
        with_retry(&self.retry, "transition_voucher", || async move {
            let txn = self.db.begin().await.map_err(db_err)?;
            let voucher = transition_in_txn(&txn, tenant_id, id, target, reason, budget).await?;
            txn.commit().await.map_err(db_err)?;
            Ok(voucher)
        })
        .await
    }

    /// Voids a draft or posted voucher.
    pub async fn void(
        &self,
        tenant_id: TenantId,
        id: VoucherId,
        reason: Option<&str>,
    ) -> Result<Voucher, LedgerError> {
        self.transition(
            tenant_id,
            id,
            VoucherStatus::Voided,
            reason,
            PostingBudgetRequest::default(),
        )
        .await
    }

    /// Red-flushes a posted voucher: records a posted mirror voucher with
    /// debit and credit swapped and links the two.
    ///
    /// The reversal is dated `business_date`, or the original's date. The
    /// period guard applies to the reversal's date.
    pub async fn red_flush(
        &self,
        tenant_id: TenantId,
        id: VoucherId,
        business_date: Option<NaiveDate>,
        reason: Option<&str>,
    ) -> Result<RedFlushOutcome, LedgerError> {
        with_retry(&self.retry, "red_flush_voucher", || async move {
            let txn = self.db.begin().await.map_err(db_err)?;
            let original = load_voucher(&txn, tenant_id, id, true).await?;
            let draft = ReversalService::build_reversal(&original, business_date, reason)?;

            let reversal =
                insert_voucher(&txn, tenant_id, &draft, VoucherStatus::Posted, Some(original.id))
                    .await?;

            let now = Utc::now().into();
            vouchers::ActiveModel {
                id: Set(original.id.into_inner()),
                reversed_by_voucher_id: Set(Some(reversal.id.into_inner())),
                updated_at: Set(now),
                ..Default::default()
            }
            .update(&txn)
            .await
            .map_err(db_err)?;
            release_voucher_in_txn(&txn, tenant_id, original.id).await?;

            let original = load_voucher(&txn, tenant_id, id, false).await?;
            txn.commit().await.map_err(db_err)?;

            info!(
                tenant_id = %tenant_id,
                voucher_id = %original.id,
                reversal_id = %reversal.id,
                "Voucher red-flushed"
            );
            Ok(RedFlushOutcome { original, reversal })
        })
        .await
    }
}

/// Applies a status change inside `txn`.
pub(crate) async fn transition_in_txn(
    txn: &DatabaseTransaction,
    tenant_id: TenantId,
    id: VoucherId,
    target: VoucherStatus,
    reason: Option<&str>,
    budget: PostingBudgetRequest,
) -> Result<Voucher, LedgerError> {
    let voucher = load_voucher(txn, tenant_id, id, true).await?;
    let next = VoucherWorkflow::transition(voucher.status, target, reason)?;
    if next == VoucherStatus::Voided {
        ReversalService::ensure_voidable(&voucher)?;
    }
    guard_open(txn, tenant_id, voucher.business_date).await?;

    match (voucher.status, next) {
        (_, VoucherStatus::Posted) => apply_budget_on_post(txn, tenant_id, &voucher, budget).await?,
        (VoucherStatus::Posted, VoucherStatus::Voided) => {
            release_voucher_in_txn(txn, tenant_id, voucher.id).await?;
        }
        _ => {}
    }

    let now = Utc::now();
    let reason = reason.map(str::trim).filter(|r| !r.is_empty());
    let mut active = vouchers::ActiveModel {
        id: Set(voucher.id.into_inner()),
        status: Set(next.into()),
        updated_at: Set(now.into()),
        ..Default::default()
    };
    if let Some(reason) = reason {
        active.status_reason = Set(Some(reason.to_string()));
    }
    if next == VoucherStatus::Posted {
        active.posted_at = Set(Some(now.into()));
    }
    active.update(txn).await.map_err(db_err)?;

    info!(
        tenant_id = %tenant_id,
        voucher_id = %voucher.id,
        from = %voucher.status,
        to = %next,
        "Voucher status changed"
    );
    load_voucher(txn, tenant_id, id, false).await
}

async fn apply_budget_on_post(
    txn: &DatabaseTransaction,
    tenant_id: TenantId,
    voucher: &Voucher,
    request: PostingBudgetRequest,
) -> Result<(), LedgerError> {
    let Some((category, amount)) = voucher.budget_claim() else {
        if request.check_budget || request.occupy_budget {
            warn!(voucher_id = %voucher.id, "Budget requested for a voucher without a budget category");
        }
        return Ok(());
    };
    if amount <= Decimal::ZERO {
        return Ok(());
    }

    let control = find_control(txn, tenant_id, voucher.entity_id, category).await?;
    let plan = BudgetService::plan_for_posting(
        control.map(|c| BudgetControlConfig {
            enforce_check: c.enforce_check,
            auto_occupy: c.auto_occupy,
        }),
        request,
    );
    let key = BudgetKey {
        entity_id: voucher.entity_id,
        category: category.to_string(),
        period_key: voucher.period_key,
    };

    if plan.occupy {
        occupy_in_txn(txn, tenant_id, &key, amount, plan.enforce, Some(voucher.id)).await?;
    } else if plan.enforce {
        enforce_in_txn(txn, tenant_id, &key, amount).await?;
    }
    Ok(())
}

/// Inserts a voucher with its lines inside `txn`.
///
/// Runs the balance and period guards and allocates the voucher number from
/// the `(tenant, period)` sequence row.
pub(crate) async fn insert_voucher(
    txn: &DatabaseTransaction,
    tenant_id: TenantId,
    draft: &VoucherDraft,
    status: VoucherStatus,
    reverses: Option<VoucherId>,
) -> Result<Voucher, LedgerError> {
    let totals = validate_draft(draft)?;
    guard_open(txn, tenant_id, draft.business_date).await?;

    let period_key = draft.period_key();
    let seq = next_sequence(txn, tenant_id, period_key).await?;
    let voucher_id = VoucherId::new();
    let voucher_no = format_voucher_no(period_key, seq);
    let now = Utc::now();
    if has_rounding_drift(totals) {
        warn!(
            tenant_id = %tenant_id,
            voucher_no = %voucher_no,
            debit = %totals.debit,
            credit = %totals.credit,
            "Voucher accepted with rounding drift"
        );
    }

    let (event_type, event_id) = match &draft.source {
        VoucherSource::Event {
            event_type,
            event_id,
        } => (Some(event_type.clone()), Some(event_id.clone())),
        _ => (None, None),
    };

    vouchers::ActiveModel {
        id: Set(voucher_id.into_inner()),
        tenant_id: Set(tenant_id.into_inner()),
        entity_id: Set(draft.entity_id.into_inner()),
        voucher_no: Set(voucher_no),
        business_date: Set(draft.business_date),
        period_key: Set(period_key.to_string()),
        description: Set(draft.description.trim().to_string()),
        status: Set(status.into()),
        source: Set(draft.source.kind().to_string()),
        source_event_type: Set(event_type),
        source_event_id: Set(event_id),
        attachments: Set(draft.attachments.clone()),
        budget_category: Set(draft.budget_category.clone()),
        budget_amount: Set(draft.budget_amount),
        total_debit: Set(totals.debit),
        total_credit: Set(totals.credit),
        reverses_voucher_id: Set(reverses.map(VoucherId::into_inner)),
        reversed_by_voucher_id: Set(None),
        status_reason: Set(None),
        created_at: Set(now.into()),
        posted_at: Set((status == VoucherStatus::Posted).then(|| now.into())),
        updated_at: Set(now.into()),
    }
    .insert(txn)
    .await
    .map_err(db_err)?;

    for (line_no, line) in (1_i32..).zip(&draft.lines) {
        voucher_lines::ActiveModel {
            id: Set(Uuid::now_v7()),
            voucher_id: Set(voucher_id.into_inner()),
            tenant_id: Set(tenant_id.into_inner()),
            entity_id: Set(draft.entity_id.into_inner()),
            business_date: Set(draft.business_date),
            line_no: Set(line_no),
            account_code: Set(line.account_code.trim().to_string()),
            account_name: Set(line.account_name.clone()),
            debit: Set(line.debit),
            credit: Set(line.credit),
            memo: Set(line.memo.clone()),
        }
        .insert(txn)
        .await
        .map_err(db_err)?;
    }

    load_voucher(txn, tenant_id, voucher_id, false).await
}

/// Allocates the next voucher sequence number of `(tenant, period)`.
async fn next_sequence(
    txn: &DatabaseTransaction,
    tenant_id: TenantId,
    period_key: PeriodKey,
) -> Result<i64, LedgerError> {
    let existing = voucher_sequences::Entity::find()
        .filter(voucher_sequences::Column::TenantId.eq(tenant_id.into_inner()))
        .filter(voucher_sequences::Column::PeriodKey.eq(period_key.to_string()))
        .lock_exclusive()
        .one(txn)
        .await
        .map_err(db_err)?;

    match existing {
        Some(row) => {
            let next = row.last_seq + 1;
            let mut active: voucher_sequences::ActiveModel = row.into();
            active.last_seq = Set(next);
            active.update(txn).await.map_err(db_err)?;
            Ok(next)
        }
        None => {
            voucher_sequences::ActiveModel {
                id: Set(Uuid::now_v7()),
                tenant_id: Set(tenant_id.into_inner()),
                period_key: Set(period_key.to_string()),
                last_seq: Set(1),
            }
            .insert(txn)
            .await
            .map_err(db_err)?;
            Ok(1)
        }
    }
}

/// Loads a voucher with its lines, optionally locking the voucher row.
pub(crate) async fn load_voucher<C: ConnectionTrait>(
    conn: &C,
    tenant_id: TenantId,
    id: VoucherId,
    lock: bool,
) -> Result<Voucher, LedgerError> {
    let query = vouchers::Entity::find_by_id(id.into_inner())
        .filter(vouchers::Column::TenantId.eq(tenant_id.into_inner()));
    let query = if lock { query.lock_exclusive() } else { query };
    let row = query
        .one(conn)
        .await
        .map_err(db_err)?
        .ok_or_else(|| LedgerError::not_found("voucher", id.to_string()))?;

    let lines = voucher_lines::Entity::find()
        .filter(voucher_lines::Column::VoucherId.eq(row.id))
        .order_by_asc(voucher_lines::Column::LineNo)
        .all(conn)
        .await
        .map_err(db_err)?;

    to_voucher(row, lines)
}

/// Finds the voucher generated for a business event, if any.
pub(crate) async fn find_by_event<C: ConnectionTrait>(
    conn: &C,
    tenant_id: TenantId,
    event_id: &str,
) -> Result<Option<Voucher>, LedgerError> {
    let row = vouchers::Entity::find()
        .filter(vouchers::Column::TenantId.eq(tenant_id.into_inner()))
        .filter(vouchers::Column::SourceEventId.eq(event_id))
        .one(conn)
        .await
        .map_err(db_err)?;
    match row {
        Some(row) => load_voucher(conn, tenant_id, VoucherId::from_uuid(row.id), false)
            .await
            .map(Some),
        None => Ok(None),
    }
}

fn to_voucher(
    row: vouchers::Model,
    lines: Vec<voucher_lines::Model>,
) -> Result<Voucher, LedgerError> {
    let period_key = row
        .period_key
        .parse::<PeriodKey>()
        .map_err(|e| LedgerError::Internal(format!("stored period key: {e}")))?;
    let lines = lines
        .into_iter()
        .map(|line| {
            Ok(VoucherLine {
                line_no: u32::try_from(line.line_no)
                    .map_err(|_| LedgerError::Internal(format!("line number {}", line.line_no)))?,
                account_code: line.account_code,
                account_name: line.account_name,
                debit: line.debit,
                credit: line.credit,
                memo: line.memo,
            })
        })
        .collect::<Result<Vec<_>, LedgerError>>()?;

    Ok(Voucher {
        id: VoucherId::from_uuid(row.id),
        tenant_id: TenantId::from_uuid(row.tenant_id),
        entity_id: EntityId::from_uuid(row.entity_id),
        voucher_no: row.voucher_no,
        business_date: row.business_date,
        period_key,
        description: row.description,
        status: row.status.into(),
        source: VoucherSource::from_parts(&row.source, row.source_event_type, row.source_event_id),
        attachments: row.attachments,
        budget_category: row.budget_category,
        budget_amount: row.budget_amount,
        totals: VoucherTotals {
            debit: row.total_debit,
            credit: row.total_credit,
        },
        reverses_voucher_id: row.reverses_voucher_id.map(VoucherId::from_uuid),
        reversed_by_voucher_id: row.reversed_by_voucher_id.map(VoucherId::from_uuid),
        status_reason: row.status_reason,
        created_at: row.created_at.with_timezone(&Utc),
        posted_at: row.posted_at.map(|t| t.with_timezone(&Utc)),
        updated_at: row.updated_at.with_timezone(&Utc),
        lines,
    })
}
