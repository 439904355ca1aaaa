//! Budget repository.
//!
//! Occupation locks exactly one `(tenant, entity, category, period)` budget
//! row for the rest of the enclosing transaction and records an occupation
//! row, so a voided or red-flushed voucher releases exactly what it took.

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DatabaseTransaction,
    EntityTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use tally_core::LedgerError;
use tally_core::budget::{
    Budget, BudgetCheck, BudgetControl, BudgetControlConfig, BudgetKey, BudgetService,
    BudgetStanding,
};
use tally_core::period::PeriodKey;
use tally_shared::RetryConfig;
use tally_shared::types::{BudgetControlId, BudgetId, EntityId, TenantId, VoucherId};
use tracing::{debug, info};
use uuid::Uuid;

use crate::entities::{budget_controls, budget_occupations, budgets};
use crate::error::db_err;
use crate::retry::with_retry;

/// Input for creating or replacing a budget amount.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpsertBudgetInput {
    /// Business entity.
    pub entity_id: EntityId,
    /// Budget category, e.g. `marketing`.
    pub category: String,
    /// Budget period.
    pub period_key: PeriodKey,
    /// Budgeted amount.
    pub amount: Decimal,
    /// Optionally set the control for `(entity, category)` in the same call.
    #[serde(default)]
    pub control: Option<BudgetControlConfig>,
}

/// Budget repository.
#[derive(Debug, Clone)]
pub struct BudgetRepository {
    db: DatabaseConnection,
    retry: RetryConfig,
}

impl BudgetRepository {
    /// Creates a new budget repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection, retry: RetryConfig) -> Self {
        Self { db, retry }
    }

    /// Creates the budget or replaces its amount. The occupied amount is kept.
    pub async fn upsert(
        &self,
        tenant_id: TenantId,
        input: UpsertBudgetInput,
    ) -> Result<Budget, LedgerError> {
        BudgetService::validate_definition(&input.category, input.amount)?;
        let input = &input;

        with_retry(&self.retry, "upsert_budget", || async move {
            let txn = self.db.begin().await.map_err(db_err)?;
            let key = BudgetKey {
                entity_id: input.entity_id,
                category: input.category.trim().to_string(),
                period_key: input.period_key,
            };
            let now = Utc::now().into();

            let row = match find_budget(&txn, tenant_id, &key, true).await? {
                Some(row) => {
                    let mut active: budgets::ActiveModel = row.into();
                    active.amount = Set(input.amount);
                    active.updated_at = Set(now);
                    active.update(&txn).await.map_err(db_err)?
                }
                None => budgets::ActiveModel {
                    id: Set(BudgetId::new().into_inner()),
                    tenant_id: Set(tenant_id.into_inner()),
                    entity_id: Set(key.entity_id.into_inner()),
                    category: Set(key.category.clone()),
                    period_key: Set(key.period_key.to_string()),
                    amount: Set(input.amount),
                    occupied_amount: Set(Decimal::ZERO),
                    created_at: Set(now),
                    updated_at: Set(now),
                }
                .insert(&txn)
                .await
                .map_err(db_err)?,
            };

            if let Some(config) = input.control {
                upsert_control_row(&txn, tenant_id, key.entity_id, &key.category, config).await?;
            }
            txn.commit().await.map_err(db_err)?;

            info!(
                tenant_id = %tenant_id,
                category = %key.category,
                period_key = %key.period_key,
                amount = %input.amount,
                "Budget upserted"
            );
            to_budget(row)
        })
        .await
    }

    /// Lists budgets, optionally for one entity and/or period.
    pub async fn list(
        &self,
        tenant_id: TenantId,
        entity_id: Option<EntityId>,
        period_key: Option<PeriodKey>,
    ) -> Result<Vec<Budget>, LedgerError> {
        let mut query =
            budgets::Entity::find().filter(budgets::Column::TenantId.eq(tenant_id.into_inner()));
        if let Some(entity_id) = entity_id {
            query = query.filter(budgets::Column::EntityId.eq(entity_id.into_inner()));
        }
        if let Some(period_key) = period_key {
            query = query.filter(budgets::Column::PeriodKey.eq(period_key.to_string()));
        }

        query
            .order_by_asc(budgets::Column::PeriodKey)
            .order_by_asc(budgets::Column::Category)
            .all(&self.db)
            .await
            .map_err(db_err)?
            .into_iter()
            .map(to_budget)
            .collect()
    }

    /// Reports whether `requested` still fits the budget. Changes nothing.
    pub async fn check(
        &self,
        tenant_id: TenantId,
        key: &BudgetKey,
        requested: Decimal,
    ) -> Result<BudgetCheck, LedgerError> {
        let row = find_budget(&self.db, tenant_id, key, false)
            .await?
            .ok_or_else(|| not_found(key))?;
        Ok(BudgetService::check(standing(&row), requested)?)
    }

    /// Occupies `amount`. Enforced when the control for `(entity, category)`
    /// has `enforce_check` set; otherwise the budget may go over.
    pub async fn occupy(
        &self,
        tenant_id: TenantId,
        key: &BudgetKey,
        amount: Decimal,
    ) -> Result<Budget, LedgerError> {
        with_retry(&self.retry, "occupy_budget", || async move {
            let txn = self.db.begin().await.map_err(db_err)?;
            let enforce = find_control(&txn, tenant_id, key.entity_id, &key.category)
                .await?
                .is_some_and(|c| c.enforce_check);
            let budget = occupy_in_txn(&txn, tenant_id, key, amount, enforce, None).await?;
            txn.commit().await.map_err(db_err)?;
            Ok(budget)
        })
        .await
    }

    /// Releases `amount` from the budget. Occupation never drops below zero.
    pub async fn release(
        &self,
        tenant_id: TenantId,
        key: &BudgetKey,
        amount: Decimal,
    ) -> Result<Budget, LedgerError> {
        with_retry(&self.retry, "release_budget", || async move {
            let txn = self.db.begin().await.map_err(db_err)?;
            let row = find_budget(&txn, tenant_id, key, true)
                .await?
                .ok_or_else(|| not_found(key))?;
            let occupied = BudgetService::release(row.occupied_amount, amount)?;
            let row = set_occupied(&txn, row, occupied).await?;
            txn.commit().await.map_err(db_err)?;

            info!(tenant_id = %tenant_id, category = %key.category, %amount, "Budget released");
            to_budget(row)
        })
        .await
    }

    /// Creates or replaces the control for `(entity, category)`.
    pub async fn upsert_control(
        &self,
        tenant_id: TenantId,
        entity_id: EntityId,
        category: &str,
        config: BudgetControlConfig,
    ) -> Result<BudgetControl, LedgerError> {
        let category = category.trim();
        if category.is_empty() {
            return Err(tally_core::ValidationError::MissingField("category").into());
        }

        with_retry(&self.retry, "upsert_budget_control", || async move {
            let txn = self.db.begin().await.map_err(db_err)?;
            let row = upsert_control_row(&txn, tenant_id, entity_id, category, config).await?;
            txn.commit().await.map_err(db_err)?;
            Ok(to_control(row))
        })
        .await
    }

    /// Returns the control for `(entity, category)`.
    pub async fn get_control(
        &self,
        tenant_id: TenantId,
        entity_id: EntityId,
        category: &str,
    ) -> Result<BudgetControl, LedgerError> {
        find_control(&self.db, tenant_id, entity_id, category)
            .await?
            .map(to_control)
            .ok_or_else(|| LedgerError::not_found("budget_control", format!("{entity_id}/{category}")))
    }

    /// Lists controls, optionally for one entity.
    pub async fn list_controls(
        &self,
        tenant_id: TenantId,
        entity_id: Option<EntityId>,
    ) -> Result<Vec<BudgetControl>, LedgerError> {
        let mut query = budget_controls::Entity::find()
            .filter(budget_controls::Column::TenantId.eq(tenant_id.into_inner()));
        if let Some(entity_id) = entity_id {
            query = query.filter(budget_controls::Column::EntityId.eq(entity_id.into_inner()));
        }
        Ok(query
            .order_by_asc(budget_controls::Column::Category)
            .all(&self.db)
            .await
            .map_err(db_err)?
            .into_iter()
            .map(to_control)
            .collect())
    }
}

/// Occupies `amount` inside `txn`, holding the budget row lock until the
/// transaction ends. Records an occupation linked to `voucher_id`.
pub(crate) async fn occupy_in_txn(
    txn: &DatabaseTransaction,
    tenant_id: TenantId,
    key: &BudgetKey,
    amount: Decimal,
    enforce: bool,
    voucher_id: Option<VoucherId>,
) -> Result<Budget, LedgerError> {
    let row = find_budget(txn, tenant_id, key, true)
        .await?
        .ok_or_else(|| not_found(key))?;
    let occupied = BudgetService::occupy(key, standing(&row), amount, enforce)?;
    let budget_id = row.id;
    let row = set_occupied(txn, row, occupied).await?;

    budget_occupations::ActiveModel {
        id: Set(Uuid::now_v7()),
        tenant_id: Set(tenant_id.into_inner()),
        budget_id: Set(budget_id),
        voucher_id: Set(voucher_id.map(VoucherId::into_inner)),
        amount: Set(amount),
        released_at: Set(None),
        created_at: Set(Utc::now().into()),
    }
    .insert(txn)
    .await
    .map_err(db_err)?;

    debug!(tenant_id = %tenant_id, category = %key.category, %amount, %occupied, "Budget occupied");
    to_budget(row)
}

/// Fails with `BudgetExceeded` if `amount` does not fit, without occupying.
pub(crate) async fn enforce_in_txn(
    txn: &DatabaseTransaction,
    tenant_id: TenantId,
    key: &BudgetKey,
    amount: Decimal,
) -> Result<(), LedgerError> {
    let row = find_budget(txn, tenant_id, key, true)
        .await?
        .ok_or_else(|| not_found(key))?;
    BudgetService::occupy(key, standing(&row), amount, true).map(|_| ())
}

/// Releases every open occupation recorded for `voucher_id`.
pub(crate) async fn release_voucher_in_txn(
    txn: &DatabaseTransaction,
    tenant_id: TenantId,
    voucher_id: VoucherId,
) -> Result<Decimal, LedgerError> {
    let occupations = budget_occupations::Entity::find()
        .filter(budget_occupations::Column::TenantId.eq(tenant_id.into_inner()))
        .filter(budget_occupations::Column::VoucherId.eq(voucher_id.into_inner()))
        .filter(budget_occupations::Column::ReleasedAt.is_null())
        .lock_exclusive()
        .all(txn)
        .await
        .map_err(db_err)?;

    let mut released = Decimal::ZERO;
    for occupation in occupations {
        let row = budgets::Entity::find_by_id(occupation.budget_id)
            .lock_exclusive()
            .one(txn)
            .await
            .map_err(db_err)?
            .ok_or_else(|| LedgerError::Internal(format!("budget {} vanished", occupation.budget_id)))?;
        let occupied = BudgetService::release(row.occupied_amount, occupation.amount)?;
        set_occupied(txn, row, occupied).await?;

        released += occupation.amount;
        let mut active: budget_occupations::ActiveModel = occupation.into();
        active.released_at = Set(Some(Utc::now().into()));
        active.update(txn).await.map_err(db_err)?;
    }

    if released > Decimal::ZERO {
        info!(tenant_id = %tenant_id, voucher_id = %voucher_id, %released, "Voucher budget released");
    }
    Ok(released)
}

pub(crate) async fn find_control<C: ConnectionTrait>(
    conn: &C,
    tenant_id: TenantId,
    entity_id: EntityId,
    category: &str,
) -> Result<Option<budget_controls::Model>, LedgerError> {
    budget_controls::Entity::find()
        .filter(budget_controls::Column::TenantId.eq(tenant_id.into_inner()))
        .filter(budget_controls::Column::EntityId.eq(entity_id.into_inner()))
        .filter(budget_controls::Column::Category.eq(category))
        .one(conn)
        .await
        .map_err(db_err)
}

async fn find_budget<C: ConnectionTrait>(
    conn: &C,
    tenant_id: TenantId,
    key: &BudgetKey,
    lock: bool,
) -> Result<Option<budgets::Model>, LedgerError> {
    let query = budgets::Entity::find()
        .filter(budgets::Column::TenantId.eq(tenant_id.into_inner()))
        .filter(budgets::Column::EntityId.eq(key.entity_id.into_inner()))
        .filter(budgets::Column::Category.eq(key.category.as_str()))
        .filter(budgets::Column::PeriodKey.eq(key.period_key.to_string()));
    let query = if lock { query.lock_exclusive() } else { query };
    query.one(conn).await.map_err(db_err)
}

async fn upsert_control_row(
    txn: &DatabaseTransaction,
    tenant_id: TenantId,
    entity_id: EntityId,
    category: &str,
    config: BudgetControlConfig,
) -> Result<budget_controls::Model, LedgerError> {
    let now = Utc::now().into();
    let existing = budget_controls::Entity::find()
        .filter(budget_controls::Column::TenantId.eq(tenant_id.into_inner()))
        .filter(budget_controls::Column::EntityId.eq(entity_id.into_inner()))
        .filter(budget_controls::Column::Category.eq(category))
        .lock_exclusive()
        .one(txn)
        .await
        .map_err(db_err)?;

    match existing {
        Some(row) => {
            let mut active: budget_controls::ActiveModel = row.into();
            active.enforce_check = Set(config.enforce_check);
            active.auto_occupy = Set(config.auto_occupy);
            active.updated_at = Set(now);
            active.update(txn).await.map_err(db_err)
        }
        None => budget_controls::ActiveModel {
            id: Set(BudgetControlId::new().into_inner()),
            tenant_id: Set(tenant_id.into_inner()),
            entity_id: Set(entity_id.into_inner()),
            category: Set(category.to_string()),
            enforce_check: Set(config.enforce_check),
            auto_occupy: Set(config.auto_occupy),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(txn)
        .await
        .map_err(db_err),
    }
}

async fn set_occupied(
    txn: &DatabaseTransaction,
    row: budgets::Model,
    occupied: Decimal,
) -> Result<budgets::Model, LedgerError> {
    let mut active: budgets::ActiveModel = row.into();
    active.occupied_amount = Set(occupied);
    active.updated_at = Set(Utc::now().into());
    active.update(txn).await.map_err(db_err)
}

fn standing(row: &budgets::Model) -> BudgetStanding {
    BudgetStanding {
        amount: row.amount,
        occupied: row.occupied_amount,
    }
}

fn not_found(key: &BudgetKey) -> LedgerError {
    LedgerError::BudgetNotFound {
        category: key.category.clone(),
        period_key: key.period_key,
    }
}

fn to_budget(row: budgets::Model) -> Result<Budget, LedgerError> {
    let period_key = row
        .period_key
        .parse::<PeriodKey>()
        .map_err(|e| LedgerError::Internal(format!("stored period key: {e}")))?;
    Ok(Budget {
        id: BudgetId::from_uuid(row.id),
        tenant_id: TenantId::from_uuid(row.tenant_id),
        entity_id: EntityId::from_uuid(row.entity_id),
        category: row.category,
        period_key,
        amount: row.amount,
        occupied_amount: row.occupied_amount,
        remaining: row.amount - row.occupied_amount,
        updated_at: row.updated_at.with_timezone(&Utc),
    })
}

fn to_control(row: budget_controls::Model) -> BudgetControl {
    BudgetControl {
        id: BudgetControlId::from_uuid(row.id),
        tenant_id: TenantId::from_uuid(row.tenant_id),
        entity_id: EntityId::from_uuid(row.entity_id),
        category: row.category,
        config: BudgetControlConfig {
            enforce_check: row.enforce_check,
            auto_occupy: row.auto_occupy,
        },
        updated_at: row.updated_at.with_timezone(&Utc),
    }
}
