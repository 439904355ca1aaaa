//! `SeaORM` Entity for cash_transactions table.
//!
//! `voucher_id` is a plain reference, not a foreign key: cash can be
//! recorded without a voucher and outlives the voucher's lifecycle.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::{CashAccount, CashDirection, MatchStatus};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "cash_transactions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub entity_id: Uuid,
    pub business_date: Date,
    #[sea_orm(column_type = "Decimal(Some((16, 4)))")]
    pub amount: Decimal,
    pub direction: CashDirection,
    pub account: CashAccount,
    pub external_ref: Option<String>,
    pub counterparty: Option<String>,
    pub memo: Option<String>,
    pub match_status: MatchStatus,
    pub match_id: Option<String>,
    pub voucher_id: Option<Uuid>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
