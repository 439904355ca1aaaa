//! String-backed enums shared by several tables.

#![allow(missing_docs)]

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use tally_core::cash;
use tally_core::period;
use tally_core::voucher;

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum VoucherStatus {
    #[sea_orm(string_value = "draft")]
    Draft,
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "approved")]
    Approved,
    #[sea_orm(string_value = "posted")]
    Posted,
    #[sea_orm(string_value = "rejected")]
    Rejected,
    #[sea_orm(string_value = "voided")]
    Voided,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum PeriodStatus {
    #[sea_orm(string_value = "open")]
    Open,
    #[sea_orm(string_value = "closed")]
    Closed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(8))")]
pub enum CashDirection {
    #[sea_orm(string_value = "in")]
    In,
    #[sea_orm(string_value = "out")]
    Out,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(8))")]
pub enum CashAccount {
    #[sea_orm(string_value = "cash")]
    Cash,
    #[sea_orm(string_value = "bank")]
    Bank,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum MatchStatus {
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "matched")]
    Matched,
}

impl From<VoucherStatus> for voucher::VoucherStatus {
    fn from(status: VoucherStatus) -> Self {
        match status {
            VoucherStatus::Draft => Self::Draft,
            VoucherStatus::Pending => Self::Pending,
            VoucherStatus::Approved => Self::Approved,
            VoucherStatus::Posted => Self::Posted,
            VoucherStatus::Rejected => Self::Rejected,
            VoucherStatus::Voided => Self::Voided,
        }
    }
}

impl From<voucher::VoucherStatus> for VoucherStatus {
    fn from(status: voucher::VoucherStatus) -> Self {
        match status {
            voucher::VoucherStatus::Draft => Self::Draft,
            voucher::VoucherStatus::Pending => Self::Pending,
            voucher::VoucherStatus::Approved => Self::Approved,
            voucher::VoucherStatus::Posted => Self::Posted,
            voucher::VoucherStatus::Rejected => Self::Rejected,
            voucher::VoucherStatus::Voided => Self::Voided,
        }
    }
}

impl From<PeriodStatus> for period::PeriodStatus {
    fn from(status: PeriodStatus) -> Self {
        match status {
            PeriodStatus::Open => Self::Open,
            PeriodStatus::Closed => Self::Closed,
        }
    }
}

impl From<period::PeriodStatus> for PeriodStatus {
    fn from(status: period::PeriodStatus) -> Self {
        match status {
            period::PeriodStatus::Open => Self::Open,
            period::PeriodStatus::Closed => Self::Closed,
        }
    }
}

impl From<CashDirection> for cash::CashDirection {
    fn from(direction: CashDirection) -> Self {
        match direction {
            CashDirection::In => Self::In,
            CashDirection::Out => Self::Out,
        }
    }
}

impl From<cash::CashDirection> for CashDirection {
    fn from(direction: cash::CashDirection) -> Self {
        match direction {
            cash::CashDirection::In => Self::In,
            cash::CashDirection::Out => Self::Out,
        }
    }
}

impl From<CashAccount> for cash::CashAccount {
    fn from(account: CashAccount) -> Self {
        match account {
            CashAccount::Cash => Self::Cash,
            CashAccount::Bank => Self::Bank,
        }
    }
}

impl From<cash::CashAccount> for CashAccount {
    fn from(account: cash::CashAccount) -> Self {
        match account {
            cash::CashAccount::Cash => Self::Cash,
            cash::CashAccount::Bank => Self::Bank,
        }
    }
}

impl From<MatchStatus> for cash::MatchStatus {
    fn from(status: MatchStatus) -> Self {
        match status {
            MatchStatus::Pending => Self::Pending,
            MatchStatus::Matched => Self::Matched,
        }
    }
}

impl From<cash::MatchStatus> for MatchStatus {
    fn from(status: cash::MatchStatus) -> Self {
        match status {
            cash::MatchStatus::Pending => Self::Pending,
            cash::MatchStatus::Matched => Self::Matched,
        }
    }
}
