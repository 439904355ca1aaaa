//! Ledger entries and query filters.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tally_shared::types::{EntityId, VoucherId};

use super::balance::signed_amount;
use crate::error::ValidationError;
use crate::period::PeriodKey;
use crate::voucher::VoucherStatus;

/// One voucher line as seen from the ledger, with a back-reference to its voucher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    /// Owning voucher.
    pub voucher_id: VoucherId,
    /// Owning voucher's number.
    pub voucher_no: String,
    /// Business entity.
    pub entity_id: EntityId,
    /// Accounting date.
    pub business_date: NaiveDate,
    /// Voucher status.
    pub status: VoucherStatus,
    /// Line position within the voucher.
    pub line_no: u32,
    /// Account code.
    pub account_code: String,
    /// Account display name.
    pub account_name: Option<String>,
    /// Debit amount.
    pub debit: Decimal,
    /// Credit amount.
    pub credit: Decimal,
    /// Line memo.
    pub memo: Option<String>,
    /// Set when the voucher is a red-flush of another.
    pub reverses_voucher_id: Option<VoucherId>,
}

impl LedgerEntry {
    /// `debit - credit`.
    #[must_use]
    pub fn signed_amount(&self) -> Decimal {
        signed_amount(self.debit, self.credit)
    }
}

/// Ledger filter as a caller states it.
///
/// A period, an as-of date and an explicit date range are alternative ways
/// to bound dates; [`LedgerFilter::resolve`] turns them into one range.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerFilter {
    /// Restrict to one entity.
    #[serde(default)]
    pub entity_id: Option<EntityId>,
    /// Restrict to one account.
    #[serde(default)]
    pub account_code: Option<String>,
    /// Everything up to and including this date.
    #[serde(default)]
    pub as_of_date: Option<NaiveDate>,
    /// Exactly this period.
    #[serde(default)]
    pub period: Option<PeriodKey>,
    /// Range start, inclusive.
    #[serde(default)]
    pub date_from: Option<NaiveDate>,
    /// Range end, inclusive.
    #[serde(default)]
    pub date_to: Option<NaiveDate>,
    /// Only posted vouchers; defaults to `true`.
    #[serde(default)]
    pub posted_only: Option<bool>,
}

/// A resolved ledger query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerQuery {
    /// Restrict to one entity.
    pub entity_id: Option<EntityId>,
    /// Restrict to one account.
    pub account_code: Option<String>,
    /// Inclusive lower bound.
    pub date_from: Option<NaiveDate>,
    /// Inclusive upper bound.
    pub date_to: Option<NaiveDate>,
    /// Only posted vouchers.
    pub posted_only: bool,
}

impl LedgerQuery {
    /// Voucher statuses this query counts.
    #[must_use]
    pub fn statuses(&self) -> &'static [VoucherStatus] {
        VoucherStatus::ledger_visible(self.posted_only)
    }

    /// Whether an entry passes this query.
    #[must_use]
    pub fn matches(&self, entry: &LedgerEntry) -> bool {
        self.statuses().contains(&entry.status)
            && self.entity_id.is_none_or(|id| id == entry.entity_id)
            && self
                .account_code
                .as_deref()
                .is_none_or(|code| code == entry.account_code)
            && self.date_from.is_none_or(|from| entry.business_date >= from)
            && self.date_to.is_none_or(|to| entry.business_date <= to)
    }

    /// Same query narrowed to one entity.
    #[must_use]
    pub fn for_entity(&self, entity_id: EntityId) -> Self {
        Self {
            entity_id: Some(entity_id),
            ..self.clone()
        }
    }
}

impl LedgerFilter {
    /// Resolves the date bounds.
    ///
    /// # Errors
    ///
    /// `Payload` when a period is combined with other date bounds, an as-of
    /// date is combined with `date_to`, or the range is inverted.
    pub fn resolve(self) -> Result<LedgerQuery, ValidationError> {
        let (date_from, date_to) = if let Some(period) = self.period {
            if self.as_of_date.is_some() || self.date_from.is_some() || self.date_to.is_some() {
                return Err(ValidationError::Payload(
                    "period cannot be combined with as_of_date or a date range".into(),
                ));
            }
            (Some(period.start_date()), Some(period.end_date()))
        } else if let Some(as_of) = self.as_of_date {
            if self.date_to.is_some() {
                return Err(ValidationError::Payload(
                    "as_of_date cannot be combined with date_to".into(),
                ));
            }
            (self.date_from, Some(as_of))
        } else {
            (self.date_from, self.date_to)
        };

        if let (Some(from), Some(to)) = (date_from, date_to) {
            if from > to {
                return Err(ValidationError::Payload(format!(
                    "date range is inverted: {from} > {to}"
                )));
            }
        }

        Ok(LedgerQuery {
            entity_id: self.entity_id,
            account_code: self.account_code.filter(|code| !code.trim().is_empty()),
            date_from,
            date_to,
            posted_only: self.posted_only.unwrap_or(true),
        })
    }
}
