//! The period record as returned to callers.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::guard::PeriodStatus;
use super::key::PeriodKey;

/// An accounting period of one tenant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Period {
    /// `YYYY-MM`.
    pub period_key: PeriodKey,
    /// First day.
    pub start_date: NaiveDate,
    /// Last day.
    pub end_date: NaiveDate,
    /// Open or closed.
    pub status: PeriodStatus,
    /// When it was last closed.
    pub closed_at: Option<DateTime<Utc>>,
    /// False for a period derived on the fly that nothing has touched yet.
    pub persisted: bool,
}

impl Period {
    /// An untouched period: open, never stored.
    #[must_use]
    pub fn derived(period_key: PeriodKey) -> Self {
        Self {
            period_key,
            start_date: period_key.start_date(),
            end_date: period_key.end_date(),
            status: PeriodStatus::Open,
            closed_at: None,
            persisted: false,
        }
    }

    /// Natural-month periods from `from` to `to`, with stored rows taking
    /// precedence over derived ones.
    #[must_use]
    pub fn merge_range(from: PeriodKey, to: PeriodKey, stored: Vec<Self>) -> Vec<Self> {
        let mut stored = stored;
        PeriodKey::range_inclusive(from, to)
            .into_iter()
            .map(|key| {
                stored
                    .iter()
                    .position(|p| p.period_key == key)
                    .map_or_else(|| Self::derived(key), |idx| stored.swap_remove(idx))
            })
            .collect()
    }
}
