//! Period status and the guards every ledger mutation runs through.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::key::PeriodKey;
use crate::error::{LedgerError, ValidationError};

/// Whether a period accepts ledger mutations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PeriodStatus {
    /// Vouchers dated in the period may be created and transitioned.
    Open,
    /// The period is locked.
    Closed,
}

impl PeriodStatus {
    /// Lowercase storage name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Closed => "closed",
        }
    }
}

impl fmt::Display for PeriodStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PeriodStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "open" => Ok(Self::Open),
            "closed" => Ok(Self::Closed),
            other => Err(ValidationError::Payload(format!(
                "unknown period status '{other}'"
            ))),
        }
    }
}

/// Outcome of a close or reopen request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeriodChange {
    /// The status must be written.
    Apply(PeriodStatus),
    /// The period is already in the requested state.
    Unchanged,
}

/// Stateless guard logic for accounting periods.
///
/// Callers load the period row under a lock inside the same database
/// transaction that performs the mutation, then consult these functions.
pub struct PeriodGuard;

impl PeriodGuard {
    /// Rejects a mutation of something dated `business_date` when its
    /// period is closed.
    pub fn ensure_open(
        status: PeriodStatus,
        business_date: NaiveDate,
    ) -> Result<(), LedgerError> {
        match status {
            PeriodStatus::Open => Ok(()),
            PeriodStatus::Closed => Err(LedgerError::PeriodClosed {
                period_key: PeriodKey::from_date(business_date),
                business_date,
            }),
        }
    }

    /// Decides whether a period may be closed.
    ///
    /// `draft_count` is the number of draft vouchers dated inside the period.
    /// Closing an already closed period is a no-op.
    pub fn close(
        key: PeriodKey,
        status: PeriodStatus,
        draft_count: u64,
    ) -> Result<PeriodChange, LedgerError> {
        if status == PeriodStatus::Closed {
            return Ok(PeriodChange::Unchanged);
        }
        if draft_count > 0 {
            return Err(LedgerError::PeriodHasDrafts {
                period_key: key,
                draft_count,
            });
        }
        Ok(PeriodChange::Apply(PeriodStatus::Closed))
    }

    /// Reopening is unconditional; privilege is checked by the caller.
    #[must_use]
    pub fn reopen(status: PeriodStatus) -> PeriodChange {
        match status {
            PeriodStatus::Open => PeriodChange::Unchanged,
            PeriodStatus::Closed => PeriodChange::Apply(PeriodStatus::Open),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key() -> PeriodKey {
        "2024-03".parse().unwrap()
    }

    #[test]
    fn test_ensure_open() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
        assert!(PeriodGuard::ensure_open(PeriodStatus::Open, date).is_ok());

        let err = PeriodGuard::ensure_open(PeriodStatus::Closed, date).unwrap_err();
        match err {
            LedgerError::PeriodClosed {
                period_key,
                business_date,
            } => {
                assert_eq!(period_key, key());
                assert_eq!(business_date, date);
            }
            other => panic!("expected PeriodClosed, got {other:?}"),
        }
    }

    #[test]
    fn test_close_with_drafts_fails() {
        let err = PeriodGuard::close(key(), PeriodStatus::Open, 2).unwrap_err();
        assert!(matches!(
            err,
            LedgerError::PeriodHasDrafts { draft_count: 2, .. }
        ));
    }

    #[test]
    fn test_close_and_reopen() {
        assert_eq!(
            PeriodGuard::close(key(), PeriodStatus::Open, 0).unwrap(),
            PeriodChange::Apply(PeriodStatus::Closed)
        );
        assert_eq!(
            PeriodGuard::close(key(), PeriodStatus::Closed, 5).unwrap(),
            PeriodChange::Unchanged
        );
        assert_eq!(
            PeriodGuard::reopen(PeriodStatus::Closed),
            PeriodChange::Apply(PeriodStatus::Open)
        );
        assert_eq!(PeriodGuard::reopen(PeriodStatus::Open), PeriodChange::Unchanged);
    }

    #[test]
    fn test_status_round_trip() {
        assert_eq!("closed".parse::<PeriodStatus>().unwrap(), PeriodStatus::Closed);
        assert_eq!(PeriodStatus::Open.to_string(), "open");
        assert!("locked".parse::<PeriodStatus>().is_err());
    }
}
