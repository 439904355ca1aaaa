//! Bulk import planning.
//!
//! Each row is decided on its own: a bad row is reported and the rest of
//! the batch carries on.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tally_shared::types::CashTransactionId;

use super::types::{CashService, CashTransactionInput};

/// What to do with one import row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportDecision {
    /// Insert it.
    Insert,
    /// Skip it as a duplicate of an existing or earlier row.
    SkipDuplicate(String),
    /// Reject it.
    Reject(String),
}

/// Outcome of one row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ImportRowStatus {
    /// Inserted.
    Imported {
        /// New transaction id.
        id: CashTransactionId,
    },
    /// Skipped as a duplicate.
    Skipped {
        /// The duplicated reference.
        reason: String,
    },
    /// Failed.
    Failed {
        /// What went wrong.
        error: String,
    },
}

/// Result of one row, by its position in the batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportRowResult {
    /// 0-based row index.
    pub index: usize,
    /// External reference of the row.
    pub external_ref: Option<String>,
    /// Outcome.
    #[serde(flatten)]
    pub status: ImportRowStatus,
}

/// Summary of an import.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportReport {
    /// Rows inserted.
    pub imported: usize,
    /// Duplicate rows skipped.
    pub skipped: usize,
    /// Rows that failed.
    pub failed: usize,
    /// Per-row outcomes, in input order.
    pub rows: Vec<ImportRowResult>,
}

impl ImportReport {
    /// Records one row's outcome.
    pub fn record(&mut self, index: usize, external_ref: Option<String>, status: ImportRowStatus) {
        match status {
            ImportRowStatus::Imported { .. } => self.imported += 1,
            ImportRowStatus::Skipped { .. } => self.skipped += 1,
            ImportRowStatus::Failed { .. } => self.failed += 1,
        }
        self.rows.push(ImportRowResult {
            index,
            external_ref,
            status,
        });
    }
}

/// Tracks references seen within the batch.
#[derive(Debug, Default)]
pub struct ImportPlanner {
    skip_duplicate: bool,
    seen: HashSet<String>,
}

impl ImportPlanner {
    /// A planner; with `skip_duplicate` off every valid row is inserted.
    #[must_use]
    pub fn new(skip_duplicate: bool) -> Self {
        Self {
            skip_duplicate,
            seen: HashSet::new(),
        }
    }

    /// Decides a row. `exists` says whether its reference is already stored.
    pub fn decide(&mut self, row: &CashTransactionInput, exists: bool) -> ImportDecision {
        if let Err(e) = CashService::validate(row) {
            return ImportDecision::Reject(e.to_string());
        }
        let Some(external_ref) = row.external_ref.as_deref().map(str::trim) else {
            return ImportDecision::Insert;
        };
        if external_ref.is_empty() {
            return ImportDecision::Insert;
        }
        let first_in_batch = self.seen.insert(external_ref.to_string());
        if self.skip_duplicate && (exists || !first_in_batch) {
            return ImportDecision::SkipDuplicate(format!("duplicate external_ref '{external_ref}'"));
        }
        ImportDecision::Insert
    }

    /// Whether lookups for existing references are needed at all.
    #[must_use]
    pub const fn dedupes(&self) -> bool {
        self.skip_duplicate
    }
}
