//! Ledger error taxonomy.
//!
//! Every failure a ledger operation can surface is a [`LedgerError`]. Each
//! variant carries the data a caller needs to resolve it (the closed period,
//! the remaining budget, the offending line) and knows its API error code,
//! HTTP status and whether retrying can help.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

use crate::period::PeriodKey;
use crate::voucher::{VoucherAction, VoucherStatus};

/// Input that can never be accepted as sent. Never retried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A voucher needs at least one line.
    #[error("Voucher must have at least one line")]
    NoLines,

    /// Debit and credit totals differ by more than the tolerance.
    #[error("Voucher is not balanced. Debit: {debit}, Credit: {credit}")]
    Unbalanced {
        /// Total debit.
        debit: Decimal,
        /// Total credit.
        credit: Decimal,
    },

    /// A line carries a negative amount.
    #[error("Line {line_no} has a negative amount")]
    NegativeAmount {
        /// 1-based line number.
        line_no: u32,
    },

    /// A line has neither a debit nor a credit.
    #[error("Line {line_no} has neither a debit nor a credit amount")]
    ZeroLine {
        /// 1-based line number.
        line_no: u32,
    },

    /// A line has both a debit and a credit.
    #[error("Line {line_no} has both a debit and a credit amount")]
    BothSides {
        /// 1-based line number.
        line_no: u32,
    },

    /// A line has no account code.
    #[error("Line {line_no} is missing an account code")]
    MissingAccountCode {
        /// 1-based line number.
        line_no: u32,
    },

    /// Period keys look like `2024-03`.
    #[error("Invalid period key '{0}', expected YYYY-MM")]
    InvalidPeriodKey(String),

    /// An amount that must be positive was not.
    #[error("Amount must be positive")]
    InvalidAmount,

    /// A required field was absent or blank.
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    /// A voucher cannot be moved to this status through a status change.
    #[error("Status '{0}' cannot be requested directly")]
    InvalidTargetStatus(VoucherStatus),

    /// An event payload or request body could not be interpreted.
    #[error("Invalid payload: {0}")]
    Payload(String),
}

/// Errors that can occur during ledger operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    // ========== Validation ==========
    /// The request is malformed or violates the double-entry rules.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    // ========== Periods ==========
    /// The target date lies in a closed period.
    #[error("Period {period_key} is closed; business date {business_date} cannot be changed")]
    PeriodClosed {
        /// The closed period.
        period_key: PeriodKey,
        /// The date that was rejected.
        business_date: NaiveDate,
    },

    /// Draft vouchers still exist inside the period being closed.
    #[error("Period {period_key} still has {draft_count} draft voucher(s)")]
    PeriodHasDrafts {
        /// The period.
        period_key: PeriodKey,
        /// How many drafts block the close.
        draft_count: u64,
    },

    // ========== Budgets ==========
    /// Occupying the amount would exceed the budget.
    #[error(
        "Budget exceeded for {category} in {period_key}: requested {requested}, remaining {remaining}"
    )]
    BudgetExceeded {
        /// Budget category.
        category: String,
        /// Budget period.
        period_key: PeriodKey,
        /// Budgeted amount.
        budget: Decimal,
        /// Already occupied.
        occupied: Decimal,
        /// Amount the caller tried to occupy.
        requested: Decimal,
        /// `budget - occupied`.
        remaining: Decimal,
    },

    /// A budget operation named a budget that does not exist.
    #[error("No budget for {category} in {period_key}")]
    BudgetNotFound {
        /// Budget category.
        category: String,
        /// Budget period.
        period_key: PeriodKey,
    },

    // ========== Voucher lifecycle ==========
    /// The voucher's status does not allow the action.
    #[error("Cannot {action} a voucher in status {from}")]
    InvalidTransition {
        /// Current status.
        from: VoucherStatus,
        /// The attempted action.
        action: VoucherAction,
    },

    /// The voucher has already been red-flushed.
    #[error("Voucher {voucher_id} has already been reversed by {reversed_by}")]
    AlreadyReversed {
        /// The original voucher.
        voucher_id: Uuid,
        /// The existing reversal.
        reversed_by: Uuid,
    },

    // ========== Rule engine ==========
    /// No rule is registered for the event type.
    #[error("No voucher rule registered for event type '{0}'")]
    UnknownEventType(String),

    /// The rule refused the event payload.
    #[error("Rule for '{event_type}' rejected the event: {reason}")]
    RuleRejected {
        /// Event type.
        event_type: String,
        /// Why the payload cannot be booked.
        reason: String,
    },

    // ========== Infrastructure ==========
    /// Lost a lock or uniqueness race; retrying may succeed.
    #[error("Concurrent modification detected, please retry: {0}")]
    ConcurrencyConflict(String),

    /// A referenced row does not exist for the tenant.
    #[error("{resource} not found: {id}")]
    NotFound {
        /// Resource kind, e.g. `voucher`.
        resource: &'static str,
        /// Identifier as given by the caller.
        id: String,
    },

    /// The caller cancelled a long-running read.
    #[error("Operation cancelled before completion")]
    Cancelled,

    /// Database error.
    #[error("Database error: {0}")]
    Database(String),

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl LedgerError {
    /// Shorthand for [`LedgerError::NotFound`].
    #[must_use]
    pub fn not_found(resource: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            resource,
            id: id.to_string(),
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Validation(ValidationError::Unbalanced { .. }) => "UNBALANCED_VOUCHER",
            Self::Validation(ValidationError::InvalidPeriodKey(_)) => "INVALID_PERIOD_KEY",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::PeriodClosed { .. } => "PERIOD_CLOSED",
            Self::PeriodHasDrafts { .. } => "PERIOD_HAS_DRAFTS",
            Self::BudgetExceeded { .. } => "BUDGET_EXCEEDED",
            Self::BudgetNotFound { .. } => "BUDGET_NOT_FOUND",
            Self::InvalidTransition { .. } => "INVALID_TRANSITION",
            Self::AlreadyReversed { .. } => "ALREADY_REVERSED",
            Self::UnknownEventType(_) => "UNKNOWN_EVENT_TYPE",
            Self::RuleRejected { .. } => "RULE_REJECTED",
            Self::ConcurrencyConflict(_) => "CONCURRENCY_CONFLICT",
            Self::NotFound { .. } => "NOT_FOUND",
            Self::Cancelled => "CANCELLED",
            Self::Database(_) => "DATABASE_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn http_status_code(&self) -> u16 {
        match self {
            // 400 Bad Request - malformed input
            Self::Validation(_) => 400,

            // 404 Not Found
            Self::NotFound { .. } | Self::BudgetNotFound { .. } => 404,

            // 409 Conflict - state of the world forbids the change
            Self::PeriodClosed { .. }
            | Self::PeriodHasDrafts { .. }
            | Self::InvalidTransition { .. }
            | Self::AlreadyReversed { .. }
            | Self::ConcurrencyConflict(_) => 409,

            // 422 Unprocessable Entity - business rule refused the request
            Self::BudgetExceeded { .. }
            | Self::UnknownEventType(_)
            | Self::RuleRejected { .. } => 422,

            Self::Cancelled => 499,

            Self::Database(_) | Self::Internal(_) => 500,
        }
    }

    /// Only concurrency conflicts are safe to retry; every guard re-runs on
    /// the next attempt.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::ConcurrencyConflict(_))
    }

    /// Structured resolution data for API responses.
    #[must_use]
    pub fn details(&self) -> Option<serde_json::Value> {
        match self {
            Self::Validation(ValidationError::Unbalanced { debit, credit }) => Some(json!({
                "debit": debit,
                "credit": credit,
                "difference": debit - credit,
            })),
            Self::Validation(
                ValidationError::NegativeAmount { line_no }
                | ValidationError::ZeroLine { line_no }
                | ValidationError::BothSides { line_no }
                | ValidationError::MissingAccountCode { line_no },
            ) => Some(json!({ "line_no": line_no })),
            Self::PeriodClosed {
                period_key,
                business_date,
            } => Some(json!({
                "period_key": period_key,
                "period_status": "closed",
                "business_date": business_date,
            })),
            Self::PeriodHasDrafts {
                period_key,
                draft_count,
            } => Some(json!({ "period_key": period_key, "draft_count": draft_count })),
            Self::BudgetExceeded {
                category,
                period_key,
                budget,
                occupied,
                requested,
                remaining,
            } => Some(json!({
                "category": category,
                "period_key": period_key,
                "budget": budget,
                "occupied": occupied,
                "requested": requested,
                "remaining": remaining,
            })),
            Self::BudgetNotFound {
                category,
                period_key,
            } => Some(json!({ "category": category, "period_key": period_key })),
            Self::InvalidTransition { from, action } => {
                Some(json!({ "status": from, "action": action }))
            }
            Self::AlreadyReversed {
                voucher_id,
                reversed_by,
            } => Some(json!({ "voucher_id": voucher_id, "reversed_by": reversed_by })),
            Self::UnknownEventType(event_type) => Some(json!({ "event_type": event_type })),
            Self::RuleRejected { event_type, .. } => Some(json!({ "event_type": event_type })),
            Self::NotFound { resource, id } => Some(json!({ "resource": resource, "id": id })),
            _ => None,
        }
    }
}
