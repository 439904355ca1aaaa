//! Voucher domain types.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tally_shared::types::{EntityId, TenantId, VoucherId};

use crate::error::ValidationError;
use crate::period::PeriodKey;

/// Voucher status.
///
/// Valid transitions:
/// - Draft → Pending (submit)
/// - Draft → Posted (direct posting)
/// - Pending → Approved (approve)
/// - Approved → Posted (post)
/// - Draft | Pending → Rejected (reject)
/// - Draft | Posted → Voided (void)
///
/// A posted voucher may also be red-flushed, which leaves it `Posted` and
/// records a new posted voucher with the legs swapped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoucherStatus {
    /// Editable, not yet in the ledger.
    Draft,
    /// Submitted for approval.
    Pending,
    /// Approved, waiting to be posted.
    Approved,
    /// In the ledger.
    Posted,
    /// Refused during review (terminal).
    Rejected,
    /// Cancelled (terminal); contributes nothing to the ledger.
    Voided,
}

impl VoucherStatus {
    /// All statuses, in lifecycle order.
    pub const ALL: [Self; 6] = [
        Self::Draft,
        Self::Pending,
        Self::Approved,
        Self::Posted,
        Self::Rejected,
        Self::Voided,
    ];

    /// Lowercase storage name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Posted => "posted",
            Self::Rejected => "rejected",
            Self::Voided => "voided",
        }
    }

    /// Statuses whose lines count in ledger queries.
    ///
    /// Rejected and voided vouchers never count.
    #[must_use]
    pub fn ledger_visible(posted_only: bool) -> &'static [Self] {
        if posted_only {
            &[Self::Posted]
        } else {
            &[Self::Draft, Self::Pending, Self::Approved, Self::Posted]
        }
    }
}

impl fmt::Display for VoucherStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VoucherStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| ValidationError::Payload(format!("unknown voucher status '{s}'")))
    }
}

/// Something a caller can do to a voucher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VoucherAction {
    /// Draft → Pending.
    Submit,
    /// Pending → Approved.
    Approve,
    /// Draft | Approved → Posted.
    Post,
    /// Draft | Pending → Rejected.
    Reject,
    /// Draft | Posted → Voided.
    Void,
    /// Posted → Posted, plus a reversing voucher.
    RedFlush,
}

impl VoucherAction {
    /// The action that moves a voucher into `target`, if one exists.
    #[must_use]
    pub const fn for_target(target: VoucherStatus) -> Option<Self> {
        match target {
            VoucherStatus::Pending => Some(Self::Submit),
            VoucherStatus::Approved => Some(Self::Approve),
            VoucherStatus::Posted => Some(Self::Post),
            VoucherStatus::Rejected => Some(Self::Reject),
            VoucherStatus::Voided => Some(Self::Void),
            VoucherStatus::Draft => None,
        }
    }

    /// Snake-case name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Submit => "submit",
            Self::Approve => "approve",
            Self::Post => "post",
            Self::Reject => "reject",
            Self::Void => "void",
            Self::RedFlush => "red_flush",
        }
    }
}

impl fmt::Display for VoucherAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a voucher came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum VoucherSource {
    /// Entered by a user.
    Manual,
    /// Generated by the rule engine from a business event.
    Event {
        /// Event type the rule was registered for.
        event_type: String,
        /// Producer's event id; unique per tenant.
        event_id: String,
    },
    /// Generated alongside a cash transaction.
    Cash,
    /// Red-flush of another voucher.
    RedFlush,
}

impl VoucherSource {
    /// Storage name of the source kind.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Manual => "manual",
            Self::Event { .. } => "event",
            Self::Cash => "cash",
            Self::RedFlush => "red_flush",
        }
    }

    /// Rebuilds a source from its stored columns.
    #[must_use]
    pub fn from_parts(kind: &str, event_type: Option<String>, event_id: Option<String>) -> Self {
        match (kind, event_type, event_id) {
            ("event", Some(event_type), Some(event_id)) => Self::Event {
                event_type,
                event_id,
            },
            ("cash", ..) => Self::Cash,
            ("red_flush", ..) => Self::RedFlush,
            _ => Self::Manual,
        }
    }
}

/// One requested debit or credit leg.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoucherLineInput {
    /// Chart-of-accounts code, e.g. `1001`.
    pub account_code: String,
    /// Display name for the account.
    #[serde(default)]
    pub account_name: Option<String>,
    /// Debit amount; zero when this is a credit line.
    #[serde(default)]
    pub debit: Decimal,
    /// Credit amount; zero when this is a debit line.
    #[serde(default)]
    pub credit: Decimal,
    /// Free-text memo.
    #[serde(default)]
    pub memo: Option<String>,
}

impl VoucherLineInput {
    /// A debit line.
    #[must_use]
    pub fn debit(account_code: impl Into<String>, amount: Decimal) -> Self {
        Self {
            account_code: account_code.into(),
            account_name: None,
            debit: amount,
            credit: Decimal::ZERO,
            memo: None,
        }
    }

    /// A credit line.
    #[must_use]
    pub fn credit(account_code: impl Into<String>, amount: Decimal) -> Self {
        Self {
            account_code: account_code.into(),
            account_name: None,
            debit: Decimal::ZERO,
            credit: amount,
            memo: None,
        }
    }

    /// Attaches a memo.
    #[must_use]
    pub fn with_memo(mut self, memo: impl Into<String>) -> Self {
        self.memo = Some(memo.into());
        self
    }
}

/// A voucher to be created as a draft.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoucherDraft {
    /// Store or legal entity the voucher books for.
    pub entity_id: EntityId,
    /// Accounting date; decides the period.
    pub business_date: NaiveDate,
    /// Summary text.
    pub description: String,
    /// Debit and credit legs.
    pub lines: Vec<VoucherLineInput>,
    /// Free-form references back to invoices, orders and other documents.
    #[serde(default)]
    pub attachments: Option<serde_json::Value>,
    /// Origin of the voucher.
    pub source: VoucherSource,
    /// Budget category the voucher consumes when posted.
    #[serde(default)]
    pub budget_category: Option<String>,
    /// Amount to occupy; defaults to the total debit.
    #[serde(default)]
    pub budget_amount: Option<Decimal>,
}

impl VoucherDraft {
    /// A manual draft with no budget claim.
    #[must_use]
    pub fn manual(
        entity_id: EntityId,
        business_date: NaiveDate,
        description: impl Into<String>,
        lines: Vec<VoucherLineInput>,
    ) -> Self {
        Self {
            entity_id,
            business_date,
            description: description.into(),
            lines,
            attachments: None,
            source: VoucherSource::Manual,
            budget_category: None,
            budget_amount: None,
        }
    }

    /// The period the draft is dated in.
    #[must_use]
    pub fn period_key(&self) -> PeriodKey {
        PeriodKey::from_date(self.business_date)
    }
}

/// Debit and credit totals of a voucher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct VoucherTotals {
    /// Sum of debits.
    pub debit: Decimal,
    /// Sum of credits.
    pub credit: Decimal,
}

/// A stored voucher line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoucherLine {
    /// 1-based ordering within the voucher.
    pub line_no: u32,
    /// Account code.
    pub account_code: String,
    /// Account display name.
    pub account_name: Option<String>,
    /// Debit amount.
    pub debit: Decimal,
    /// Credit amount.
    pub credit: Decimal,
    /// Memo.
    pub memo: Option<String>,
}

impl From<&VoucherLine> for VoucherLineInput {
    fn from(line: &VoucherLine) -> Self {
        Self {
            account_code: line.account_code.clone(),
            account_name: line.account_name.clone(),
            debit: line.debit,
            credit: line.credit,
            memo: line.memo.clone(),
        }
    }
}

/// A stored voucher with its lines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Voucher {
    /// Voucher id.
    pub id: VoucherId,
    /// Owning tenant.
    pub tenant_id: TenantId,
    /// Business entity.
    pub entity_id: EntityId,
    /// Human-facing number, unique per tenant.
    pub voucher_no: String,
    /// Accounting date.
    pub business_date: NaiveDate,
    /// Period derived from the business date.
    pub period_key: PeriodKey,
    /// Summary text.
    pub description: String,
    /// Lifecycle status.
    pub status: VoucherStatus,
    /// Origin.
    pub source: VoucherSource,
    /// Source document references.
    pub attachments: Option<serde_json::Value>,
    /// Budget category consumed on posting.
    pub budget_category: Option<String>,
    /// Explicit budget amount.
    pub budget_amount: Option<Decimal>,
    /// Totals across lines.
    pub totals: VoucherTotals,
    /// The voucher this one reverses.
    pub reverses_voucher_id: Option<VoucherId>,
    /// The reversal recorded against this voucher.
    pub reversed_by_voucher_id: Option<VoucherId>,
    /// Reason given on reject or void.
    pub status_reason: Option<String>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Posting time.
    pub posted_at: Option<DateTime<Utc>>,
    /// Last status change.
    pub updated_at: DateTime<Utc>,
    /// Debit and credit legs, ordered by line number.
    pub lines: Vec<VoucherLine>,
}

impl Voucher {
    /// Amount a posting should occupy against the voucher's budget.
    #[must_use]
    pub fn budget_claim(&self) -> Option<(&str, Decimal)> {
        self.budget_category
            .as_deref()
            .map(|category| (category, self.budget_amount.unwrap_or(self.totals.debit)))
    }
}

/// Formats a voucher number: `V{YYYYMM}-{seq:05}`.
#[must_use]
pub fn format_voucher_no(period: PeriodKey, seq: i64) -> String {
    format!("V{}-{seq:05}", period.compact())
}
