//! Cash transaction types and the voucher template for cash movements.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tally_shared::AccountMapping;
use tally_shared::types::{CashTransactionId, EntityId, TenantId, VoucherId};

use crate::error::ValidationError;
use crate::voucher::{VoucherDraft, VoucherLineInput, VoucherSource};

/// Direction of a cash movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CashDirection {
    /// Money received.
    In,
    /// Money paid out.
    Out,
}

impl CashDirection {
    /// Lowercase storage name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::In => "in",
            Self::Out => "out",
        }
    }
}

impl fmt::Display for CashDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CashDirection {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "in" => Ok(Self::In),
            "out" => Ok(Self::Out),
            other => Err(ValidationError::Payload(format!("unknown cash direction '{other}'"))),
        }
    }
}

/// Reconciliation state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchStatus {
    /// Not yet matched to an external flow.
    Pending,
    /// Matched.
    Matched,
}

impl MatchStatus {
    /// Lowercase storage name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Matched => "matched",
        }
    }
}

impl FromStr for MatchStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "matched" => Ok(Self::Matched),
            other => Err(ValidationError::Payload(format!("unknown match status '{other}'"))),
        }
    }
}

/// Which money account the movement goes through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CashAccount {
    /// Cash on hand.
    #[default]
    Cash,
    /// Bank account.
    Bank,
}

impl CashAccount {
    /// Lowercase storage name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Cash => "cash",
            Self::Bank => "bank",
        }
    }
}

impl FromStr for CashAccount {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cash" => Ok(Self::Cash),
            "bank" => Ok(Self::Bank),
            other => Err(ValidationError::Payload(format!("unknown cash account '{other}'"))),
        }
    }
}

/// A requested cash movement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CashTransactionInput {
    /// Business entity.
    pub entity_id: EntityId,
    /// Date of the movement.
    pub business_date: NaiveDate,
    /// Positive amount.
    pub amount: Decimal,
    /// In or out.
    pub direction: CashDirection,
    /// Cash or bank.
    #[serde(default)]
    pub account: CashAccount,
    /// External reference, e.g. a bank statement line id.
    #[serde(default)]
    pub external_ref: Option<String>,
    /// Counterparty name.
    #[serde(default)]
    pub counterparty: Option<String>,
    /// Free text.
    #[serde(default)]
    pub memo: Option<String>,
}

/// A stored cash movement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CashTransaction {
    /// Id.
    pub id: CashTransactionId,
    /// Owning tenant.
    pub tenant_id: TenantId,
    /// Business entity.
    pub entity_id: EntityId,
    /// Date of the movement.
    pub business_date: NaiveDate,
    /// Amount.
    pub amount: Decimal,
    /// In or out.
    pub direction: CashDirection,
    /// Cash or bank.
    pub account: CashAccount,
    /// External reference.
    pub external_ref: Option<String>,
    /// Counterparty.
    pub counterparty: Option<String>,
    /// Memo.
    pub memo: Option<String>,
    /// Reconciliation state.
    pub match_status: MatchStatus,
    /// Id of the external flow this was matched to.
    pub match_id: Option<String>,
    /// Generated voucher, if any.
    pub voucher_id: Option<VoucherId>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last change.
    pub updated_at: DateTime<Utc>,
}

/// Stateless cash transaction logic.
pub struct CashService;

impl CashService {
    /// Validates a movement.
    ///
    /// # Errors
    ///
    /// `InvalidAmount` unless the amount is positive; `MissingField` for a
    /// blank external reference.
    pub fn validate(input: &CashTransactionInput) -> Result<(), ValidationError> {
        if input.amount <= Decimal::ZERO {
            return Err(ValidationError::InvalidAmount);
        }
        if input
            .external_ref
            .as_deref()
            .is_some_and(|r| r.trim().is_empty())
        {
            return Err(ValidationError::MissingField("external_ref"));
        }
        Ok(())
    }

    /// Draft voucher for a movement: money account against suspense.
    #[must_use]
    pub fn voucher_draft(input: &CashTransactionInput, accounts: &AccountMapping) -> VoucherDraft {
        let money_account = match input.account {
            CashAccount::Cash => &accounts.cash,
            CashAccount::Bank => &accounts.bank,
        };
        let memo = input
            .memo
            .clone()
            .or_else(|| input.counterparty.clone())
            .unwrap_or_else(|| format!("cash {}", input.direction));

        let lines = match input.direction {
            CashDirection::In => vec![
                VoucherLineInput::debit(money_account, input.amount).with_memo(memo.clone()),
                VoucherLineInput::credit(&accounts.suspense, input.amount).with_memo(memo),
            ],
            CashDirection::Out => vec![
                VoucherLineInput::debit(&accounts.suspense, input.amount).with_memo(memo.clone()),
                VoucherLineInput::credit(money_account, input.amount).with_memo(memo),
            ],
        };

        let description = match (&input.counterparty, input.direction) {
            (Some(counterparty), CashDirection::In) => format!("Cash received from {counterparty}"),
            (Some(counterparty), CashDirection::Out) => format!("Cash paid to {counterparty}"),
            (None, CashDirection::In) => "Cash received".to_string(),
            (None, CashDirection::Out) => "Cash paid".to_string(),
        };

        VoucherDraft {
            entity_id: input.entity_id,
            business_date: input.business_date,
            description,
            lines,
            attachments: input
                .external_ref
                .as_ref()
                .map(|r| serde_json::json!({ "external_ref": r })),
            source: VoucherSource::Cash,
            budget_category: None,
            budget_amount: None,
        }
    }

    /// Validates a match id.
    ///
    /// # Errors
    ///
    /// `MissingField("match_id")` when blank.
    pub fn validate_match_id(match_id: &str) -> Result<&str, ValidationError> {
        let match_id = match_id.trim();
        if match_id.is_empty() {
            return Err(ValidationError::MissingField("match_id"));
        }
        Ok(match_id)
    }
}
