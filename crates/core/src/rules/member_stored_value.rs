//! `member_stored_value`: prepaid member balances.
//!
//! A recharge is a liability to the member until it is consumed, at which
//! point it becomes revenue.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use tally_shared::AccountMapping;

use super::registry::{BusinessEvent, VoucherRule};
use super::{event_draft, parse_payload, push_line, rejected, require_positive};
use crate::error::LedgerError;
use crate::voucher::{VoucherDraft, VoucherLineInput};

/// Stored-value movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoredValueAction {
    /// Member tops up their balance.
    Recharge,
    /// Member spends from their balance.
    Consume,
}

/// Payload of a stored-value event.
#[derive(Debug, Clone, Deserialize)]
pub struct MemberStoredValuePayload {
    /// Recharge or consume.
    pub action: StoredValueAction,
    /// Amount moved.
    pub amount: Decimal,
    /// How a recharge was paid; defaults to cash.
    #[serde(default)]
    pub payment_method: Option<String>,
    /// Member reference for the memo.
    #[serde(default)]
    pub member_id: Option<String>,
    /// Defaults to the date the event occurred.
    #[serde(default)]
    pub business_date: Option<NaiveDate>,
}

/// Rule for `member_stored_value`.
#[derive(Debug, Clone, Copy, Default)]
pub struct MemberStoredValueRule;

impl VoucherRule for MemberStoredValueRule {
    fn event_type(&self) -> &'static str {
        "member_stored_value"
    }

    fn build(&self, event: &BusinessEvent, accounts: &AccountMapping) -> Result<VoucherDraft, LedgerError> {
        let payload: MemberStoredValuePayload = parse_payload(event)?;
        let amount = require_positive(payload.amount)?;
        let member = payload.member_id.as_deref().unwrap_or("member");

        let mut lines = Vec::new();
        let description = match payload.action {
            StoredValueAction::Recharge => {
                let method = payload.payment_method.as_deref().unwrap_or("cash");
                let account = accounts.payment_account(method).ok_or_else(|| {
                    rejected(event, format!("no account mapped for payment method '{method}'"))
                })?;
                push_line(&mut lines, VoucherLineInput::debit(account, amount).with_memo(method));
                push_line(
                    &mut lines,
                    VoucherLineInput::credit(&accounts.member_deposit, amount)
                        .with_memo(format!("Recharge by {member}")),
                );
                format!("Stored-value recharge by {member}")
            }
            StoredValueAction::Consume => {
                push_line(
                    &mut lines,
                    VoucherLineInput::debit(&accounts.member_deposit, amount)
                        .with_memo(format!("Consumption by {member}")),
                );
                push_line(
                    &mut lines,
                    VoucherLineInput::credit(&accounts.revenue, amount).with_memo("stored-value sales"),
                );
                format!("Stored-value consumption by {member}")
            }
        };

        Ok(event_draft(event, payload.business_date, description, lines))
    }
}
