//! `store_daily_settlement`: end-of-day takings of a store.
//!
//! Debits the account each payment method settles into and credits revenue
//! (net of tax) and tax payable.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use tally_shared::AccountMapping;
use tally_shared::types::is_balanced;

use super::registry::{BusinessEvent, VoucherRule};
use super::{event_draft, parse_payload, push_line, rejected, require_non_negative, require_positive};
use crate::error::LedgerError;
use crate::voucher::{VoucherDraft, VoucherLineInput};

/// Payload of a daily settlement.
#[derive(Debug, Clone, Deserialize)]
pub struct DailySettlementPayload {
    /// Gross takings including tax.
    pub total_sales: Decimal,
    /// Output tax contained in `total_sales`.
    #[serde(default)]
    pub tax: Decimal,
    /// Takings per payment method, e.g. `[{"wechat": 30000}, {"cash": 20000}]`.
    pub payment_breakdown: Vec<BTreeMap<String, Decimal>>,
    /// Defaults to the date the event occurred.
    #[serde(default)]
    pub business_date: Option<NaiveDate>,
}

/// Rule for `store_daily_settlement`.
#[derive(Debug, Clone, Copy, Default)]
pub struct DailySettlementRule;

impl VoucherRule for DailySettlementRule {
    fn event_type(&self) -> &'static str {
        "store_daily_settlement"
    }

    fn build(&self, event: &BusinessEvent, accounts: &AccountMapping) -> Result<VoucherDraft, LedgerError> {
        let payload: DailySettlementPayload = parse_payload(event)?;
        let total = require_positive(payload.total_sales)?;
        let tax = require_non_negative(payload.tax)?;
        if tax > total {
            return Err(rejected(event, format!("tax {tax} exceeds total sales {total}")));
        }

        let mut lines = Vec::new();
        let mut collected = Decimal::ZERO;
        for (method, amount) in payload.payment_breakdown.iter().flatten() {
            let amount = require_non_negative(*amount)?;
            let account = accounts
                .payment_account(method)
                .ok_or_else(|| rejected(event, format!("no account mapped for payment method '{method}'")))?;
            collected += amount;
            push_line(&mut lines, VoucherLineInput::debit(account, amount).with_memo(method.as_str()));
        }

        if !is_balanced(collected, total) {
            return Err(rejected(
                event,
                format!("payment breakdown sums to {collected}, total sales is {total}"),
            ));
        }

        push_line(
            &mut lines,
            VoucherLineInput::credit(&accounts.revenue, total - tax).with_memo("sales revenue"),
        );
        push_line(
            &mut lines,
            VoucherLineInput::credit(&accounts.tax_payable, tax).with_memo("output tax"),
        );

        let date = payload.business_date.unwrap_or_else(|| event.occurred_at.date_naive());
        Ok(event_draft(
            event,
            Some(date),
            format!("Daily settlement {date}"),
            lines,
        ))
    }
}
