//! `platform_settlement`: a delivery platform pays out a store's takings
//! net of its commission.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use tally_shared::AccountMapping;

use super::registry::{BusinessEvent, VoucherRule};
use super::{event_draft, parse_payload, push_line, rejected, require_non_negative, require_positive};
use crate::error::LedgerError;
use crate::voucher::{VoucherDraft, VoucherLineInput};

/// Payload of a platform settlement.
#[derive(Debug, Clone, Deserialize)]
pub struct PlatformSettlementPayload {
    /// Platform name, e.g. `meituan`.
    pub platform: String,
    /// Gross receivable being settled.
    pub gross_amount: Decimal,
    /// Commission withheld by the platform.
    #[serde(default)]
    pub commission: Decimal,
    /// Amount paid into the bank; must equal gross minus commission when given.
    #[serde(default)]
    pub net_amount: Option<Decimal>,
    /// Defaults to the date the event occurred.
    #[serde(default)]
    pub business_date: Option<NaiveDate>,
}

/// Rule for `platform_settlement`: debit bank and commission expense,
/// credit the platform receivable.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlatformSettlementRule;

impl VoucherRule for PlatformSettlementRule {
    fn event_type(&self) -> &'static str {
        "platform_settlement"
    }

    fn build(&self, event: &BusinessEvent, accounts: &AccountMapping) -> Result<VoucherDraft, LedgerError> {
        let payload: PlatformSettlementPayload = parse_payload(event)?;
        let gross = require_positive(payload.gross_amount)?;
        let commission = require_non_negative(payload.commission)?;
        if commission > gross {
            return Err(rejected(
                event,
                format!("commission {commission} exceeds gross amount {gross}"),
            ));
        }

        let net = gross - commission;
        if let Some(reported) = payload.net_amount.filter(|reported| *reported != net) {
            return Err(rejected(
                event,
                format!("net amount {reported} does not equal gross {gross} minus commission {commission}"),
            ));
        }

        let platform = payload.platform.trim();
        let mut lines = Vec::new();
        push_line(
            &mut lines,
            VoucherLineInput::debit(&accounts.bank, net).with_memo(format!("{platform} payout")),
        );
        push_line(
            &mut lines,
            VoucherLineInput::debit(&accounts.commission_expense, commission)
                .with_memo(format!("{platform} commission")),
        );
        push_line(
            &mut lines,
            VoucherLineInput::credit(&accounts.platform_receivable, gross)
                .with_memo(format!("{platform} receivable")),
        );

        Ok(event_draft(
            event,
            payload.business_date,
            format!("Platform settlement from {platform}"),
            lines,
        ))
    }
}
