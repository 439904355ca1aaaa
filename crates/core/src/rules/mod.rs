//! Rule engine: turns business events into draft vouchers.
//!
//! Each event type has exactly one [`VoucherRule`] registered in a
//! [`RuleRegistry`]. Rules are pure functions of the event payload and the
//! configured [`AccountMapping`]; the registry validates every generated
//! voucher against the double-entry invariant before handing it out.

pub mod daily_settlement;
pub mod member_stored_value;
pub mod platform_settlement;
pub mod purchase_receipt;
pub mod registry;

pub use daily_settlement::DailySettlementRule;
pub use member_stored_value::MemberStoredValueRule;
pub use platform_settlement::PlatformSettlementRule;
pub use purchase_receipt::PurchaseReceiptRule;
pub use registry::{BusinessEvent, RuleRegistry, VoucherRule};

use rust_decimal::Decimal;
use serde::de::DeserializeOwned;

use crate::error::{LedgerError, ValidationError};
use crate::voucher::VoucherLineInput;

/// Deserializes an event payload into the rule's typed form.
pub(crate) fn parse_payload<T: DeserializeOwned>(event: &BusinessEvent) -> Result<T, LedgerError> {
    serde_json::from_value(event.payload.clone()).map_err(|e| {
        ValidationError::Payload(format!("{} payload: {e}", event.event_type)).into()
    })
}

/// Rejects amounts that are not strictly positive.
pub(crate) fn require_positive(amount: Decimal) -> Result<Decimal, LedgerError> {
    if amount <= Decimal::ZERO {
        return Err(ValidationError::InvalidAmount.into());
    }
    Ok(amount)
}

/// Rejects negative amounts.
pub(crate) fn require_non_negative(amount: Decimal) -> Result<Decimal, LedgerError> {
    if amount < Decimal::ZERO {
        return Err(ValidationError::InvalidAmount.into());
    }
    Ok(amount)
}

/// Appends a line unless its amount is zero.
pub(crate) fn push_line(lines: &mut Vec<VoucherLineInput>, line: VoucherLineInput) {
    if !(line.debit.is_zero() && line.credit.is_zero()) {
        lines.push(line);
    }
}

/// Wraps generated lines into an event-sourced draft.
pub(crate) fn event_draft(
    event: &BusinessEvent,
    business_date: Option<chrono::NaiveDate>,
    description: String,
    lines: Vec<VoucherLineInput>,
) -> crate::voucher::VoucherDraft {
    crate::voucher::VoucherDraft {
        entity_id: event.entity_id,
        business_date: business_date.unwrap_or_else(|| event.occurred_at.date_naive()),
        description,
        lines,
        attachments: Some(serde_json::json!({
            "event_type": event.event_type,
            "event_id": event.event_id,
        })),
        source: crate::voucher::VoucherSource::Event {
            event_type: event.event_type.clone(),
            event_id: event.event_id.clone(),
        },
        budget_category: None,
        budget_amount: None,
    }
}

/// Builds a `RuleRejected` error for `event`.
pub(crate) fn rejected(event: &BusinessEvent, reason: impl Into<String>) -> LedgerError {
    LedgerError::RuleRejected {
        event_type: event.event_type.clone(),
        reason: reason.into(),
    }
}
