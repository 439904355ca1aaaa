//! `purchase_receipt`: goods or services received from a supplier on credit.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use tally_shared::AccountMapping;

use super::registry::{BusinessEvent, VoucherRule};
use super::{event_draft, parse_payload, push_line, require_non_negative, require_positive};
use crate::error::LedgerError;
use crate::voucher::{VoucherDraft, VoucherLineInput};

/// What was purchased.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PurchaseKind {
    /// Stocked goods, debited to inventory.
    #[default]
    Inventory,
    /// Consumed immediately, debited to expense.
    Expense,
}

/// Payload of a purchase receipt.
#[derive(Debug, Clone, Deserialize)]
pub struct PurchaseReceiptPayload {
    /// Amount owed to the supplier, tax included.
    pub amount: Decimal,
    /// Input tax contained in `amount`, booked with the goods.
    #[serde(default)]
    pub tax: Decimal,
    /// Supplier name.
    #[serde(default)]
    pub supplier: Option<String>,
    /// Inventory or expense.
    #[serde(default)]
    pub kind: PurchaseKind,
    /// Budget category the purchase consumes.
    #[serde(default)]
    pub budget_category: Option<String>,
    /// Defaults to the date the event occurred.
    #[serde(default)]
    pub business_date: Option<NaiveDate>,
}

/// Rule for `purchase_receipt`: debit inventory or expense, credit accounts payable.
#[derive(Debug, Clone, Copy, Default)]
pub struct PurchaseReceiptRule;

impl VoucherRule for PurchaseReceiptRule {
    fn event_type(&self) -> &'static str {
        "purchase_receipt"
    }

    fn build(&self, event: &BusinessEvent, accounts: &AccountMapping) -> Result<VoucherDraft, LedgerError> {
        let payload: PurchaseReceiptPayload = parse_payload(event)?;
        let amount = require_positive(payload.amount)?;
        require_non_negative(payload.tax)?;

        let debit_account = match payload.kind {
            PurchaseKind::Inventory => &accounts.inventory,
            PurchaseKind::Expense => &accounts.expense,
        };
        let supplier = payload.supplier.as_deref().unwrap_or("supplier");

        let mut lines = Vec::new();
        push_line(
            &mut lines,
            VoucherLineInput::debit(debit_account, amount).with_memo(format!("Received from {supplier}")),
        );
        push_line(
            &mut lines,
            VoucherLineInput::credit(&accounts.accounts_payable, amount).with_memo(format!("Payable to {supplier}")),
        );

        let mut draft = event_draft(
            event,
            payload.business_date,
            format!("Purchase receipt from {supplier}"),
            lines,
        );
        draft.budget_category = payload.budget_category;
        Ok(draft)
    }
}
