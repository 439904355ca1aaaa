//! Account balance aggregation.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::entry::LedgerEntry;

/// The one sign convention: `debit - credit`.
#[must_use]
pub fn signed_amount(debit: Decimal, credit: Decimal) -> Decimal {
    debit - credit
}

/// Balance of one account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountBalance {
    /// Account code.
    pub account_code: String,
    /// Display name from the first line that carried one.
    pub account_name: Option<String>,
    /// Total debit amount.
    pub debit_total: Decimal,
    /// Total credit amount.
    pub credit_total: Decimal,
    /// `debit_total - credit_total`.
    pub balance: Decimal,
}

impl AccountBalance {
    /// Creates an empty balance.
    #[must_use]
    pub fn new(account_code: String, account_name: Option<String>) -> Self {
        Self {
            account_code,
            account_name,
            debit_total: Decimal::ZERO,
            credit_total: Decimal::ZERO,
            balance: Decimal::ZERO,
        }
    }

    /// Adds one movement.
    pub fn add(&mut self, debit: Decimal, credit: Decimal) {
        self.debit_total += debit;
        self.credit_total += credit;
        self.balance = signed_amount(self.debit_total, self.credit_total);
    }

    fn absorb(&mut self, other: &Self) {
        if self.account_name.is_none() {
            self.account_name.clone_from(&other.account_name);
        }
        self.add(other.debit_total, other.credit_total);
    }
}

/// Groups entries by account code, ordered by code.
#[must_use]
pub fn aggregate_balances<'a>(entries: impl IntoIterator<Item = &'a LedgerEntry>) -> Vec<AccountBalance> {
    let mut by_account: BTreeMap<&str, AccountBalance> = BTreeMap::new();
    for entry in entries {
        let balance = by_account
            .entry(entry.account_code.as_str())
            .or_insert_with(|| AccountBalance::new(entry.account_code.clone(), None));
        if balance.account_name.is_none() {
            balance.account_name.clone_from(&entry.account_name);
        }
        balance.add(entry.debit, entry.credit);
    }
    by_account.into_values().collect()
}

/// Sums several balance lists account by account, ordered by code.
#[must_use]
pub fn merge_balances<'a>(lists: impl IntoIterator<Item = &'a [AccountBalance]>) -> Vec<AccountBalance> {
    let mut merged: BTreeMap<String, AccountBalance> = BTreeMap::new();
    for balance in lists.into_iter().flatten() {
        merged
            .entry(balance.account_code.clone())
            .or_insert_with(|| AccountBalance::new(balance.account_code.clone(), None))
            .absorb(balance);
    }
    merged.into_values().collect()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::voucher::VoucherStatus;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;
    use tally_shared::types::{EntityId, VoucherId};

    pub(crate) fn entry(account: &str, debit: Decimal, credit: Decimal) -> LedgerEntry {
        LedgerEntry {
            voucher_id: VoucherId::new(),
            voucher_no: "V202403-00001".into(),
            entity_id: EntityId::new(),
            business_date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            status: VoucherStatus::Posted,
            line_no: 1,
            account_code: account.into(),
            account_name: None,
            debit,
            credit,
            memo: None,
            reverses_voucher_id: None,
        }
    }

    #[test]
    fn test_scenario_sign_convention() {
        let entries = vec![
            entry("1001", dec!(100), dec!(0)),
            entry("6602", dec!(0), dec!(100)),
        ];
        let balances = aggregate_balances(&entries);
        assert_eq!(balances.len(), 2);
        assert_eq!(balances[0].account_code, "1001");
        assert_eq!(balances[0].balance, dec!(100));
        assert_eq!(balances[1].account_code, "6602");
        assert_eq!(balances[1].balance, dec!(-100));
    }

    #[test]
    fn test_aggregate_accumulates_per_account() {
        let mut named = entry("1002", dec!(0), dec!(30));
        named.account_name = Some("Bank".into());
        let entries = vec![entry("1002", dec!(100), dec!(0)), named];
        let balances = aggregate_balances(&entries);
        assert_eq!(balances.len(), 1);
        assert_eq!(balances[0].debit_total, dec!(100));
        assert_eq!(balances[0].credit_total, dec!(30));
        assert_eq!(balances[0].balance, dec!(70));
        assert_eq!(balances[0].account_name.as_deref(), Some("Bank"));
    }

    #[test]
    fn test_merge_balances() {
        let a = aggregate_balances(&[entry("1001", dec!(50), dec!(0))]);
        let b = aggregate_balances(&[
            entry("1001", dec!(25), dec!(0)),
            entry("6001", dec!(0), dec!(75)),
        ]);
        let merged = merge_balances([a.as_slice(), b.as_slice()]);
        assert_eq!(merged[0].balance, dec!(75));
        assert_eq!(merged[1].balance, dec!(-75));
    }
}
