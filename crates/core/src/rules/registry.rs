//! Rule registry and the business event contract.

use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tally_shared::AccountMapping;
use tally_shared::types::{EntityId, TenantId};

use super::{DailySettlementRule, MemberStoredValueRule, PlatformSettlementRule, PurchaseReceiptRule};
use crate::error::LedgerError;
use crate::voucher::{VoucherDraft, validate_draft};

/// A business event emitted by an adapter or business module.
///
/// Ingestion is idempotent on `(tenant_id, event_id)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusinessEvent {
    /// Registered rule name, e.g. `store_daily_settlement`.
    pub event_type: String,
    /// Producer-assigned id.
    pub event_id: String,
    /// Owning tenant.
    pub tenant_id: TenantId,
    /// Store or legal entity.
    pub entity_id: EntityId,
    /// When the business fact happened; its date is the default business date.
    pub occurred_at: DateTime<Utc>,
    /// Rule-specific body.
    pub payload: serde_json::Value,
}

/// Maps one event type to a draft voucher.
pub trait VoucherRule: Send + Sync {
    /// The event type this rule handles.
    fn event_type(&self) -> &'static str;

    /// Builds the draft. Must not depend on anything but its arguments.
    fn build(&self, event: &BusinessEvent, accounts: &AccountMapping) -> Result<VoucherDraft, LedgerError>;
}

/// Registry mapping event types to rules.
#[derive(Default)]
pub struct RuleRegistry {
    rules: HashMap<&'static str, Box<dyn VoucherRule>>,
}

impl fmt::Debug for RuleRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuleRegistry")
            .field("event_types", &self.event_types())
            .finish()
    }
}

impl RuleRegistry {
    /// An empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry with every built-in rule.
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(DailySettlementRule);
        registry.register(PurchaseReceiptRule);
        registry.register(PlatformSettlementRule);
        registry.register(MemberStoredValueRule);
        registry
    }

    /// Registers a rule, replacing any rule for the same event type.
    pub fn register<R: VoucherRule + 'static>(&mut self, rule: R) {
        self.rules.insert(rule.event_type(), Box::new(rule));
    }

    /// Registered event types, sorted.
    #[must_use]
    pub fn event_types(&self) -> Vec<&'static str> {
        let mut types: Vec<&'static str> = self.rules.keys().copied().collect();
        types.sort_unstable();
        types
    }

    /// Generates the draft voucher for an event.
    ///
    /// # Errors
    ///
    /// - `UnknownEventType` when no rule is registered
    /// - whatever the rule returns for a bad payload
    /// - `RuleRejected` when the rule produced a voucher that does not
    ///   satisfy the double-entry invariant
    pub fn generate(
        &self,
        event: &BusinessEvent,
        accounts: &AccountMapping,
    ) -> Result<VoucherDraft, LedgerError> {
        let rule = self
            .rules
            .get(event.event_type.as_str())
            .ok_or_else(|| LedgerError::UnknownEventType(event.event_type.clone()))?;

        let draft = rule.build(event, accounts)?;
        validate_draft(&draft).map_err(|e| LedgerError::RuleRejected {
            event_type: event.event_type.clone(),
            reason: e.to_string(),
        })?;
        Ok(draft)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::voucher::{VoucherLineInput, VoucherSource};
    use chrono::TimeZone;
    use rust_decimal_macros::dec;
    use serde_json::json;

    pub(crate) fn event(event_type: &str, payload: serde_json::Value) -> BusinessEvent {
        BusinessEvent {
            event_type: event_type.to_string(),
            event_id: "evt-1".to_string(),
            tenant_id: TenantId::new(),
            entity_id: EntityId::new(),
            occurred_at: Utc.with_ymd_and_hms(2024, 3, 15, 22, 0, 0).unwrap(),
            payload,
        }
    }

    struct UnbalancedRule;

    impl VoucherRule for UnbalancedRule {
        fn event_type(&self) -> &'static str {
            "broken"
        }

        fn build(&self, event: &BusinessEvent, _: &AccountMapping) -> Result<VoucherDraft, LedgerError> {
            let mut draft = VoucherDraft::manual(
                event.entity_id,
                event.occurred_at.date_naive(),
                "broken",
                vec![
                    VoucherLineInput::debit("1001", dec!(10)),
                    VoucherLineInput::credit("6001", dec!(9)),
                ],
            );
            draft.source = VoucherSource::Event {
                event_type: event.event_type.clone(),
                event_id: event.event_id.clone(),
            };
            Ok(draft)
        }
    }

    #[test]
    fn test_defaults_registered() {
        let registry = RuleRegistry::with_defaults();
        assert_eq!(
            registry.event_types(),
            vec![
                "member_stored_value",
                "platform_settlement",
                "purchase_receipt",
                "store_daily_settlement",
            ]
        );
    }

    #[test]
    fn test_unknown_event_type_is_rejected() {
        let registry = RuleRegistry::with_defaults();
        let err = registry
            .generate(&event("pos_refund", json!({})), &AccountMapping::default())
            .unwrap_err();
        assert!(matches!(err, LedgerError::UnknownEventType(t) if t == "pos_refund"));
    }

    #[test]
    fn test_unbalanced_rule_output_is_rejected() {
        let mut registry = RuleRegistry::new();
        registry.register(UnbalancedRule);
        assert_eq!(registry.event_types(), vec!["broken"]);
        let err = registry
            .generate(&event("broken", json!({})), &AccountMapping::default())
            .unwrap_err();
        assert!(matches!(err, LedgerError::RuleRejected { .. }));
    }
}
