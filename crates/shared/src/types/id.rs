//! Typed IDs for type-safe entity references.
//!
//! Using typed IDs prevents accidentally passing an `EntityId` where a `TenantId` is expected.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Macro to generate typed ID wrappers.
macro_rules! typed_id {
    ($name:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl $name {
            /// Creates a new random ID using UUID v7 (time-ordered).
            #[must_use]
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            /// Creates an ID from an existing UUID.
            #[must_use]
            pub const fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Returns the inner UUID.
            #[must_use]
            pub const fn into_inner(self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl std::str::FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(Uuid::parse_str(s)?))
            }
        }
    };
}

typed_id!(TenantId, "Unique identifier for a tenant.");
typed_id!(
    EntityId,
    "Unique identifier for a business entity (store or legal entity)."
);
typed_id!(VoucherId, "Unique identifier for a voucher.");
typed_id!(VoucherLineId, "Unique identifier for a voucher line.");
typed_id!(PeriodId, "Unique identifier for an accounting period.");
typed_id!(BudgetId, "Unique identifier for a budget.");
typed_id!(BudgetControlId, "Unique identifier for a budget control.");
typed_id!(OccupationId, "Unique identifier for a budget occupation record.");
typed_id!(
    CashTransactionId,
    "Unique identifier for a cash transaction."
);
