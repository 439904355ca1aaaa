//! Business event ingestion: event → rule → voucher.
//!
//! Idempotent on `(tenant, event_id)`: an event seen before returns the
//! voucher it produced the first time. Two concurrent deliveries of the same
//! event race on the unique index; the loser retries and finds the winner's
//! voucher.

use std::sync::Arc;

use sea_orm::{DatabaseConnection, TransactionTrait};
use serde::{Deserialize, Serialize};
use tally_core::LedgerError;
use tally_core::budget::PostingBudgetRequest;
use tally_core::rules::{BusinessEvent, RuleRegistry};
use tally_core::voucher::{Voucher, VoucherStatus};
use tally_shared::{AccountMapping, RetryConfig};
use tracing::{debug, info};

use super::voucher::{find_by_event, insert_voucher, transition_in_txn};
use crate::error::db_err;
use crate::retry::with_retry;

/// Outcome of ingesting one event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestOutcome {
    /// The voucher generated for the event.
    pub voucher: Voucher,
    /// False when the event had already been ingested.
    pub created: bool,
}

/// Event ingestion repository.
#[derive(Clone)]
pub struct EventRepository {
    db: DatabaseConnection,
    rules: Arc<RuleRegistry>,
    accounts: AccountMapping,
    retry: RetryConfig,
}

impl EventRepository {
    /// Creates a new event repository.
    #[must_use]
    pub const fn new(
        db: DatabaseConnection,
        rules: Arc<RuleRegistry>,
        accounts: AccountMapping,
        retry: RetryConfig,
    ) -> Self {
        Self {
            db,
            rules,
            accounts,
            retry,
        }
    }

    /// Turns an event into a draft voucher, posting it when `auto_post` is
    /// set. Creation and posting happen in one transaction.
    ///
    /// # Errors
    ///
    /// - `UnknownEventType` when no rule handles the event type
    /// - `RuleRejected` / `Validation` for a payload the rule cannot book
    /// - `PeriodClosed` and budget errors from the posting guards
    pub async fn ingest(
        &self,
        event: &BusinessEvent,
        auto_post: bool,
    ) -> Result<IngestOutcome, LedgerError> {
        let tenant_id = event.tenant_id;

        with_retry(&self.retry, "ingest_event", || async move {
            let txn = self.db.begin().await.map_err(db_err)?;
            if let Some(voucher) = find_by_event(&txn, tenant_id, &event.event_id).await? {
                debug!(tenant_id = %tenant_id, event_id = %event.event_id, "Event already ingested");
                return Ok(IngestOutcome {
                    voucher,
                    created: false,
                });
            }

            let draft = self.rules.generate(event, &self.accounts)?;
            let mut voucher =
                insert_voucher(&txn, tenant_id, &draft, VoucherStatus::Draft, None).await?;
            if auto_post {
                voucher = transition_in_txn(
                    &txn,
                    tenant_id,
                    voucher.id,
                    VoucherStatus::Posted,
                    None,
                    PostingBudgetRequest::default(),
                )
                .await?;
            }
            txn.commit().await.map_err(db_err)?;

            info!(
                tenant_id = %tenant_id,
                event_type = %event.event_type,
                event_id = %event.event_id,
                voucher_id = %voucher.id,
                status = %voucher.status,
                "Event booked"
            );
            Ok(IngestOutcome {
                voucher,
                created: true,
            })
        })
        .await
    }

    /// Event types with a registered rule.
    #[must_use]
    pub fn event_types(&self) -> Vec<&'static str> {
        self.rules.event_types()
    }
}
