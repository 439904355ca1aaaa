//! Bounded retry for operations that lost a lock or uniqueness race.

use std::future::Future;
use std::time::Duration;

use tally_core::LedgerError;
use tally_shared::RetryConfig;
use tracing::warn;

/// Runs `op` until it succeeds, fails with a non-retryable error, or
/// `config.max_attempts` is exhausted.
///
/// Every attempt must run its own database transaction; guards are
/// re-checked from scratch each time.
pub async fn with_retry<T, F, Fut>(
    config: &RetryConfig,
    operation: &'static str,
    mut op: F,
) -> Result<T, LedgerError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, LedgerError>>,
{
    let max_attempts = config.max_attempts.max(1);
    let mut backoff = Duration::from_millis(config.base_backoff_ms);
    let mut attempt = 1;

    loop {
        match op().await {
            Err(err) if err.is_retryable() && attempt < max_attempts => {
                warn!(operation, attempt, error = %err, "Concurrency conflict, retrying");
                tokio::time::sleep(backoff).await;
                backoff = backoff.saturating_mul(2);
                attempt += 1;
            }
            result => return result,
        }
    }
}
