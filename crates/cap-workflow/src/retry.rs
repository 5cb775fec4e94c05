//! Caller-side retry with exponential backoff.
//!
//! The workflow core never retries on its own; a retried mutation could
//! otherwise apply twice. Callers that accept that risk for retryable kinds
//! (`StoreUnavailable`, `Busy`) wrap an operation in [`with_retry`]. Domain
//! failures are returned immediately.

use std::future::Future;

use cap_config::RetryConfig;

use crate::WorkflowError;

/// Run `op` until it succeeds, fails with a non-retryable kind, or
/// `config.max_attempts` attempts have been made.
///
/// # Errors
///
/// Returns the last error produced by `op`.
pub async fn with_retry<T, F, Fut>(config: &RetryConfig, mut op: F) -> Result<T, WorkflowError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, WorkflowError>>,
{
    let max_attempts = config.max_attempts.max(1);
    let mut attempt = 1;
    loop {
        match op().await {
            Err(e) if e.is_retryable() && attempt < max_attempts => {
                let delay = config.delay_for(attempt);
                tracing::warn!(
                    attempt,
                    max_attempts,
                    ?delay,
                    error = %e,
                    "retryable failure, backing off"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            result => return result,
        }
    }
}
