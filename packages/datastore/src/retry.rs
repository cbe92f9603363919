//! Retry-on-throttle machinery for datastore requests.
//!
//! Only rate-limit responses are retried; every other error propagates to
//! the caller on the first occurrence. The delay grows linearly with the
//! retry number (`attempt * base_delay`).

use std::future::Future;
use std::time::Duration;

use crate::DatastoreError;

/// Retry policy for rate-limited requests.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum number of retries after the initial attempt.
    pub limit: u32,
    /// Base delay; the n-th retry waits `n * base_delay`.
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            limit: 3,
            base_delay: Duration::from_secs(2),
        }
    }
}

impl RetryPolicy {
    /// Delay before the given retry (1-based).
    #[must_use]
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay * attempt
    }
}

/// Runs `op` until it succeeds, fails with a non-rate-limit error, or
/// exhausts the retry budget. The operation receives the zero-based
/// attempt number.
///
/// # Errors
///
/// Returns [`DatastoreError::RateLimited`] once the budget is exhausted,
/// or the operation's own error for anything that is not a rate limit.
pub async fn with_retry<T, F, Fut>(policy: &RetryPolicy, mut op: F) -> Result<T, DatastoreError>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, DatastoreError>>,
{
    let mut attempt: u32 = 0;
    loop {
        match op(attempt).await {
            Err(DatastoreError::RateLimited { .. }) if attempt < policy.limit => {
                attempt += 1;
                let delay = policy.delay_for(attempt);
                log::warn!("Rate limited, retrying in {}ms (attempt {attempt})", delay.as_millis());
                tokio::time::sleep(delay).await;
            }
            result => return result,
        }
    }
}
