//! Bounded retry with exponential backoff.
//!
//! Both API clients run their HTTP call through [`execute_with_retry`] so the
//! attempt ceiling and the backoff curve live in one place.

use serde::{Deserialize, Serialize};
use std::{fmt::Display, future::Future, time::Duration};
use tracing::{debug, warn};

/// How many times to try an operation and how long to wait in between.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Total attempts, including the first one (default: 3).
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Wait after the first failure, doubled after each further one (default: 1s).
    #[serde(default = "default_initial_delay")]
    pub initial_delay_ms: u64,

    /// Upper bound for any single wait (default: 10s).
    #[serde(default = "default_max_delay")]
    pub max_delay_ms: u64,
}

const fn default_max_attempts() -> u32 {
    3
}

const fn default_initial_delay() -> u64 {
    1_000
}

const fn default_max_delay() -> u64 {
    10_000
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_delay_ms: default_initial_delay(),
            max_delay_ms: default_max_delay(),
        }
    }
}

impl RetryPolicy {
    /// Wait before the next try, after `attempt` (1-based) has failed.
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(63);
        let delay = self
            .initial_delay_ms
            .saturating_mul(1u64 << exponent)
            .min(self.max_delay_ms);
        Duration::from_millis(delay)
    }
}

/// Run `operation` until it succeeds, fails with an error `is_retryable`
/// rejects, or `policy.max_attempts` is reached. The last error is returned
/// unchanged.
pub async fn execute_with_retry<F, Fut, T, E, P>(
    policy: &RetryPolicy,
    is_retryable: P,
    mut operation: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    P: Fn(&E) -> bool,
    E: Display,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 0u32;

    loop {
        attempt += 1;

        let err = match operation().await {
            Ok(value) => {
                if attempt > 1 {
                    debug!(attempt, "operation succeeded after retries");
                }
                return Ok(value);
            }
            Err(err) => err,
        };

        if !is_retryable(&err) {
            debug!(attempt, error = %err, "operation failed with non-retryable error");
            return Err(err);
        }

        if attempt >= max_attempts {
            warn!(attempt, max_attempts, error = %err, "operation failed after max attempts");
            return Err(err);
        }

        let delay = policy.delay_after(attempt);
        warn!(
            attempt,
            max_attempts,
            delay_ms = delay.as_millis() as u64,
            error = %err,
            "operation failed, retrying"
        );
        tokio::time::sleep(delay).await;
    }
}
