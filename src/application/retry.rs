// Retry policy - Exponential backoff for upstream calls (no circuit breaker)
use std::future::Future;
use std::time::Duration;

use super::error::UpstreamError;

#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub retryable: fn(&UpstreamError) -> bool,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
            retryable: UpstreamError::is_retryable,
        }
    }

    /// Delay after a failed `attempt` (1-based): `base_delay * 2^(attempt - 1)`.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        self.base_delay.saturating_mul(1 << exponent)
    }
}

/// A successful result plus the number of attempts it took.
#[derive(Debug, Clone, PartialEq)]
pub struct Attempted<T> {
    pub value: T,
    pub attempts: u32,
}

/// Run `operation` until it succeeds, fails with a non-retryable error, or
/// the attempt budget is spent. The operation receives the 1-based attempt
/// number.
pub async fn call_with_policy<T, F, Fut>(
    policy: &RetryPolicy,
    mut operation: F,
) -> Result<Attempted<T>, UpstreamError>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, UpstreamError>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut last_error = None;

    for attempt in 1..=max_attempts {
        match operation(attempt).await {
            Ok(value) => {
                if attempt > 1 {
                    tracing::info!(attempt, "upstream call succeeded after retry");
                }
                return Ok(Attempted { value, attempts: attempt });
            }
            Err(err) if !(policy.retryable)(&err) => {
                tracing::warn!(attempt, error = %err, "upstream call failed with non-retryable error");
                return Err(err);
            }
            Err(err) => {
                tracing::warn!(attempt, max_attempts, error = %err, "upstream attempt failed");
                last_error = Some(err);
                if attempt < max_attempts {
                    tokio::time::sleep(policy.backoff(attempt)).await;
                }
            }
        }
    }

    Err(UpstreamError::Unavailable {
        attempts: max_attempts,
        last_error: last_error.map(|e| e.to_string()).unwrap_or_default(),
    })
}
