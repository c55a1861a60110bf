use std::time::Duration;

use crate::error::GustError;

/// Bounded exponential backoff: at most `max_attempts` total attempts,
/// sleeping `min(cap, base * 2^k)` between attempt k and k+1.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base: Duration,
    pub cap: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        // 3 attempts, waits of 4s then 8s (further waits would cap at 10s)
        Self {
            max_attempts: 3,
            base: Duration::from_secs(4),
            cap: Duration::from_secs(10),
        }
    }
}

impl RetryPolicy {
    /// Backoff before attempt `attempt + 1` (0-based attempt just failed).
    pub fn backoff(&self, attempt: u32) -> Duration {
        let doubled = self
            .base
            .checked_mul(1u32 << attempt.min(16))
            .unwrap_or(self.cap);
        doubled.min(self.cap)
    }
}

/// Run `op` under `policy`. Retries are strictly sequential; a
/// non-retryable error returns immediately without further attempts.
/// When every attempt fails, the final error propagates to the caller.
pub async fn with_retry<T, F, Fut>(policy: RetryPolicy, mut op: F) -> Result<T, GustError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, GustError>>,
{
    let mut attempt = 0u32;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if !e.is_retryable() => return Err(e),
            Err(e) => {
                attempt += 1;
                if attempt >= policy.max_attempts {
                    return Err(e);
                }
                let wait = policy.backoff(attempt - 1);
                tracing::debug!(attempt, wait_ms = wait.as_millis() as u64, error = %e, "retrying after backoff");
                tokio::time::sleep(wait).await;
            }
        }
    }
}
