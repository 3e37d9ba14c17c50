//! Retry with exponential backoff for overloaded upstreams.
//!
//! Only [`Error::Overloaded`] is retried. Every other error reflects a
//! request that would fail the same way again, so it propagates on the
//! first attempt.

use std::future::Future;
use std::time::Duration;

use studyscout_core::Result;
use tracing::warn;

pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_millis(1_000);

/// Runs `op` with the default retry budget.
pub async fn retry<T, F, Fut>(op: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    retry_with_backoff(op, DEFAULT_MAX_ATTEMPTS, DEFAULT_BASE_DELAY).await
}

/// Runs `op` up to `max_attempts` times, sleeping `base_delay * 2^attempt`
/// between overloaded attempts. The last error is returned once the budget
/// is exhausted.
pub async fn retry_with_backoff<T, F, Fut>(
    mut op: F,
    max_attempts: u32,
    base_delay: Duration,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut attempt: u32 = 0;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_overloaded() && attempt + 1 < max_attempts => {
                let delay = base_delay * 2u32.pow(attempt);
                warn!(
                    attempt = attempt + 1,
                    max_attempts,
                    delay_ms = delay.as_millis() as u64,
                    "upstream overloaded, backing off"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}
