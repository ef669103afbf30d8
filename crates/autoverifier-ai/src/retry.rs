use anyhow::{anyhow, Result};
use std::future::Future;
use std::time::Duration;

/// Longest single wait between attempts
pub const MAX_BACKOFF: Duration = Duration::from_secs(60);

/// Wait before retry number `attempt` (1-based): 1s, 2s, 4s, ... capped at
/// [`MAX_BACKOFF`]
pub fn backoff_delay(attempt: u32) -> Duration {
    let secs = 2u64.saturating_pow(attempt.saturating_sub(1));
    Duration::from_secs(secs).min(MAX_BACKOFF)
}

/// Run `op` once plus up to `max_retries` more times, sleeping with
/// exponential backoff between attempts. Returns the last error when every
/// attempt fails.
pub async fn retry_with_backoff<T, F, Fut>(
    provider_name: &str,
    max_retries: u32,
    mut op: F,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut last_error = None;

    for attempt in 0..=max_retries {
        if attempt > 0 {
            tokio::time::sleep(backoff_delay(attempt)).await;
        }

        match op().await {
            Ok(value) => return Ok(value),
            Err(e) => {
                if attempt < max_retries {
                    tracing::warn!(
                        error = %e,
                        "{} request failed (attempt {}/{}), retrying...",
                        provider_name,
                        attempt + 1,
                        max_retries.saturating_add(1)
                    );
                }
                last_error = Some(e);
            }
        }
    }

    Err(last_error.unwrap_or_else(|| anyhow!("All retry attempts failed")))
}
