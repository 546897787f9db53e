//! Exponential backoff with full jitter around any fallible async call.

use std::future::Future;
use std::time::Duration;

use rand::Rng;
use tokenwatch_types::{AggError, RetryConfig};

/// Delay before attempt `k` (1-indexed, `k >= 2`): `base_delay * 2^(k-2) + U[0, 1s)`.
fn backoff_delay(base_delay: Duration, attempt: u32) -> Duration {
    debug_assert!(attempt >= 2);
    let exponent = attempt - 2;
    let scaled = base_delay.saturating_mul(1u32.checked_shl(exponent).unwrap_or(u32::MAX));
    let jitter = Duration::from_secs_f64(rand::rng().random_range(0.0..1.0));
    scaled.saturating_add(jitter)
}

/// Run `f` up to `config.max_attempts` times, waiting `backoff_delay` between
/// attempts. Returns the last error verbatim once attempts are exhausted.
///
/// Short-circuits immediately (no further attempts) when the error is not
/// retryable per [`AggError::is_retryable`].
pub async fn retry<T, F, Fut>(config: RetryConfig, mut f: F) -> Result<T, AggError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, AggError>>,
{
    let mut attempt = 1;
    loop {
        match f().await {
            Ok(value) => return Ok(value),
            Err(err) if attempt >= config.max_attempts || !err.is_retryable() => return Err(err),
            Err(_err) => {
                attempt += 1;
                tokio::time::sleep(backoff_delay(config.base_delay, attempt)).await;
            }
        }
    }
}
