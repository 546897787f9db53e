//! Per-upstream token-bucket admission.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use tokenwatch_types::{AggError, RateLimiterConfig};

struct Bucket {
    points: f64,
    duration: Duration,
    tokens: f64,
    last_refill: Instant,
}

impl Bucket {
    fn new(config: RateLimiterConfig) -> Self {
        Self {
            points: f64::from(config.points),
            duration: config.duration,
            tokens: f64::from(config.points),
            last_refill: Instant::now(),
        }
    }

    /// Refill linearly based on elapsed time, then try to take one token.
    ///
    /// Returns `Ok(())` on success, or `Err(retry_after)` with the wait until
    /// the next permit becomes available.
    fn try_acquire(&mut self) -> Result<(), Duration> {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_refill).as_secs_f64();
        self.last_refill = now;
        let refill_rate = self.points / self.duration.as_secs_f64();
        self.tokens = (self.tokens + elapsed * refill_rate).min(self.points);

        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            Ok(())
        } else {
            let deficit = 1.0 - self.tokens;
            let wait_secs = deficit / refill_rate;
            Err(Duration::from_secs_f64(wait_secs.max(0.0)))
        }
    }
}

/// Token-bucket rate limiter keyed by upstream tag.
///
/// `acquire` never blocks: it either grants a permit immediately or returns
/// [`AggError::RateLimited`] with the wait until the next one refills. Callers
/// (typically the Retry wrapper) decide whether to wait.
pub struct RateLimiter {
    buckets: Mutex<HashMap<String, Bucket>>,
}

impl RateLimiter {
    /// Configure one bucket per upstream tag. Tags not present here make
    /// `acquire` return [`AggError::ConfigError`].
    #[must_use]
    pub fn new(configs: HashMap<String, RateLimiterConfig>) -> Self {
        let buckets = configs
            .into_iter()
            .map(|(tag, cfg)| (tag, Bucket::new(cfg)))
            .collect();
        Self {
            buckets: Mutex::new(buckets),
        }
    }

    /// Attempt to consume one permit for `tag`.
    pub fn acquire(&self, tag: &str) -> Result<(), AggError> {
        let mut buckets = self.buckets.lock().expect("rate limiter mutex poisoned");
        let bucket = buckets
            .get_mut(tag)
            .ok_or_else(|| AggError::ConfigError(format!("unknown rate-limiter tag: {tag}")))?;
        bucket
            .try_acquire()
            .map_err(|retry_after| AggError::rate_limited(tag, retry_after))
    }
}
