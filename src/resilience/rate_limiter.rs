//! Rate limiter implementation.

use parking_lot::Mutex;
use std::time::Duration;
use tokio::time::{sleep, Instant};

use super::GateOutcome;
use crate::config::RateLimitConfig;

/// Token bucket state
#[derive(Debug)]
struct TokenBucket {
    tokens: u32,
    last_refill: Instant,
}

/// Token bucket rate limiter.
///
/// Every call to [`acquire`](RateLimiter::acquire) refills whole windows
/// worth of tokens, then either takes a token or sleeps until the next
/// window boundary. The sleeping branch does not take a token.
#[derive(Debug)]
pub struct RateLimiter {
    config: RateLimitConfig,
    bucket: Mutex<TokenBucket>,
}

impl RateLimiter {
    /// Create a new rate limiter with a full bucket.
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            bucket: Mutex::new(TokenBucket {
                tokens: config.rate,
                last_refill: Instant::now(),
            }),
            config,
        }
    }

    /// Acquire admission, waiting if the bucket is empty.
    pub async fn acquire(&self) -> GateOutcome {
        match self.admit(Instant::now()) {
            None => GateOutcome::Immediate,
            Some(wait) => {
                tracing::debug!(wait_ms = wait.as_millis() as u64, "Rate limit reached, waiting");
                sleep(wait).await;
                GateOutcome::Waited(wait)
            }
        }
    }

    /// Tokens currently in the bucket, without refilling.
    pub fn available_tokens(&self) -> u32 {
        self.bucket.lock().tokens
    }

    /// Bucket capacity.
    pub fn capacity(&self) -> u32 {
        self.config.rate
    }

    /// Refill window.
    pub fn window(&self) -> Duration {
        self.config.window
    }

    /// Refills, then takes a token or returns how long to wait.
    fn admit(&self, now: Instant) -> Option<Duration> {
        let mut bucket = self.bucket.lock();

        let elapsed = now.saturating_duration_since(bucket.last_refill);
        // A zero window refills on every call.
        let windows = elapsed
            .as_nanos()
            .checked_div(self.config.window.as_nanos())
            .unwrap_or(u128::MAX);
        let granted = windows.saturating_mul(u128::from(self.config.rate));
        let refilled = (u128::from(bucket.tokens) + granted).min(u128::from(self.config.rate));
        // Bounded by `rate`, which is a u32.
        bucket.tokens = refilled as u32;
        bucket.last_refill = now;

        if bucket.tokens > 0 {
            bucket.tokens -= 1;
            None
        } else {
            Some(self.config.window.saturating_sub(elapsed))
        }
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(RateLimitConfig::default())
    }
}
