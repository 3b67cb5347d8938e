//! Exponential backoff policy.

use std::time::Duration;

use crate::config::RetryConfig;

/// Computes backoff delays: `2^attempt * base_delay`.
///
/// Attempt 0 waits one base delay. Delays saturate at `Duration::MAX`
/// instead of overflowing and are clamped to `max_delay` when one is set.
#[derive(Debug, Clone, Default)]
pub struct RetryStrategy {
    config: RetryConfig,
}

impl RetryStrategy {
    /// Creates a retry strategy.
    pub fn new(config: RetryConfig) -> Self {
        Self { config }
    }

    /// Returns the backoff delay before retry number `attempt`.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let delay = 2u32
            .checked_pow(attempt)
            .and_then(|factor| self.config.base_delay.checked_mul(factor))
            .unwrap_or(Duration::MAX);

        match self.config.max_delay {
            Some(max) => delay.min(max),
            None => delay,
        }
    }

    /// Returns the configuration.
    pub fn config(&self) -> &RetryConfig {
        &self.config
    }
}
