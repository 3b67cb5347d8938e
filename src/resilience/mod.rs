//! Resilience gates for email delivery.
//!
//! This module provides:
//! - Token bucket rate limiting
//! - Circuit breaker with cooldown
//! - Exponential backoff policy
//!
//! Both gates share the same two-outcome shape: the caller either proceeds
//! straight away or is suspended until the gate lets it through.

mod circuit_breaker;
mod rate_limiter;
mod retry;

use std::time::Duration;

pub use circuit_breaker::{CircuitBreaker, CircuitState};
pub use rate_limiter::RateLimiter;
pub use retry::RetryStrategy;

/// Result of passing through an admission gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateOutcome {
    /// The gate admitted the caller without waiting.
    Immediate,
    /// The caller was suspended for the given duration first.
    Waited(Duration),
}

impl GateOutcome {
    /// Returns true if the caller did not wait.
    pub fn is_immediate(&self) -> bool {
        matches!(self, GateOutcome::Immediate)
    }

    /// Returns the time spent waiting, if any.
    pub fn waited(&self) -> Option<Duration> {
        match self {
            GateOutcome::Immediate => None,
            GateOutcome::Waited(d) => Some(*d),
        }
    }
}
