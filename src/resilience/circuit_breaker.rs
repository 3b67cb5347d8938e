//! Circuit breaker implementation.

use parking_lot::Mutex;
use std::time::Duration;
use tokio::time::{sleep, Instant};

use super::GateOutcome;
use crate::config::CircuitBreakerConfig;

/// State of the circuit breaker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    /// Failure count is below the threshold, requests pass
    Closed,
    /// Failure count reached the threshold, requests wait out the cooldown
    Open,
}

/// Internal state for the circuit breaker
#[derive(Debug, Default)]
struct CircuitBreakerState {
    failure_count: u32,
    last_failure: Option<Instant>,
}

/// Circuit breaker gating delivery attempts.
///
/// Once `failure_threshold` failures have been recorded without an
/// intervening success, [`acquire`](CircuitBreaker::acquire) makes callers
/// wait until `timeout` has passed since the last failure. Waking up does
/// not close the circuit; the first acquisition after the cooldown does.
#[derive(Debug)]
pub struct CircuitBreaker {
    config: CircuitBreakerConfig,
    state: Mutex<CircuitBreakerState>,
}

impl CircuitBreaker {
    /// Create a new, closed circuit breaker.
    pub fn new(config: CircuitBreakerConfig) -> Self {
        Self {
            config,
            state: Mutex::new(CircuitBreakerState::default()),
        }
    }

    /// Acquire admission, waiting out the cooldown if the circuit is open.
    pub async fn acquire(&self) -> GateOutcome {
        match self.admit(Instant::now()) {
            None => GateOutcome::Immediate,
            Some(wait) => {
                tracing::debug!(wait_ms = wait.as_millis() as u64, "Circuit open, waiting for cooldown");
                sleep(wait).await;
                GateOutcome::Waited(wait)
            }
        }
    }

    /// Record a failed attempt
    pub fn record_failure(&self) {
        let mut state = self.state.lock();
        state.failure_count = state.failure_count.saturating_add(1);
        state.last_failure = Some(Instant::now());

        if state.failure_count == self.config.failure_threshold {
            tracing::warn!(
                failure_count = state.failure_count,
                timeout_ms = self.config.timeout.as_millis() as u64,
                "Circuit breaker opened"
            );
        }
    }

    /// Record a successful attempt, closing the circuit
    pub fn record_success(&self) {
        self.reset();
    }

    /// Clears the failure count and last failure time.
    pub fn reset(&self) {
        let mut state = self.state.lock();
        state.failure_count = 0;
        state.last_failure = None;
    }

    /// Consecutive failures recorded since the last reset.
    pub fn failure_count(&self) -> u32 {
        self.state.lock().failure_count
    }

    /// Time of the last recorded failure.
    pub fn last_failure(&self) -> Option<Instant> {
        self.state.lock().last_failure
    }

    /// Current circuit state, without triggering a reset.
    pub fn state(&self) -> CircuitState {
        if self.state.lock().failure_count >= self.config.failure_threshold {
            CircuitState::Open
        } else {
            CircuitState::Closed
        }
    }

    /// Cooldown measured from the last failure.
    pub fn timeout(&self) -> Duration {
        self.config.timeout
    }

    /// Returns how long to wait, or resets an expired open circuit.
    fn admit(&self, now: Instant) -> Option<Duration> {
        let mut state = self.state.lock();

        if state.failure_count < self.config.failure_threshold {
            return None;
        }

        match state.last_failure {
            Some(last) if now.saturating_duration_since(last) < self.config.timeout => {
                Some(self.config.timeout - now.saturating_duration_since(last))
            }
            _ => {
                state.failure_count = 0;
                state.last_failure = None;
                tracing::info!("Circuit breaker closed after cooldown");
                None
            }
        }
    }
}

impl Default for CircuitBreaker {
    fn default() -> Self {
        Self::new(CircuitBreakerConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn breaker(threshold: u32, timeout_secs: u64) -> CircuitBreaker {
        CircuitBreaker::new(CircuitBreakerConfig::new(
            threshold,
            Duration::from_secs(timeout_secs),
        ))
    }

    #[tokio::test(start_paused = true)]
    async fn test_closed_breaker_admits() {
        let cb = breaker(2, 60);
        cb.record_failure();

        assert_eq!(cb.state(), CircuitState::Closed);
        assert_eq!(cb.acquire().await, GateOutcome::Immediate);
        assert_eq!(cb.failure_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_open_breaker_waits_remaining_cooldown() {
        let cb = breaker(2, 60);
        cb.record_failure();
        cb.record_failure();
        assert_eq!(cb.state(), CircuitState::Open);

        tokio::time::advance(Duration::from_secs(15)).await;
        let outcome = cb.acquire().await;

        assert_eq!(outcome, GateOutcome::Waited(Duration::from_secs(45)));
        // Waking up does not clear the counters.
        assert_eq!(cb.failure_count(), 2);
        assert!(cb.last_failure().is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_resets_after_cooldown() {
        let cb = breaker(1, 30);
        cb.record_failure();

        tokio::time::advance(Duration::from_secs(30)).await;
        assert_eq!(cb.acquire().await, GateOutcome::Immediate);
        assert_eq!(cb.failure_count(), 0);
        assert!(cb.last_failure().is_none());
        assert_eq!(cb.state(), CircuitState::Closed);
    }

    #[test]
    fn test_success_resets_unconditionally() {
        let cb = breaker(3, 60);
        for _ in 0..5 {
            cb.record_failure();
        }
        assert_eq!(cb.state(), CircuitState::Open);

        cb.record_success();
        assert_eq!(cb.failure_count(), 0);
        assert!(cb.last_failure().is_none());
        assert_eq!(cb.state(), CircuitState::Closed);
    }
}
