//! Observability infrastructure for delivery.
//!
//! Provides delivery metrics, a duration timer, and logging setup.

mod logging;

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::time::Instant;

pub use logging::{init_logging, LogFormat, LogLevel, LoggingConfig};

/// Delivery metrics collector.
#[derive(Debug, Default)]
pub struct DeliveryMetrics {
    /// Deliveries that ended in success.
    pub deliveries_succeeded: AtomicU64,
    /// Deliveries that ran out of providers.
    pub deliveries_exhausted: AtomicU64,
    /// Individual provider calls.
    pub provider_attempts: AtomicU64,
    /// Provider calls that reported non-delivery.
    pub logical_failures: AtomicU64,
    /// Provider calls that raised an error.
    pub transport_errors: AtomicU64,
    /// Times the rate limiter made a caller wait.
    pub rate_limit_waits: AtomicU64,
    /// Times the circuit breaker made a caller wait.
    pub circuit_waits: AtomicU64,
    /// Backoff sleeps before retrying a provider.
    pub backoff_waits: AtomicU64,
}

impl DeliveryMetrics {
    /// Creates a new metrics collector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the end of a delivery.
    pub fn record_delivery(&self, delivered: bool) {
        if delivered {
            self.deliveries_succeeded.fetch_add(1, Ordering::Relaxed);
        } else {
            self.deliveries_exhausted.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Records a provider call.
    pub fn record_attempt(&self) {
        self.provider_attempts.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a provider reporting non-delivery.
    pub fn record_logical_failure(&self) {
        self.logical_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a provider raising an error.
    pub fn record_transport_error(&self) {
        self.transport_errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a rate limiter wait.
    pub fn record_rate_limit_wait(&self) {
        self.rate_limit_waits.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a circuit breaker wait.
    pub fn record_circuit_wait(&self) {
        self.circuit_waits.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a backoff sleep.
    pub fn record_backoff_wait(&self) {
        self.backoff_waits.fetch_add(1, Ordering::Relaxed);
    }

    /// Returns a snapshot of all metrics.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            deliveries_succeeded: self.deliveries_succeeded.load(Ordering::Relaxed),
            deliveries_exhausted: self.deliveries_exhausted.load(Ordering::Relaxed),
            provider_attempts: self.provider_attempts.load(Ordering::Relaxed),
            logical_failures: self.logical_failures.load(Ordering::Relaxed),
            transport_errors: self.transport_errors.load(Ordering::Relaxed),
            rate_limit_waits: self.rate_limit_waits.load(Ordering::Relaxed),
            circuit_waits: self.circuit_waits.load(Ordering::Relaxed),
            backoff_waits: self.backoff_waits.load(Ordering::Relaxed),
        }
    }

    /// Resets all metrics.
    pub fn reset(&self) {
        self.deliveries_succeeded.store(0, Ordering::Relaxed);
        self.deliveries_exhausted.store(0, Ordering::Relaxed);
        self.provider_attempts.store(0, Ordering::Relaxed);
        self.logical_failures.store(0, Ordering::Relaxed);
        self.transport_errors.store(0, Ordering::Relaxed);
        self.rate_limit_waits.store(0, Ordering::Relaxed);
        self.circuit_waits.store(0, Ordering::Relaxed);
        self.backoff_waits.store(0, Ordering::Relaxed);
    }
}

/// Snapshot of metrics at a point in time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    /// Deliveries that ended in success.
    pub deliveries_succeeded: u64,
    /// Deliveries that ran out of providers.
    pub deliveries_exhausted: u64,
    /// Individual provider calls.
    pub provider_attempts: u64,
    /// Provider calls that reported non-delivery.
    pub logical_failures: u64,
    /// Provider calls that raised an error.
    pub transport_errors: u64,
    /// Times the rate limiter made a caller wait.
    pub rate_limit_waits: u64,
    /// Times the circuit breaker made a caller wait.
    pub circuit_waits: u64,
    /// Backoff sleeps before retrying a provider.
    pub backoff_waits: u64,
}

impl MetricsSnapshot {
    /// Returns the delivery success rate.
    pub fn success_rate(&self) -> f64 {
        let total = self.deliveries_succeeded + self.deliveries_exhausted;
        if total == 0 {
            1.0
        } else {
            self.deliveries_succeeded as f64 / total as f64
        }
    }
}

/// Timer for measuring operation duration.
#[derive(Debug)]
pub struct Timer {
    start: Instant,
    name: &'static str,
}

impl Timer {
    /// Creates and starts a new timer.
    pub fn start(name: &'static str) -> Self {
        Self {
            start: Instant::now(),
            name,
        }
    }

    /// Returns the elapsed time.
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Stops the timer and returns the duration.
    pub fn stop(self) -> Duration {
        let elapsed = self.start.elapsed();
        tracing::debug!(
            timer = self.name,
            duration_ms = elapsed.as_millis() as u64,
            "Timer stopped"
        );
        elapsed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics() {
        let metrics = DeliveryMetrics::new();

        metrics.record_delivery(true);
        metrics.record_delivery(true);
        metrics.record_delivery(false);
        metrics.record_attempt();
        metrics.record_transport_error();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.deliveries_succeeded, 2);
        assert_eq!(snapshot.deliveries_exhausted, 1);
        assert_eq!(snapshot.provider_attempts, 1);
        assert_eq!(snapshot.transport_errors, 1);
        assert!((snapshot.success_rate() - 0.666).abs() < 0.01);

        metrics.reset();
        assert_eq!(metrics.snapshot(), MetricsSnapshot::default());
    }

    #[tokio::test(start_paused = true)]
    async fn test_timer() {
        let timer = Timer::start("test");
        tokio::time::sleep(Duration::from_millis(10)).await;
        let duration = timer.stop();
        assert!(duration >= Duration::from_millis(10));
    }
}
