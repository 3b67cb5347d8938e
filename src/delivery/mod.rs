//! Delivery orchestration across an ordered list of providers.
//!
//! Every provider attempt passes the rate limiter, then the circuit
//! breaker, before the provider is called. The first provider to accept
//! the message ends the delivery; failures move on to the next provider.
//! Logical failures (the provider answered "not delivered") and transport
//! errors are both recorded in the status tracker, but only transport
//! errors count against the circuit breaker.

use std::fmt;
use std::sync::Arc;

use tokio::time::sleep;
use tracing::Instrument;
use uuid::Uuid;

use crate::config::DeliveryConfig;
use crate::errors::{DeliveryError, DeliveryResult};
use crate::observability::{DeliveryMetrics, Timer};
use crate::provider::{EmailProvider, OutgoingEmail};
use crate::resilience::{CircuitBreaker, GateOutcome, RateLimiter, RetryStrategy};
use crate::tracking::StatusTracker;

/// Outcome of one delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryReport {
    /// Correlation id, also attached to the delivery's tracing span.
    pub delivery_id: Uuid,
    /// Whether a provider accepted the message.
    pub delivered: bool,
    /// Provider that produced the final outcome.
    pub provider: Option<String>,
    /// Provider calls made.
    pub attempts: u32,
}

/// Sends messages through the first provider that accepts them.
pub struct DeliveryOrchestrator {
    config: DeliveryConfig,
    providers: Vec<Arc<dyn EmailProvider>>,
    rate_limiter: RateLimiter,
    circuit_breaker: CircuitBreaker,
    retry: RetryStrategy,
    tracker: StatusTracker,
    metrics: DeliveryMetrics,
}

impl DeliveryOrchestrator {
    /// Creates an orchestrator over `providers`, tried in order.
    pub fn new(
        config: DeliveryConfig,
        providers: Vec<Arc<dyn EmailProvider>>,
    ) -> DeliveryResult<Self> {
        config.validate()?;

        if providers.is_empty() {
            return Err(DeliveryError::configuration(
                "at least one provider is required",
            ));
        }

        Ok(Self {
            rate_limiter: RateLimiter::new(config.rate_limit.clone()),
            circuit_breaker: CircuitBreaker::new(config.circuit_breaker.clone()),
            retry: RetryStrategy::new(config.retry.clone()),
            tracker: StatusTracker::new(),
            metrics: DeliveryMetrics::new(),
            providers,
            config,
        })
    }

    /// Creates a builder.
    pub fn builder() -> DeliveryOrchestratorBuilder {
        DeliveryOrchestratorBuilder::default()
    }

    /// Sends a message, returning true if some provider accepted it.
    pub async fn send_email(&self, recipient: &str, subject: &str, body: &str) -> bool {
        self.deliver(&OutgoingEmail::new(recipient, subject, body))
            .await
            .delivered
    }

    /// Sends a message and reports how the delivery went.
    pub async fn deliver(&self, email: &OutgoingEmail) -> DeliveryReport {
        let delivery_id = Uuid::new_v4();
        let span = tracing::info_span!(
            "deliver",
            %delivery_id,
            recipient = %email.recipient
        );

        self.run(delivery_id, email).instrument(span).await
    }

    async fn run(&self, delivery_id: Uuid, email: &OutgoingEmail) -> DeliveryReport {
        let timer = Timer::start("deliver");
        let provider_count = self.providers.len();
        let attempts_per_provider = self.config.failover.attempts_per_provider();

        let mut index = 0;
        let mut attempts = 0;
        let mut last_provider = None;

        for _ in 0..provider_count {
            let provider = &self.providers[index];

            for retry in 0..attempts_per_provider {
                if retry > 0 {
                    let delay = self.retry.delay_for_attempt(retry - 1);
                    tracing::debug!(
                        provider = provider.name(),
                        retry,
                        delay_ms = delay.as_millis() as u64,
                        "Backing off before retrying provider"
                    );
                    self.metrics.record_backoff_wait();
                    sleep(delay).await;
                }

                attempts += 1;
                if self.attempt(&**provider, email, attempts).await {
                    self.metrics.record_delivery(true);
                    let duration_ms = timer.stop().as_millis() as u64;
                    tracing::info!(
                        provider = provider.name(),
                        attempts,
                        duration_ms,
                        "Email delivered"
                    );
                    return DeliveryReport {
                        delivery_id,
                        delivered: true,
                        provider: Some(provider.name().to_owned()),
                        attempts,
                    };
                }
            }

            last_provider = Some(provider.name().to_owned());
            index = (index + 1) % provider_count;
        }

        self.metrics.record_delivery(false);
        let duration_ms = timer.stop().as_millis() as u64;
        tracing::warn!(attempts, duration_ms, "All providers failed");

        DeliveryReport {
            delivery_id,
            delivered: false,
            provider: last_provider,
            attempts,
        }
    }

    /// One gated provider call. Returns true on delivery.
    async fn attempt(&self, provider: &dyn EmailProvider, email: &OutgoingEmail, attempt: u32) -> bool {
        if let GateOutcome::Waited(_) = self.rate_limiter.acquire().await {
            self.metrics.record_rate_limit_wait();
        }
        if let GateOutcome::Waited(_) = self.circuit_breaker.acquire().await {
            self.metrics.record_circuit_wait();
        }

        self.metrics.record_attempt();
        let name = provider.name();

        match provider
            .send_email(&email.recipient, &email.subject, &email.body)
            .await
        {
            Ok(true) => {
                self.tracker.record_success(&email.recipient, name);
                self.circuit_breaker.record_success();
                true
            }
            Ok(false) => {
                tracing::warn!(provider = name, attempt, "Provider reported non-delivery");
                self.tracker.record_failure(&email.recipient, name, None);
                self.metrics.record_logical_failure();
                false
            }
            Err(error) => {
                let description = error.to_string();
                tracing::warn!(provider = name, attempt, error = %description, "Provider raised an error");
                self.tracker
                    .record_failure(&email.recipient, name, Some(&description));
                self.circuit_breaker.record_failure();
                self.metrics.record_transport_error();
                false
            }
        }
    }

    /// Delivery status per recipient.
    pub fn status_tracker(&self) -> &StatusTracker {
        &self.tracker
    }

    /// The shared rate limiter.
    pub fn rate_limiter(&self) -> &RateLimiter {
        &self.rate_limiter
    }

    /// The shared circuit breaker.
    pub fn circuit_breaker(&self) -> &CircuitBreaker {
        &self.circuit_breaker
    }

    /// The backoff policy.
    pub fn retry_strategy(&self) -> &RetryStrategy {
        &self.retry
    }

    /// Delivery metrics.
    pub fn metrics(&self) -> &DeliveryMetrics {
        &self.metrics
    }

    /// Providers in the order they are tried.
    pub fn providers(&self) -> &[Arc<dyn EmailProvider>] {
        &self.providers
    }

    /// The configuration.
    pub fn config(&self) -> &DeliveryConfig {
        &self.config
    }
}

impl fmt::Debug for DeliveryOrchestrator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.providers.iter().map(|p| p.name()).collect();
        f.debug_struct("DeliveryOrchestrator")
            .field("config", &self.config)
            .field("providers", &names)
            .field("circuit_failures", &self.circuit_breaker.failure_count())
            .finish()
    }
}

/// Builder for [`DeliveryOrchestrator`].
#[derive(Default)]
pub struct DeliveryOrchestratorBuilder {
    config: DeliveryConfig,
    providers: Vec<Arc<dyn EmailProvider>>,
}

impl DeliveryOrchestratorBuilder {
    /// Sets the configuration.
    pub fn config(mut self, config: DeliveryConfig) -> Self {
        self.config = config;
        self
    }

    /// Appends a provider.
    pub fn provider(mut self, provider: impl EmailProvider + 'static) -> Self {
        self.providers.push(Arc::new(provider));
        self
    }

    /// Appends a shared provider.
    pub fn shared_provider(mut self, provider: Arc<dyn EmailProvider>) -> Self {
        self.providers.push(provider);
        self
    }

    /// Builds the orchestrator.
    pub fn build(self) -> DeliveryResult<DeliveryOrchestrator> {
        DeliveryOrchestrator::new(self.config, self.providers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mocks::MockProvider;
    use crate::tracking::DeliveryStatus;

    #[test]
    fn test_requires_a_provider() {
        let result = DeliveryOrchestrator::builder().build();
        assert!(matches!(result, Err(DeliveryError::Configuration { .. })));
    }

    #[test]
    fn test_rejects_invalid_config() {
        let mut config = DeliveryConfig::default();
        config.rate_limit.rate = 0;

        let result = DeliveryOrchestrator::builder()
            .config(config)
            .provider(MockProvider::succeeding("a"))
            .build();
        assert!(result.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_provider_success_stops_loop() {
        let a = Arc::new(MockProvider::succeeding("a"));
        let b = Arc::new(MockProvider::succeeding("b"));
        let orchestrator = DeliveryOrchestrator::builder()
            .shared_provider(a.clone())
            .shared_provider(b.clone())
            .build()
            .unwrap();

        let report = orchestrator
            .deliver(&OutgoingEmail::new("r@x.com", "s", "b"))
            .await;

        assert!(report.delivered);
        assert_eq!(report.provider.as_deref(), Some("a"));
        assert_eq!(report.attempts, 1);
        assert_eq!(a.call_count(), 1);
        assert_eq!(b.call_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhaustion_reports_last_provider() {
        let orchestrator = DeliveryOrchestrator::builder()
            .provider(MockProvider::rejecting("a"))
            .provider(MockProvider::failing("b", "down"))
            .build()
            .unwrap();

        let report = orchestrator
            .deliver(&OutgoingEmail::new("r@x.com", "s", "b"))
            .await;

        assert!(!report.delivered);
        assert_eq!(report.provider.as_deref(), Some("b"));
        assert_eq!(report.attempts, 2);

        let record = orchestrator.status_tracker().record_of("r@x.com").unwrap();
        assert_eq!(record.status, DeliveryStatus::Failure);
        assert_eq!(record.provider, "b");
        assert_eq!(record.error.as_deref(), Some("Connection failed: down"));

        let metrics = orchestrator.metrics().snapshot();
        assert_eq!(metrics.deliveries_exhausted, 1);
        assert_eq!(metrics.logical_failures, 1);
        assert_eq!(metrics.transport_errors, 1);
    }

    #[test]
    fn test_debug_lists_provider_names() {
        let orchestrator = DeliveryOrchestrator::builder()
            .provider(MockProvider::succeeding("primary"))
            .build()
            .unwrap();

        assert!(format!("{:?}", orchestrator).contains("primary"));
    }
}
