//! # Email Failover Integration Library
//!
//! Delivers a message to one recipient through the first of several
//! interchangeable providers that accepts it, with:
//! - Token bucket rate limiting shared by all deliveries
//! - A circuit breaker that pauses attempts after repeated provider errors
//! - Ordered failover, optionally retrying each provider with backoff
//! - Latest-status and history tracking per recipient
//! - Metrics and `tracing` instrumentation
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use integrations_email_failover::{DeliveryConfig, DeliveryOrchestrator};
//! use integrations_email_failover::mocks::{MockProvider, RandomProvider};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let orchestrator = DeliveryOrchestrator::builder()
//!         .config(DeliveryConfig::default())
//!         .provider(RandomProvider::new("primary", 0.8))
//!         .provider(MockProvider::succeeding("backup"))
//!         .build()?;
//!
//!     let delivered = orchestrator
//!         .send_email("recipient@example.com", "Subject", "Body")
//!         .await;
//!     println!("delivered: {delivered}");
//!
//!     for record in orchestrator.status_tracker().all_records() {
//!         println!("{} via {}: {:?}", record.recipient, record.provider, record.status);
//!     }
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

// Core modules
pub mod config;
pub mod errors;
pub mod provider;

// Resilience
pub mod resilience;

// Status tracking
pub mod tracking;

// Observability
pub mod observability;

// Orchestration
pub mod delivery;

// Mocks for testing
pub mod mocks;

// Re-exports for convenience
pub use config::{
    CircuitBreakerConfig, DeliveryConfig, DeliveryConfigBuilder, FailoverPolicy,
    RateLimitConfig, RetryConfig,
};
pub use delivery::{DeliveryOrchestrator, DeliveryOrchestratorBuilder, DeliveryReport};
pub use errors::{
    DeliveryError, DeliveryResult, ProviderError, ProviderErrorKind, ProviderResult,
};
pub use observability::{DeliveryMetrics, MetricsSnapshot};
pub use provider::{EmailProvider, OutgoingEmail};
pub use resilience::{CircuitBreaker, CircuitState, GateOutcome, RateLimiter, RetryStrategy};
pub use tracking::{DeliveryRecord, DeliveryStatus, StatusTracker};
