//! Mock providers for testing.
//!
//! [`MockProvider`] plays back a script of outcomes and records every call;
//! [`RandomProvider`] succeeds with a fixed probability, for demos and soak
//! runs.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::time::Duration;

use crate::errors::{ProviderError, ProviderErrorKind, ProviderResult};
use crate::provider::{EmailProvider, OutgoingEmail};

/// What a mock provider does on one call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockOutcome {
    /// Accept the message.
    Deliver,
    /// Report non-delivery without raising.
    Reject,
    /// Raise a transport error.
    Fail(ProviderErrorKind, String),
}

impl MockOutcome {
    /// A connection error with the given message.
    pub fn connection_error(message: impl Into<String>) -> Self {
        MockOutcome::Fail(ProviderErrorKind::Connection, message.into())
    }

    fn into_result(self) -> ProviderResult<bool> {
        match self {
            MockOutcome::Deliver => Ok(true),
            MockOutcome::Reject => Ok(false),
            MockOutcome::Fail(kind, message) => Err(ProviderError::new(kind, message)),
        }
    }
}

/// Scripted mock provider.
#[derive(Debug)]
pub struct MockProvider {
    name: String,
    script: Mutex<VecDeque<MockOutcome>>,
    default_outcome: MockOutcome,
    latency: Option<Duration>,
    calls: Mutex<Vec<OutgoingEmail>>,
}

impl MockProvider {
    /// Creates a provider that always answers with `outcome`.
    pub fn new(name: impl Into<String>, outcome: MockOutcome) -> Self {
        Self {
            name: name.into(),
            script: Mutex::new(VecDeque::new()),
            default_outcome: outcome,
            latency: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// A provider that always delivers.
    pub fn succeeding(name: impl Into<String>) -> Self {
        Self::new(name, MockOutcome::Deliver)
    }

    /// A provider that always reports non-delivery.
    pub fn rejecting(name: impl Into<String>) -> Self {
        Self::new(name, MockOutcome::Reject)
    }

    /// A provider that always raises a connection error.
    pub fn failing(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(name, MockOutcome::connection_error(message))
    }

    /// Queues outcomes played before the default one.
    pub fn with_script(self, outcomes: impl IntoIterator<Item = MockOutcome>) -> Self {
        self.script.lock().extend(outcomes);
        self
    }

    /// Sleeps this long inside every call.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Queues one more outcome.
    pub fn push_outcome(&self, outcome: MockOutcome) {
        self.script.lock().push_back(outcome);
    }

    /// Number of calls received.
    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    /// Messages received, in call order.
    pub fn recorded_calls(&self) -> Vec<OutgoingEmail> {
        self.calls.lock().clone()
    }

    fn next_outcome(&self) -> MockOutcome {
        self.script
            .lock()
            .pop_front()
            .unwrap_or_else(|| self.default_outcome.clone())
    }
}

#[async_trait]
impl EmailProvider for MockProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn send_email(&self, recipient: &str, subject: &str, body: &str) -> ProviderResult<bool> {
        self.calls
            .lock()
            .push(OutgoingEmail::new(recipient, subject, body));

        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }

        self.next_outcome().into_result()
    }
}

/// Provider that delivers with a fixed probability.
#[derive(Debug, Clone)]
pub struct RandomProvider {
    name: String,
    success_probability: f64,
}

impl RandomProvider {
    /// Creates a provider that delivers with `success_probability`,
    /// clamped to `[0, 1]`.
    pub fn new(name: impl Into<String>, success_probability: f64) -> Self {
        Self {
            name: name.into(),
            success_probability: success_probability.clamp(0.0, 1.0),
        }
    }

    /// The configured success probability.
    pub fn success_probability(&self) -> f64 {
        self.success_probability
    }
}

#[async_trait]
impl EmailProvider for RandomProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn send_email(&self, _recipient: &str, _subject: &str, _body: &str) -> ProviderResult<bool> {
        Ok(rand::random::<f64>() < self.success_probability)
    }
}

/// Creates a test message.
pub fn test_email() -> OutgoingEmail {
    OutgoingEmail::new("recipient@example.com", "Test Subject", "Test body")
}
