//! Configuration types for the delivery orchestrator.
//!
//! Provides configuration with a builder pattern for:
//! - Rate limiting (token bucket capacity and refill window)
//! - Circuit breaker threshold and cooldown
//! - Retry backoff
//! - Failover policy
//!
//! Durations are written in humantime form (`"60s"`, `"1m 30s"`) when the
//! configuration is loaded from JSON.

use std::path::Path;
use std::time::Duration;
use serde::{Deserialize, Serialize};

use crate::errors::{DeliveryError, DeliveryResult};

/// Default number of tokens granted per window.
pub const DEFAULT_RATE: u32 = 10;

/// Default rate limit window.
pub const DEFAULT_WINDOW: Duration = Duration::from_secs(60);

/// Default number of consecutive transport errors that opens the circuit.
pub const DEFAULT_FAILURE_THRESHOLD: u32 = 5;

/// Default circuit breaker cooldown.
pub const DEFAULT_CIRCUIT_TIMEOUT: Duration = Duration::from_secs(60);

/// Default base delay for exponential backoff.
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_millis(1000);

/// Token bucket configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Tokens granted per window, also the bucket capacity.
    #[serde(default = "default_rate")]
    pub rate: u32,
    /// Refill window.
    #[serde(default = "default_window", with = "humantime_serde")]
    pub window: Duration,
}

fn default_rate() -> u32 { DEFAULT_RATE }
fn default_window() -> Duration { DEFAULT_WINDOW }

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            rate: default_rate(),
            window: default_window(),
        }
    }
}

impl RateLimitConfig {
    /// Creates a rate limit configuration.
    pub fn new(rate: u32, window: Duration) -> Self {
        Self { rate, window }
    }

    fn validate(&self) -> DeliveryResult<()> {
        if self.rate == 0 {
            return Err(DeliveryError::configuration("rate must be positive"));
        }
        if self.window.is_zero() {
            return Err(DeliveryError::configuration("rate limit window must be non-zero"));
        }
        Ok(())
    }
}

/// Circuit breaker configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CircuitBreakerConfig {
    /// Failure count at which the circuit opens.
    #[serde(default = "default_failure_threshold")]
    pub failure_threshold: u32,
    /// Cooldown measured from the last recorded failure.
    #[serde(default = "default_circuit_timeout", with = "humantime_serde")]
    pub timeout: Duration,
}

fn default_failure_threshold() -> u32 { DEFAULT_FAILURE_THRESHOLD }
fn default_circuit_timeout() -> Duration { DEFAULT_CIRCUIT_TIMEOUT }

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: default_failure_threshold(),
            timeout: default_circuit_timeout(),
        }
    }
}

impl CircuitBreakerConfig {
    /// Creates a circuit breaker configuration.
    pub fn new(failure_threshold: u32, timeout: Duration) -> Self {
        Self {
            failure_threshold,
            timeout,
        }
    }

    fn validate(&self) -> DeliveryResult<()> {
        if self.failure_threshold == 0 {
            return Err(DeliveryError::configuration(
                "failure_threshold must be positive",
            ));
        }
        Ok(())
    }
}

/// Backoff configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Delay for attempt 0; doubles with each attempt.
    #[serde(default = "default_base_delay", with = "humantime_serde")]
    pub base_delay: Duration,
    /// Upper bound on any single delay.
    #[serde(default, with = "humantime_serde::option")]
    pub max_delay: Option<Duration>,
}

fn default_base_delay() -> Duration { DEFAULT_BASE_DELAY }

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            base_delay: default_base_delay(),
            max_delay: None,
        }
    }
}

/// What the orchestrator does after a provider attempt fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "mode")]
pub enum FailoverPolicy {
    /// Move to the next provider straight away.
    #[default]
    Immediate,
    /// Retry the same provider after the backoff delay, then move on.
    BackoffThenRetry {
        /// Attempts made against each provider, including the first.
        attempts_per_provider: u32,
    },
}

impl FailoverPolicy {
    /// Number of attempts made against each provider.
    pub fn attempts_per_provider(&self) -> u32 {
        match self {
            FailoverPolicy::Immediate => 1,
            FailoverPolicy::BackoffThenRetry {
                attempts_per_provider,
            } => *attempts_per_provider,
        }
    }
}

/// Delivery orchestrator configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryConfig {
    /// Rate limit configuration.
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
    /// Circuit breaker configuration.
    #[serde(default)]
    pub circuit_breaker: CircuitBreakerConfig,
    /// Retry configuration.
    #[serde(default)]
    pub retry: RetryConfig,
    /// Failover policy.
    #[serde(default)]
    pub failover: FailoverPolicy,
}

impl DeliveryConfig {
    /// Creates a new configuration builder.
    pub fn builder() -> DeliveryConfigBuilder {
        DeliveryConfigBuilder::default()
    }

    /// Validates the configuration.
    pub fn validate(&self) -> DeliveryResult<()> {
        self.rate_limit.validate()?;
        self.circuit_breaker.validate()?;

        if self.failover.attempts_per_provider() == 0 {
            return Err(DeliveryError::configuration(
                "attempts_per_provider must be positive",
            ));
        }

        Ok(())
    }

    /// Parses and validates a configuration from a JSON document.
    pub fn from_json_str(json: &str) -> DeliveryResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a JSON configuration file.
    pub fn from_file(path: impl AsRef<Path>) -> DeliveryResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    /// Serializes the configuration to pretty JSON.
    pub fn to_json_string(&self) -> DeliveryResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Builder for [`DeliveryConfig`].
#[derive(Debug, Default)]
pub struct DeliveryConfigBuilder {
    config: DeliveryConfig,
}

impl DeliveryConfigBuilder {
    /// Sets the token bucket rate and window.
    pub fn rate_limit(mut self, rate: u32, window: Duration) -> Self {
        self.config.rate_limit = RateLimitConfig::new(rate, window);
        self
    }

    /// Sets the circuit breaker threshold and cooldown.
    pub fn circuit_breaker(mut self, failure_threshold: u32, timeout: Duration) -> Self {
        self.config.circuit_breaker = CircuitBreakerConfig::new(failure_threshold, timeout);
        self
    }

    /// Sets retry configuration.
    pub fn retry(mut self, config: RetryConfig) -> Self {
        self.config.retry = config;
        self
    }

    /// Sets the failover policy.
    pub fn failover(mut self, policy: FailoverPolicy) -> Self {
        self.config.failover = policy;
        self
    }

    /// Retries each provider with backoff before failing over.
    pub fn backoff_then_retry(self, attempts_per_provider: u32) -> Self {
        self.failover(FailoverPolicy::BackoffThenRetry {
            attempts_per_provider,
        })
    }

    /// Builds the configuration.
    pub fn build(self) -> DeliveryResult<DeliveryConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

// Humantime serde support
mod humantime_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let s = humantime::format_duration(*duration).to_string();
        serializer.serialize_str(&s)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        humantime::parse_duration(&s).map_err(serde::de::Error::custom)
    }

    pub mod option {
        use serde::{Deserialize, Deserializer, Serializer};
        use std::time::Duration;

        pub fn serialize<S>(duration: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
        where
            S: Serializer,
        {
            match duration {
                Some(d) => super::serialize(d, serializer),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
        where
            D: Deserializer<'de>,
        {
            Option::<String>::deserialize(deserializer)?
                .map(|s| humantime::parse_duration(&s).map_err(serde::de::Error::custom))
                .transpose()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = DeliveryConfig::default();

        assert_eq!(config.rate_limit.rate, 10);
        assert_eq!(config.rate_limit.window, Duration::from_secs(60));
        assert_eq!(config.circuit_breaker.failure_threshold, 5);
        assert_eq!(config.circuit_breaker.timeout, Duration::from_secs(60));
        assert_eq!(config.retry.base_delay, Duration::from_secs(1));
        assert_eq!(config.failover, FailoverPolicy::Immediate);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_builder() {
        let config = DeliveryConfig::builder()
            .rate_limit(100, Duration::from_secs(1))
            .circuit_breaker(3, Duration::from_secs(10))
            .backoff_then_retry(2)
            .build()
            .unwrap();

        assert_eq!(config.rate_limit.rate, 100);
        assert_eq!(config.circuit_breaker.failure_threshold, 3);
        assert_eq!(config.failover.attempts_per_provider(), 2);
    }

    #[test]
    fn test_config_validation() {
        assert!(DeliveryConfig::builder()
            .rate_limit(0, Duration::from_secs(1))
            .build()
            .is_err());

        assert!(DeliveryConfig::builder()
            .rate_limit(1, Duration::ZERO)
            .build()
            .is_err());

        assert!(DeliveryConfig::builder()
            .circuit_breaker(0, Duration::from_secs(1))
            .build()
            .is_err());

        assert!(DeliveryConfig::builder()
            .backoff_then_retry(0)
            .build()
            .is_err());
    }

    #[test]
    fn test_config_from_json_with_humantime() {
        let json = r#"{
            "rate_limit": { "rate": 20, "window": "30s" },
            "circuit_breaker": { "timeout": "2m" },
            "retry": { "base_delay": "250ms", "max_delay": "10s" },
            "failover": { "mode": "backoff_then_retry", "attempts_per_provider": 3 }
        }"#;

        let config = DeliveryConfig::from_json_str(json).unwrap();
        assert_eq!(config.rate_limit.rate, 20);
        assert_eq!(config.rate_limit.window, Duration::from_secs(30));
        assert_eq!(config.circuit_breaker.failure_threshold, 5);
        assert_eq!(config.circuit_breaker.timeout, Duration::from_secs(120));
        assert_eq!(config.retry.base_delay, Duration::from_millis(250));
        assert_eq!(config.retry.max_delay, Some(Duration::from_secs(10)));
        assert_eq!(
            config.failover,
            FailoverPolicy::BackoffThenRetry {
                attempts_per_provider: 3
            }
        );
    }

    #[test]
    fn test_config_json_rejects_invalid_values() {
        let err = DeliveryConfig::from_json_str(r#"{ "rate_limit": { "rate": 0 } }"#)
            .unwrap_err();
        assert!(matches!(err, DeliveryError::Configuration { .. }));

        let err = DeliveryConfig::from_json_str(r#"{ "rate_limit": { "window": "soon" } }"#)
            .unwrap_err();
        assert!(matches!(err, DeliveryError::Parse(_)));
    }

    #[test]
    fn test_config_serializes_back() {
        let config = DeliveryConfig::default();
        let json = config.to_json_string().unwrap();
        assert!(json.contains("\"1m\""));
        assert_eq!(DeliveryConfig::from_json_str(&json).unwrap(), config);
    }
}
