//! Error types for email delivery.
//!
//! Two families live here: [`ProviderError`], raised by a provider while
//! attempting a delivery, and [`DeliveryError`], raised while building or
//! configuring an orchestrator. Delivery outcomes themselves are never
//! errors; they are reported through the boolean result and the status
//! tracker.

use std::fmt;
use thiserror::Error;

/// Result type for orchestrator construction and configuration.
pub type DeliveryResult<T> = Result<T, DeliveryError>;

/// Result type returned by providers.
pub type ProviderResult<T> = Result<T, ProviderError>;

/// Errors raised while configuring the delivery layer.
#[derive(Error, Debug)]
pub enum DeliveryError {
    /// Configuration is invalid or incomplete.
    #[error("Configuration error: {message}")]
    Configuration {
        /// Description of the problem.
        message: String,
    },

    /// A configuration file could not be read.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A configuration document could not be parsed.
    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

impl DeliveryError {
    /// Creates a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }
}

/// Categories of transport failure a provider can report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderErrorKind {
    /// Could not reach the provider.
    Connection,
    /// The provider did not answer in time.
    Timeout,
    /// The provider rejected our credentials.
    Authentication,
    /// The provider throttled the request.
    RateLimited,
    /// The provider API returned an error response.
    Api,
    /// Anything else.
    Unknown,
}

impl fmt::Display for ProviderErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderErrorKind::Connection => write!(f, "Connection failed"),
            ProviderErrorKind::Timeout => write!(f, "Timed out"),
            ProviderErrorKind::Authentication => write!(f, "Authentication failed"),
            ProviderErrorKind::RateLimited => write!(f, "Rate limited by provider"),
            ProviderErrorKind::Api => write!(f, "Provider API error"),
            ProviderErrorKind::Unknown => write!(f, "Unknown error"),
        }
    }
}

/// Transport error raised by a provider during a delivery attempt.
#[derive(Error, Debug)]
pub struct ProviderError {
    kind: ProviderErrorKind,
    message: String,
    status_code: Option<u16>,
    #[source]
    cause: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl ProviderError {
    /// Creates a new provider error.
    pub fn new(kind: ProviderErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            status_code: None,
            cause: None,
        }
    }

    /// Sets the status code returned by the provider API.
    pub fn with_status_code(mut self, code: u16) -> Self {
        self.status_code = Some(code);
        self
    }

    /// Sets the underlying cause.
    pub fn with_cause<E: std::error::Error + Send + Sync + 'static>(mut self, cause: E) -> Self {
        self.cause = Some(Box::new(cause));
        self
    }

    /// Returns the error kind.
    pub fn kind(&self) -> ProviderErrorKind {
        self.kind
    }

    /// Returns the error message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the provider status code if one was reported.
    pub fn status_code(&self) -> Option<u16> {
        self.status_code
    }

    /// Creates a connection error.
    pub fn connection(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::Connection, message)
    }

    /// Creates a timeout error.
    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::Timeout, message)
    }

    /// Creates an authentication error.
    pub fn authentication(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::Authentication, message)
    }

    /// Creates an API error carrying the provider's status code.
    pub fn api(status_code: u16, message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::Api, message).with_status_code(status_code)
    }
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)?;
        if let Some(code) = self.status_code {
            write!(f, " (status {})", code)?;
        }
        Ok(())
    }
}
