//! Logging setup for processes embedding the orchestrator.

use tracing::Level;
use tracing_subscriber::EnvFilter;

use crate::errors::{DeliveryError, DeliveryResult};

/// Log level
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Trace level - every gate decision
    Trace,
    /// Debug level - gate waits and timers
    Debug,
    /// Info level - delivery outcomes
    Info,
    /// Warn level - provider failures
    Warn,
    /// Error level
    Error,
}

impl From<LogLevel> for Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => Level::TRACE,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Info => Level::INFO,
            LogLevel::Warn => Level::WARN,
            LogLevel::Error => Level::ERROR,
        }
    }
}

/// Log format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Pretty printed format for development
    Pretty,
    /// JSON format for production
    Json,
    /// Compact format
    Compact,
}

/// Configuration for logging
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Default level when `RUST_LOG` is not set
    pub level: LogLevel,
    /// Log format
    pub format: LogFormat,
    /// Whether to include target (module path)
    pub include_target: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            format: LogFormat::Pretty,
            include_target: false,
        }
    }
}

impl LoggingConfig {
    /// Create a new logging configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the log level
    pub fn with_level(mut self, level: LogLevel) -> Self {
        self.level = level;
        self
    }

    /// Set the log format
    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    /// Enable or disable target
    pub fn with_target(mut self, include: bool) -> Self {
        self.include_target = include;
        self
    }

    /// Create configuration for development
    pub fn development() -> Self {
        Self {
            level: LogLevel::Debug,
            format: LogFormat::Pretty,
            include_target: true,
        }
    }

    /// Create configuration for production
    pub fn production() -> Self {
        Self {
            level: LogLevel::Info,
            format: LogFormat::Json,
            include_target: false,
        }
    }

    fn env_filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(Level::from(self.level).to_string().to_lowercase()))
    }
}

/// Installs a global `tracing` subscriber.
///
/// `RUST_LOG` takes precedence over the configured level. Fails if a
/// global subscriber is already installed.
pub fn init_logging(config: &LoggingConfig) -> DeliveryResult<()> {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(config.env_filter())
        .with_target(config.include_target);

    let result = match config.format {
        LogFormat::Pretty => builder.pretty().try_init(),
        LogFormat::Json => builder.json().try_init(),
        LogFormat::Compact => builder.compact().try_init(),
    };

    result.map_err(|e| DeliveryError::configuration(format!("failed to install logger: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_conversion() {
        assert_eq!(Level::from(LogLevel::Warn), Level::WARN);
        assert_eq!(Level::from(LogLevel::Trace), Level::TRACE);
    }

    #[test]
    fn test_presets() {
        let dev = LoggingConfig::development();
        assert_eq!(dev.level, LogLevel::Debug);
        assert!(dev.include_target);

        let prod = LoggingConfig::production();
        assert_eq!(prod.format, LogFormat::Json);
    }

    #[test]
    fn test_init_logging_only_once() {
        let config = LoggingConfig::new().with_format(LogFormat::Compact);
        // Nothing else in this test binary installs a global subscriber.
        assert!(init_logging(&config).is_ok());

        let err = init_logging(&config).unwrap_err();
        assert!(matches!(err, DeliveryError::Configuration { .. }));
        assert!(err.to_string().contains("failed to install logger"));
        assert!(init_logging(&LoggingConfig::production()).is_err());
    }
}
