//! Observability Infrastructure (AU-2, AU-3, AU-12)
//!
//! Structured logging for the authentication pipeline. Application code uses
//! the standard `tracing` macros plus the [`security_event!`] macro for
//! audit-relevant events; this module initializes the subscriber once at
//! startup.
//!
//! # Usage
//!
//! ```ignore
//! use portcullis::observability::{ObservabilityConfig, init};
//!
//! // From environment variables
//! init(ObservabilityConfig::from_env())?;
//!
//! // Or programmatically
//! let config = ObservabilityConfig {
//!     log_format: LogFormat::Json,
//!     log_filter: "info,portcullis=debug".into(),
//! };
//! init(config)?;
//! ```
//!
//! [`security_event!`]: crate::security_event

mod events;

pub use events::{security_event, SecurityEvent, Severity};

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Output format for log records
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable multi-line output (development)
    Pretty,
    /// One JSON object per record (production audit pipelines)
    Json,
    /// Single-line human-readable output
    Compact,
}

/// Logging configuration, initialized once at startup
#[derive(Debug, Clone)]
pub struct ObservabilityConfig {
    /// Output format
    pub log_format: LogFormat,
    /// Default `tracing` filter directive, overridden by `RUST_LOG`
    pub log_filter: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_format: LogFormat::Compact,
            log_filter: "info".to_string(),
        }
    }
}

impl ObservabilityConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `LOG_FORMAT`: "pretty", "json", or "compact" (default: "compact")
    /// - `LOG_FILTER`: tracing filter directive (default: "info")
    pub fn from_env() -> Self {
        let log_format = match std::env::var("LOG_FORMAT").as_deref() {
            Ok("pretty") => LogFormat::Pretty,
            Ok("json") => LogFormat::Json,
            _ => LogFormat::Compact,
        };

        let log_filter = std::env::var("LOG_FILTER").unwrap_or_else(|_| "info".to_string());

        Self {
            log_format,
            log_filter,
        }
    }
}

/// Initialize the tracing subscriber.
///
/// Must be called once at application startup, before any logging occurs.
/// `RUST_LOG` takes precedence over the configured filter.
///
/// # Errors
///
/// Returns an error if the filter directive is invalid or a global
/// subscriber is already installed.
pub fn init(config: ObservabilityConfig) -> Result<(), ObservabilityError> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_filter))
        .map_err(|e| ObservabilityError::Config(format!("Invalid log filter: {}", e)))?;

    let subscriber = tracing_subscriber::registry().with(filter);

    match config.log_format {
        LogFormat::Pretty => {
            subscriber
                .with(fmt::layer().pretty().with_target(true))
                .try_init()
                .map_err(|e| ObservabilityError::Init(format!("Failed to init tracing: {}", e)))?;
        }
        LogFormat::Json => {
            subscriber
                .with(fmt::layer().json().with_target(true))
                .try_init()
                .map_err(|e| ObservabilityError::Init(format!("Failed to init tracing: {}", e)))?;
        }
        LogFormat::Compact => {
            subscriber
                .with(fmt::layer().compact().with_target(true))
                .try_init()
                .map_err(|e| ObservabilityError::Init(format!("Failed to init tracing: {}", e)))?;
        }
    }

    tracing::info!(
        log_format = ?config.log_format,
        "Observability initialized"
    );

    Ok(())
}

/// Observability initialization errors
#[derive(Debug)]
pub enum ObservabilityError {
    /// Invalid configuration
    Config(String),
    /// Subscriber installation failed
    Init(String),
}

impl std::fmt::Display for ObservabilityError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(msg) => write!(f, "Observability config error: {}", msg),
            Self::Init(msg) => write!(f, "Observability init error: {}", msg),
        }
    }
}

impl std::error::Error for ObservabilityError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ObservabilityConfig::default();
        assert_eq!(config.log_format, LogFormat::Compact);
        assert_eq!(config.log_filter, "info");
    }
}
