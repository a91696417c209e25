//! Logging setup for the binary
//!
//! `RUST_LOG` takes precedence over the configured level.

use std::fs::OpenOptions;
use std::sync::Arc;

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::LoggingConfig;
use crate::error::ConfigError;

/// Output format of log lines
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable, multi-line
    Pretty,
    /// One JSON object per line
    Json,
}

impl LogFormat {
    pub fn parse(format: &str) -> Result<Self, ConfigError> {
        match format.to_ascii_lowercase().as_str() {
            "pretty" | "text" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            other => Err(ConfigError::Logging(format!("unknown log format {:?}", other))),
        }
    }
}

/// Build the level filter from `RUST_LOG` or the configured directive
fn env_filter(level: &str) -> Result<EnvFilter, ConfigError> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }

    EnvFilter::try_new(level)
        .map_err(|e| ConfigError::Logging(format!("invalid log level {:?}: {}", level, e)))
}

/// Install the global subscriber
///
/// Fails if the configuration is invalid or a subscriber is already set.
pub fn init_logging(config: &LoggingConfig) -> Result<(), ConfigError> {
    let format = LogFormat::parse(&config.format)?;
    let filter = env_filter(&config.level)?;
    let registry = tracing_subscriber::registry().with(filter);

    let file = match config.file_path {
        Some(ref path) => Some(Arc::new(
            OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|e| ConfigError::Logging(format!("{}: {}", path.display(), e)))?,
        )),
        None => None,
    };

    let result = match (format, file) {
        (LogFormat::Json, Some(file)) => registry
            .with(fmt::layer().json().with_current_span(true).with_writer(file))
            .try_init(),
        (LogFormat::Json, None) => registry
            .with(fmt::layer().json().with_current_span(true))
            .try_init(),
        (LogFormat::Pretty, Some(file)) => registry
            .with(fmt::layer().with_ansi(false).with_target(true).with_writer(file))
            .try_init(),
        (LogFormat::Pretty, None) => registry.with(fmt::layer().with_target(true)).try_init(),
    };

    result.map_err(|e| ConfigError::Logging(e.to_string()))
}
