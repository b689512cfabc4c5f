//! Tracing subscriber installation.

use anyhow::{Result, anyhow};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Default logging target when `RUST_LOG` is not provided.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Output format selection for the tracing subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Emit logs as structured JSON objects, one per line.
    Json,
    /// Emit human-readable, pretty-printed logs.
    Pretty,
}

impl LogFormat {
    /// Choose a sensible default for the current build profile.
    #[must_use]
    pub const fn infer() -> Self {
        if cfg!(debug_assertions) {
            Self::Pretty
        } else {
            Self::Json
        }
    }
}

/// Logging configuration passed into [`init_logging`].
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Log level/filter directive (e.g. `info`, `vellum_media=debug`).
    pub level: String,
    /// Output format.
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: DEFAULT_LOG_LEVEL.to_string(),
            format: LogFormat::infer(),
        }
    }
}

/// Install the global `tracing` subscriber.
///
/// Safe to call more than once per process (subsequent calls are no-ops);
/// the host application and its test harness may both attempt to
/// initialize logging.
///
/// # Errors
///
/// Returns an error only for reasons other than "a subscriber is already
/// installed", which is swallowed.
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    let result = match config.format {
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_target(true).with_thread_ids(false))
            .try_init(),
        LogFormat::Pretty => tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true).with_thread_ids(false))
            .try_init(),
    };

    match result {
        Ok(()) => Ok(()),
        Err(err) if err.to_string().contains("already") => Ok(()),
        Err(err) => Err(anyhow!("failed to install tracing subscriber: {err}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn infer_picks_pretty_in_debug_builds() {
        if cfg!(debug_assertions) {
            assert!(matches!(LogFormat::infer(), LogFormat::Pretty));
        } else {
            assert!(matches!(LogFormat::infer(), LogFormat::Json));
        }
    }

    #[test]
    fn init_logging_is_idempotent() {
        let config = LoggingConfig::default();
        assert!(init_logging(&config).is_ok());
        assert!(init_logging(&config).is_ok());
    }
}
