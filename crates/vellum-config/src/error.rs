//! Error type for configuration loading and validation.

use thiserror::Error;

/// Failure modes surfaced while loading or validating [`crate::model::AppConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read from disk.
    #[error("failed to read configuration file")]
    Read {
        /// Path that was attempted.
        path: String,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },
    /// The configuration file's contents were not valid TOML.
    #[error("failed to parse configuration file as TOML")]
    Parse {
        /// Path that was attempted.
        path: String,
        /// Underlying parse failure.
        #[source]
        source: toml::de::Error,
    },
    /// An environment variable override could not be parsed into the
    /// expected type.
    #[error("invalid environment variable override")]
    InvalidEnvOverride {
        /// Environment variable name.
        key: String,
        /// Raw value that failed to parse.
        value: String,
    },
    /// A field failed semantic validation (e.g. out of range, empty where
    /// required).
    #[error("invalid configuration field")]
    InvalidField {
        /// Dotted path to the field, e.g. `download.max_concurrent_downloads`.
        field: &'static str,
        /// Human-readable reason, fixed per call site.
        reason: &'static str,
    },
}

/// Convenience alias for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;
