//! Typed configuration surface for every component-level knob the
//! workspace's engines recognize.

use std::collections::HashMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};

/// Root configuration object, the single value every engine constructor
/// takes a reference (or a cloned sub-section) of.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    /// Retry engine defaults.
    pub retry: RetryDefaultsConfig,
    /// Download manager knobs.
    pub download: DownloadConfig,
    /// Model manager knobs.
    pub models: ModelManagerConfig,
    /// Transcription engine knobs.
    pub transcription: TranscriptionConfig,
    /// Media pipeline knobs.
    pub media: MediaConfig,
    /// Recovery coordinator knobs.
    pub recovery: RecoveryConfig,
    /// Storage layer knobs.
    pub storage: StorageConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            retry: RetryDefaultsConfig::default(),
            download: DownloadConfig::default(),
            models: ModelManagerConfig::default(),
            transcription: TranscriptionConfig::default(),
            media: MediaConfig::default(),
            recovery: RecoveryConfig::default(),
            storage: StorageConfig::default(),
        }
    }
}

impl AppConfig {
    /// Validate every sub-section, collecting the first failure.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] encountered.
    pub fn validate(&self) -> ConfigResult<()> {
        self.retry.validate()?;
        self.download.validate()?;
        self.models.validate()?;
        self.transcription.validate()?;
        self.media.validate()?;
        self.recovery.validate()?;
        self.storage.validate()?;
        Ok(())
    }
}

/// Default [`vellum_retry::RetryConfig`] knobs, used whenever a caller
/// does not supply an explicit policy.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RetryDefaultsConfig {
    /// Maximum attempts before giving up.
    pub max_attempts: u32,
    /// Initial delay before the first retry, in milliseconds.
    pub initial_delay_ms: u64,
    /// Upper bound on any single computed delay, in milliseconds.
    pub max_delay_ms: u64,
    /// Overall wall-clock budget for the whole retry loop, in
    /// milliseconds; `0` means unbounded.
    pub overall_timeout_ms: u64,
    /// Multiplier applied between attempts for exponential backoff.
    pub backoff_multiplier: f64,
    /// Fraction of the computed delay randomized as jitter, in `[0, 1]`.
    pub jitter_factor: f64,
    /// Whether jitter is applied at all.
    pub enable_jitter: bool,
}

impl Default for RetryDefaultsConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay_ms: 1_000,
            max_delay_ms: 30_000,
            overall_timeout_ms: 0,
            backoff_multiplier: 2.0,
            jitter_factor: 0.25,
            enable_jitter: true,
        }
    }
}

impl RetryDefaultsConfig {
    /// Validate the section.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidField`] when a field is out of range.
    pub fn validate(&self) -> ConfigResult<()> {
        if !(0.0..=1.0).contains(&self.jitter_factor) {
            return Err(ConfigError::InvalidField {
                field: "retry.jitter_factor",
                reason: "must be within [0, 1]",
            });
        }
        if self.backoff_multiplier <= 0.0 {
            return Err(ConfigError::InvalidField {
                field: "retry.backoff_multiplier",
                reason: "must be positive",
            });
        }
        Ok(())
    }

    /// Overall timeout as a [`Duration`], or `None` when unbounded.
    #[must_use]
    pub fn overall_timeout(&self) -> Option<Duration> {
        (self.overall_timeout_ms > 0).then(|| Duration::from_millis(self.overall_timeout_ms))
    }
}

/// Download manager knobs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DownloadConfig {
    /// Maximum concurrent active downloads; excess requests queue FIFO.
    pub max_concurrent_downloads: usize,
    /// Per-request timeout, in seconds.
    pub timeout_seconds: u64,
    /// Maximum retry attempts for a single download.
    pub max_retries: u32,
    /// Base retry delay, in seconds, before exponential backoff.
    pub retry_delay_seconds: u64,
    /// `User-Agent` header sent with every request.
    pub user_agent: String,
    /// Maximum redirects followed before failing with `NetworkError`.
    pub max_redirects: u8,
    /// Whether to verify TLS certificates.
    pub verify_ssl: bool,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            max_concurrent_downloads: 3,
            timeout_seconds: 300,
            max_retries: 3,
            retry_delay_seconds: 1,
            user_agent: concat!("vellum/", env!("CARGO_PKG_VERSION")).to_string(),
            max_redirects: 5,
            verify_ssl: true,
        }
    }
}

impl DownloadConfig {
    /// Validate the section.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidField`] when a field is out of range.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.max_concurrent_downloads == 0 {
            return Err(ConfigError::InvalidField {
                field: "download.max_concurrent_downloads",
                reason: "must be at least 1",
            });
        }
        if self.user_agent.trim().is_empty() {
            return Err(ConfigError::InvalidField {
                field: "download.user_agent",
                reason: "must not be empty",
            });
        }
        Ok(())
    }
}

/// Model manager knobs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ModelManagerConfig {
    /// Directory models are downloaded to and discovered from.
    pub models_dir: String,
    /// Maximum concurrent model downloads.
    pub max_concurrent_downloads: usize,
    /// Per-download timeout, in seconds.
    pub download_timeout_seconds: u64,
    /// Maximum retry attempts per download.
    pub max_retry_attempts: u32,
    /// Whether the periodic eviction sweep runs automatically.
    pub auto_cleanup_enabled: bool,
    /// Interval between eviction sweeps, in seconds.
    pub auto_cleanup_interval_seconds: u64,
    /// Age, in days, after which an unused downloaded model becomes
    /// eligible for eviction.
    pub unused_eviction_days: u64,
}

impl Default for ModelManagerConfig {
    fn default() -> Self {
        Self {
            models_dir: "models".to_string(),
            max_concurrent_downloads: 2,
            download_timeout_seconds: 300,
            max_retry_attempts: 3,
            auto_cleanup_enabled: true,
            auto_cleanup_interval_seconds: 3_600,
            unused_eviction_days: 30,
        }
    }
}

impl ModelManagerConfig {
    /// Validate the section.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidField`] when a field is out of range.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.models_dir.trim().is_empty() {
            return Err(ConfigError::InvalidField {
                field: "models.models_dir",
                reason: "must not be empty",
            });
        }
        if self.max_concurrent_downloads == 0 {
            return Err(ConfigError::InvalidField {
                field: "models.max_concurrent_downloads",
                reason: "must be at least 1",
            });
        }
        Ok(())
    }
}

/// Transcription engine knobs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TranscriptionConfig {
    /// Maximum concurrently running transcription tasks per engine
    /// instance.
    pub max_concurrent_transcriptions: usize,
    /// Soft memory cap, in megabytes, gating admission of new tasks.
    pub memory_limit_mb: u64,
    /// Whether GPU acceleration is requested from the STT wrapper.
    pub gpu_enabled: bool,
    /// Number of loaded models the Model Manager may keep resident.
    pub model_cache_size: usize,
}

impl Default for TranscriptionConfig {
    fn default() -> Self {
        Self {
            max_concurrent_transcriptions: 2,
            memory_limit_mb: 4_096,
            gpu_enabled: false,
            model_cache_size: 1,
        }
    }
}

impl TranscriptionConfig {
    /// Validate the section.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidField`] when a field is out of range.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.max_concurrent_transcriptions == 0 {
            return Err(ConfigError::InvalidField {
                field: "transcription.max_concurrent_transcriptions",
                reason: "must be at least 1",
            });
        }
        if self.memory_limit_mb == 0 {
            return Err(ConfigError::InvalidField {
                field: "transcription.memory_limit_mb",
                reason: "must be positive",
            });
        }
        Ok(())
    }
}

/// Media pipeline knobs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MediaConfig {
    /// Maximum concurrently running media operations.
    pub max_concurrent_operations: usize,
    /// Soft memory cap, in megabytes.
    pub memory_limit_mb: u64,
    /// Directory scratch files (extracted audio, thumbnails-in-progress)
    /// are written to before being moved to their final location.
    pub temp_dir: String,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            max_concurrent_operations: 4,
            memory_limit_mb: 2_048,
            temp_dir: std::env::temp_dir().to_string_lossy().into_owned(),
        }
    }
}

impl MediaConfig {
    /// Validate the section.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidField`] when a field is out of range.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.max_concurrent_operations == 0 {
            return Err(ConfigError::InvalidField {
                field: "media.max_concurrent_operations",
                reason: "must be at least 1",
            });
        }
        Ok(())
    }
}

/// Recovery coordinator knobs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RecoveryConfig {
    /// Maximum number of [`vellum_errors::ErrorContext`] entries retained
    /// in the ring-buffered history.
    pub max_error_history: usize,
    /// Whether errors are appended to the history at all.
    pub error_reporting_enabled: bool,
    /// Whether `report_error` automatically dispatches recovery
    /// strategies for `severity >= Error`.
    pub auto_recovery_enabled: bool,
    /// Per-component circuit breaker overrides, keyed by component name.
    pub breakers: HashMap<String, BreakerConfig>,
    /// Per-component health check probe intervals, keyed by component
    /// name.
    pub health_checks: HashMap<String, HealthCheckConfig>,
}

impl Default for RecoveryConfig {
    fn default() -> Self {
        Self {
            max_error_history: 1_000,
            error_reporting_enabled: true,
            auto_recovery_enabled: true,
            breakers: HashMap::new(),
            health_checks: HashMap::new(),
        }
    }
}

impl RecoveryConfig {
    /// Validate the section.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidField`] when a field is out of range.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.max_error_history == 0 {
            return Err(ConfigError::InvalidField {
                field: "recovery.max_error_history",
                reason: "must be at least 1",
            });
        }
        for breaker in self.breakers.values() {
            breaker.validate()?;
        }
        Ok(())
    }
}

/// Circuit breaker threshold/cooldown override for one component.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct BreakerConfig {
    /// Consecutive failures required to trip the breaker open.
    pub threshold: u32,
    /// Cooldown, in seconds, before a half-open trial is permitted.
    pub reset_timeout_seconds: u64,
}

impl Default for BreakerConfig {
    fn default() -> Self {
        Self {
            threshold: 5,
            reset_timeout_seconds: 300,
        }
    }
}

impl BreakerConfig {
    /// Validate the section.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidField`] when `threshold` is zero.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.threshold == 0 {
            return Err(ConfigError::InvalidField {
                field: "recovery.breakers.threshold",
                reason: "must be at least 1",
            });
        }
        Ok(())
    }

    /// Cooldown as a [`Duration`].
    #[must_use]
    pub fn reset_timeout(&self) -> Duration {
        Duration::from_secs(self.reset_timeout_seconds)
    }
}

/// Health check probe interval override for one component.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct HealthCheckConfig {
    /// Interval between probes, in seconds.
    pub interval_seconds: u64,
}

impl Default for HealthCheckConfig {
    fn default() -> Self {
        Self {
            interval_seconds: 30,
        }
    }
}

impl HealthCheckConfig {
    /// Interval as a [`Duration`].
    #[must_use]
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_seconds)
    }
}

/// Storage layer knobs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    pub database_path: String,
    /// Maximum pooled reader connections.
    pub max_reader_connections: u32,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: "vellum.sqlite3".to_string(),
            max_reader_connections: 4,
        }
    }
}

impl StorageConfig {
    /// Validate the section.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidField`] when a field is out of range.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.database_path.trim().is_empty() {
            return Err(ConfigError::InvalidField {
                field: "storage.database_path",
                reason: "must not be empty",
            });
        }
        if self.max_reader_connections == 0 {
            return Err(ConfigError::InvalidField {
                field: "storage.max_reader_connections",
                reason: "must be at least 1",
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        assert!(AppConfig::default().validate().is_ok());
    }

    #[test]
    fn jitter_factor_out_of_range_is_rejected() {
        let mut config = AppConfig::default();
        config.retry.jitter_factor = 1.5;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidField {
                field: "retry.jitter_factor",
                ..
            })
        ));
    }

    #[test]
    fn zero_concurrency_is_rejected() {
        let mut config = AppConfig::default();
        config.download.max_concurrent_downloads = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn overall_timeout_zero_means_unbounded() {
        let config = RetryDefaultsConfig::default();
        assert_eq!(config.overall_timeout(), None);
    }
}
