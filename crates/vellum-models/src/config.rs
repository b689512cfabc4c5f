//! Model manager configuration.

use std::time::Duration;

/// Tunables for a [`crate::ModelManager`] instance.
#[derive(Debug, Clone)]
pub struct ModelManagerConfig {
    /// Directory models are downloaded to and discovered from.
    pub models_dir: String,
    /// Maximum concurrent model downloads; excess requests queue FIFO.
    pub max_concurrent_downloads: usize,
    /// Per-download timeout.
    pub download_timeout: Duration,
    /// Maximum retry attempts per download.
    pub max_retry_attempts: u32,
    /// Whether the periodic eviction sweep runs automatically.
    pub auto_cleanup_enabled: bool,
    /// Interval between eviction sweeps.
    pub auto_cleanup_interval: Duration,
    /// Age after which an unused downloaded model becomes eligible for
    /// eviction.
    pub unused_eviction: Duration,
}

impl Default for ModelManagerConfig {
    fn default() -> Self {
        Self {
            models_dir: "models".to_string(),
            max_concurrent_downloads: 2,
            download_timeout: Duration::from_secs(300),
            max_retry_attempts: 3,
            auto_cleanup_enabled: true,
            auto_cleanup_interval: Duration::from_secs(3_600),
            unused_eviction: Duration::from_secs(30 * 24 * 3_600),
        }
    }
}
