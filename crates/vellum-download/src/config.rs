//! Download manager configuration.

use std::time::Duration;

/// Tunables for a [`crate::DownloadManager`] instance.
#[derive(Debug, Clone)]
pub struct DownloadManagerConfig {
    /// Maximum concurrently active downloads; excess requests queue FIFO.
    pub max_concurrent_downloads: usize,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Maximum retry attempts for a single download's transient failures.
    pub max_retries: u32,
    /// Base retry delay before exponential backoff.
    pub retry_delay: Duration,
    /// `User-Agent` header sent with every request.
    pub user_agent: String,
    /// Maximum redirects followed before failing with `NetworkError`.
    pub max_redirects: u8,
    /// Whether to verify TLS certificates.
    pub verify_ssl: bool,
}

impl Default for DownloadManagerConfig {
    fn default() -> Self {
        Self {
            max_concurrent_downloads: 3,
            timeout: Duration::from_secs(300),
            max_retries: 3,
            retry_delay: Duration::from_secs(1),
            user_agent: concat!("vellum-download/", env!("CARGO_PKG_VERSION")).to_string(),
            max_redirects: 5,
            verify_ssl: true,
        }
    }
}
