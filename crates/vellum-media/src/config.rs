//! Media pipeline engine configuration.

use std::path::PathBuf;

/// Engine-wide tunables for a [`crate::MediaPipeline`] instance.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Maximum concurrently running operations; excess requests queue on
    /// the internal semaphore.
    pub max_concurrent_operations: usize,
    /// Soft ceiling on the process's projected memory footprint, in
    /// bytes, checked via the `sysinfo` RSS sampler at admission time.
    pub memory_limit_bytes: u64,
    /// Directory scratch files (extracted audio, in-progress thumbnails)
    /// are written to before being moved to their final location.
    pub temp_dir: PathBuf,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_concurrent_operations: 4,
            memory_limit_bytes: 2 * 1024 * 1024 * 1024,
            temp_dir: std::env::temp_dir(),
        }
    }
}
