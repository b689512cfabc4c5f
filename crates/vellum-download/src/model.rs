//! Data model for a single tracked download.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle status of a tracked download.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DownloadStatus {
    /// Queued but not yet admitted (concurrency slot unavailable).
    Pending,
    /// Actively transferring.
    Downloading,
    /// Suspended; a resume will continue from `resume_position`.
    Paused,
    /// Finished and checksum-verified (when a checksum was supplied).
    Completed,
    /// Terminated by an unrecoverable error.
    Failed,
    /// Terminated by `cancel_download`.
    Cancelled,
}

/// Observable state of one download, updated as the transfer progresses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadInfo {
    /// Unique identifier for this download.
    pub id: Uuid,
    /// Source URL.
    pub url: String,
    /// Final destination path.
    pub local_path: String,
    /// Temporary path the body streams into (`<local_path>.tmp`).
    pub temp_path: String,
    /// Expected SHA-256 digest, lowercase hex, when checksum verification
    /// was requested.
    pub expected_checksum: Option<String>,
    /// Total size in bytes, when known from `Content-Length`.
    pub total_size: Option<u64>,
    /// Bytes received so far.
    pub downloaded_size: u64,
    /// `status`.
    pub status: DownloadStatus,
    /// Instantaneous transfer rate, in bytes/second.
    pub speed_bps: f64,
    /// When this download started.
    pub start_time: DateTime<Utc>,
    /// Whether the server advertised `Accept-Ranges: bytes`.
    pub supports_resume: bool,
    /// Byte offset a resumed transfer continues from.
    pub resume_position: u64,
    /// Number of retry attempts made so far.
    pub retry_count: u32,
    /// Retry attempt ceiling for this download.
    pub max_retries: u32,
}

impl DownloadInfo {
    /// Construct a fresh, not-yet-started download record.
    #[must_use]
    pub fn new(url: impl Into<String>, local_path: impl Into<String>, max_retries: u32) -> Self {
        let local_path = local_path.into();
        let temp_path = format!("{local_path}.tmp");
        Self {
            id: Uuid::new_v4(),
            url: url.into(),
            local_path,
            temp_path,
            expected_checksum: None,
            total_size: None,
            downloaded_size: 0,
            status: DownloadStatus::Pending,
            speed_bps: 0.0,
            start_time: Utc::now(),
            supports_resume: false,
            resume_position: 0,
            retry_count: 0,
            max_retries,
        }
    }

    /// Completion percentage in `[0, 100]`, or `0.0` when total size is
    /// unknown.
    #[must_use]
    pub fn percentage(&self) -> f64 {
        match self.total_size {
            Some(total) if total > 0 => {
                100.0 * (self.downloaded_size as f64) / (total as f64)
            }
            _ => 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percentage_is_zero_until_total_known() {
        let info = DownloadInfo::new("https://h.example/m.bin", "/tmp/m.bin", 3);
        assert_eq!(info.percentage(), 0.0);
    }

    #[test]
    fn percentage_computed_from_total() {
        let mut info = DownloadInfo::new("https://h.example/m.bin", "/tmp/m.bin", 3);
        info.total_size = Some(200);
        info.downloaded_size = 50;
        assert!((info.percentage() - 25.0).abs() < f64::EPSILON);
    }

    #[test]
    fn temp_path_derived_from_local_path() {
        let info = DownloadInfo::new("https://h.example/m.bin", "/tmp/m.bin", 3);
        assert_eq!(info.temp_path, "/tmp/m.bin.tmp");
    }
}
