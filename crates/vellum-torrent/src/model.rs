//! DTOs exchanged between the storage layer and a torrent engine adapter.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// How a torrent should be admitted into the engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TorrentSource {
    /// A magnet URI to resolve and add.
    Magnet {
        /// Magnet URI.
        uri: String,
    },
    /// Raw `.torrent` metainfo bytes.
    Metainfo {
        /// Bencoded metainfo payload.
        bytes: Vec<u8>,
    },
}

/// Request payload for admitting a torrent into the engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddTorrent {
    /// Unique identifier assigned by the caller.
    pub id: Uuid,
    /// How the torrent should be retrieved.
    pub source: TorrentSource,
    /// Optional save-path override.
    pub download_dir: Option<String>,
}

/// Options controlling how the engine removes torrents.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default)]
pub struct RemoveTorrent {
    /// Whether to remove on-disk data alongside the torrent metadata.
    #[serde(default)]
    pub with_data: bool,
}

/// Lifecycle state of a torrent, mirrored into `TorrentRecord.status`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum TorrentState {
    /// Queued but not yet started.
    Queued,
    /// Fetching metadata (magnet resolution).
    FetchingMetadata,
    /// Actively downloading payload data.
    Downloading,
    /// Seeding after completion.
    Seeding,
    /// Completed downloading.
    Completed,
    /// Encountered an unrecoverable error.
    Failed {
        /// Description of the failure.
        message: String,
    },
}

/// Aggregated progress metrics for a torrent.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default)]
pub struct TorrentProgress {
    /// Total bytes downloaded so far.
    pub bytes_downloaded: u64,
    /// Total bytes expected for completion.
    pub bytes_total: u64,
    /// Current download rate in bytes per second.
    pub download_bps: u64,
    /// Current upload rate in bytes per second.
    pub upload_bps: u64,
}

impl TorrentProgress {
    /// Completion percentage in `[0, 100]`.
    #[must_use]
    pub fn percent_complete(&self) -> f64 {
        if self.bytes_total == 0 {
            0.0
        } else {
            (precision_lossy(self.bytes_downloaded) / precision_lossy(self.bytes_total)) * 100.0
        }
    }
}

#[expect(
    clippy::cast_precision_loss,
    reason = "progress percentages are user-facing and tolerate float rounding"
)]
const fn precision_lossy(value: u64) -> f64 {
    value as f64
}

/// Events the torrent engine adapter publishes for the storage layer to
/// persist and for a host application to surface.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EngineEvent {
    /// Torrent state transitioned.
    StateChanged {
        /// Torrent identifier.
        torrent_id: Uuid,
        /// Updated lifecycle state.
        state: TorrentState,
    },
    /// Progress metrics were updated.
    Progress {
        /// Torrent identifier.
        torrent_id: Uuid,
        /// Updated progress snapshot.
        progress: TorrentProgress,
    },
    /// Torrent completed and produced a library artifact.
    Completed {
        /// Torrent identifier.
        torrent_id: Uuid,
        /// Path to the completed artifact.
        library_path: String,
        /// Timestamp of completion.
        at: DateTime<Utc>,
    },
    /// Engine reported an error condition.
    Error {
        /// Torrent identifier associated with the error.
        torrent_id: Uuid,
        /// Human-readable failure description.
        message: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percent_complete_handles_zero_total() {
        let progress = TorrentProgress::default();
        assert!((progress.percent_complete()).abs() < f64::EPSILON);
    }

    #[test]
    fn percent_complete_computes_ratio() {
        let progress = TorrentProgress {
            bytes_downloaded: 25,
            bytes_total: 100,
            download_bps: 0,
            upload_bps: 0,
        };
        assert!((progress.percent_complete() - 25.0).abs() < f64::EPSILON);
    }
}
