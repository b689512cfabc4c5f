//! Lifecycle events published by the download manager.

use uuid::Uuid;

use crate::error::DownloadError;

/// Observable events for one download's lifecycle.
#[derive(Debug, Clone, PartialEq)]
pub enum DownloadEvent {
    /// The download was admitted and the transfer began.
    Started {
        /// Download identifier.
        id: Uuid,
    },
    /// Progress update; `speed_bps` is the current instantaneous rate.
    Progress {
        /// Download identifier.
        id: Uuid,
        /// Bytes received so far.
        received: u64,
        /// Total bytes, when known.
        total: Option<u64>,
        /// Instantaneous transfer rate, bytes/second.
        speed_bps: f64,
    },
    /// The download finished and passed checksum verification (if any).
    Completed {
        /// Download identifier.
        id: Uuid,
        /// Final path on disk.
        local_path: String,
    },
    /// The download failed terminally.
    Failed {
        /// Download identifier.
        id: Uuid,
        /// Terminal error.
        error: DownloadError,
    },
    /// `cancel_download` was invoked for this download.
    Cancelled {
        /// Download identifier.
        id: Uuid,
    },
    /// A previously paused/interrupted download resumed from a byte offset.
    Resumed {
        /// Download identifier.
        id: Uuid,
        /// Byte offset the resume continues from.
        from_offset: u64,
    },
}
