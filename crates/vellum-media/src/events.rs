//! Lifecycle events published by the media pipeline.

use uuid::Uuid;

use crate::error::MediaError;

/// Observable progress for a running convert/extract-audio operation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressSnapshot {
    /// Frames processed so far, when the encoder reports them.
    pub processed_frames: Option<u64>,
    /// Total frames expected, when known in advance.
    pub total_frames: Option<u64>,
    /// Current encoding rate in frames per second.
    pub current_fps: Option<f64>,
    /// Wall-clock time elapsed since the operation started, in milliseconds.
    pub elapsed_ms: u64,
    /// Estimated remaining time, in milliseconds, when derivable from
    /// `current_fps` and `total_frames`.
    pub estimated_remaining_ms: Option<u64>,
}

/// Events published on a [`crate::MediaPipeline`]'s channel.
#[derive(Debug, Clone, PartialEq)]
pub enum MediaEvent {
    /// A new operation was admitted and started.
    OperationStarted {
        /// Operation identifier.
        id: Uuid,
    },
    /// Progress update for a running operation.
    Progress {
        /// Operation identifier.
        id: Uuid,
        /// Progress snapshot at the time of the update.
        progress: ProgressSnapshot,
    },
    /// The operation finished successfully.
    Completed {
        /// Operation identifier.
        id: Uuid,
        /// Path to the produced output file.
        output_path: String,
    },
    /// The operation failed terminally.
    Failed {
        /// Operation identifier.
        id: Uuid,
        /// Terminal error.
        error: MediaError,
    },
    /// `cancel_operation`/`cancel_all_operations` aborted the operation.
    Cancelled {
        /// Operation identifier.
        id: Uuid,
    },
}
