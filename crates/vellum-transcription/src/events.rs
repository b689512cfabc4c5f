//! Lifecycle events published by the transcription engine.

use uuid::Uuid;
use vellum_subtitles::{TranscriptionResult, TranscriptionSegment};

use crate::error::TranscriptionError;

/// Observable events for file/video transcription tasks and realtime
/// sessions.
#[derive(Debug, Clone)]
pub enum TranscriptionEvent {
    /// A file or video transcription task began.
    TaskStarted {
        /// Task id.
        id: Uuid,
    },
    /// Progress update in `[0, 100]` for a task.
    Progress {
        /// Task id.
        id: Uuid,
        /// Completion percentage.
        percentage: u32,
    },
    /// A task finished successfully.
    Completed {
        /// Task id.
        id: Uuid,
        /// The produced result.
        result: TranscriptionResult,
    },
    /// A task failed terminally.
    Failed {
        /// Task id.
        id: Uuid,
        /// Terminal error.
        error: TranscriptionError,
    },
    /// A task was cancelled before completing.
    Cancelled {
        /// Task id.
        id: Uuid,
    },
    /// A realtime or microphone session emitted a new segment.
    RealtimeSegment {
        /// Session id.
        session_id: Uuid,
        /// The emitted segment, timestamps offset by session start.
        segment: TranscriptionSegment,
    },
    /// A realtime or microphone session's current volume level, computed
    /// per fed chunk as `mean(|sample|) / 32768`.
    VolumeLevel {
        /// Session id.
        session_id: Uuid,
        /// Normalized volume in `[0, 1]`.
        level: f32,
    },
    /// A realtime or microphone session stopped.
    SessionStopped {
        /// Session id.
        session_id: Uuid,
    },
}
