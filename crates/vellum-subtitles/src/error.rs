//! Error taxonomy for subtitle formatting and validation.

use thiserror::Error;

/// Failure modes for formatting and transforming [`crate::TranscriptionResult`]s.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FormatError {
    /// The result carried no segments with non-empty text.
    #[error("transcription result has no text to format")]
    EmptyTranscription,
    /// A segment's timestamps were invalid: `end <= start`, negative, or
    /// beyond the 24-hour ceiling.
    #[error("segment has an invalid timestamp")]
    InvalidTimestamp {
        /// Segment index within the result.
        index: usize,
    },
    /// A segment's confidence was outside `[0, 1]`.
    #[error("segment has an invalid confidence value")]
    InvalidConfidence {
        /// Segment index within the result.
        index: usize,
    },
    /// The requested output format is not recognized.
    #[error("unsupported output format")]
    UnsupportedFormat {
        /// The unrecognized format name as provided by the caller.
        requested: String,
    },
    /// Serialization to the target format failed.
    #[error("failed to serialize transcription result")]
    Serialization {
        /// Underlying serializer's message.
        message: String,
    },
}
