//! Error taxonomy for the transcription orchestrator.

use thiserror::Error;
use vellum_errors::{ErrorSeverity, IntoErrorContext};

/// Result alias for transcription engine operations.
pub type TranscriptionResult<T> = Result<T, TranscriptionError>;

/// Failure modes for [`crate::TranscriptionEngine`].
#[derive(Debug, Error, Clone, PartialEq)]
pub enum TranscriptionError {
    /// No model is currently loaded in the STT wrapper.
    #[error("no model is loaded")]
    ModelNotLoaded,
    /// The input path does not exist or is not a recognized media file.
    #[error("invalid input file")]
    InvalidInput,
    /// The requested language is neither `auto` nor a supported code.
    #[error("unsupported language")]
    UnsupportedLanguage,
    /// `activeTasks` or memory-budget gating rejected a new task.
    #[error("transcription resources exhausted")]
    ResourceExhausted,
    /// The task or session was cancelled before completing.
    #[error("transcription cancelled")]
    Cancelled,
    /// The STT wrapper reported an inference failure.
    #[error("transcription processing failed")]
    ProcessingFailed,
    /// Audio extraction via the external encoder failed.
    #[error("audio extraction failed")]
    EncoderFailed,
    /// A filesystem operation (temp file, probe) failed.
    #[error("io error")]
    IoError,
    /// Caller-supplied settings were invalid.
    #[error("invalid transcription settings")]
    InvalidSettings,
    /// No realtime or microphone session exists for the given id.
    #[error("session not found")]
    SessionNotFound,
    /// Formatting a result into an output format failed.
    #[error("output formatting failed")]
    FormatError,
}

impl IntoErrorContext for TranscriptionError {
    fn component(&self) -> &'static str {
        "TranscriptionEngine"
    }

    fn code(&self) -> &'static str {
        match self {
            Self::ModelNotLoaded => "model_not_loaded",
            Self::InvalidInput => "invalid_input",
            Self::UnsupportedLanguage => "unsupported_language",
            Self::ResourceExhausted => "resource_exhausted",
            Self::Cancelled => "cancelled",
            Self::ProcessingFailed => "processing_failed",
            Self::EncoderFailed => "encoder_failed",
            Self::IoError => "io_error",
            Self::InvalidSettings => "invalid_settings",
            Self::SessionNotFound => "session_not_found",
            Self::FormatError => "format_error",
        }
    }

    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::ModelNotLoaded | Self::ProcessingFailed | Self::EncoderFailed => {
                ErrorSeverity::Error
            }
            Self::ResourceExhausted => ErrorSeverity::Warning,
            Self::Cancelled => ErrorSeverity::Info,
            Self::InvalidInput
            | Self::UnsupportedLanguage
            | Self::InvalidSettings
            | Self::SessionNotFound
            | Self::FormatError => ErrorSeverity::Warning,
            Self::IoError => ErrorSeverity::Error,
        }
    }
}

impl From<vellum_whisper::WhisperError> for TranscriptionError {
    fn from(error: vellum_whisper::WhisperError) -> Self {
        use vellum_whisper::WhisperError as W;
        match error {
            W::InitializationFailed => Self::ModelNotLoaded,
            W::InvalidInput => Self::InvalidInput,
            W::AudioProcessingFailed => Self::EncoderFailed,
            W::Cancelled => Self::Cancelled,
            W::OutOfMemory => Self::ResourceExhausted,
            _ => Self::ProcessingFailed,
        }
    }
}

impl From<vellum_models::ModelError> for TranscriptionError {
    fn from(error: vellum_models::ModelError) -> Self {
        use vellum_models::ModelError as M;
        match error {
            M::ModelNotFound | M::ModelNotAvailable => Self::ModelNotLoaded,
            M::InvalidConfiguration => Self::InvalidSettings,
            _ => Self::ProcessingFailed,
        }
    }
}

impl From<vellum_subtitles::FormatError> for TranscriptionError {
    fn from(_: vellum_subtitles::FormatError) -> Self {
        Self::FormatError
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn into_context_carries_component_and_code() {
        let ctx = TranscriptionError::ModelNotLoaded.into_context("transcribe_audio");
        assert_eq!(ctx.component, "TranscriptionEngine");
        assert_eq!(ctx.code, "model_not_loaded");
    }

    #[test]
    fn whisper_cancelled_maps_to_cancelled() {
        let mapped: TranscriptionError = vellum_whisper::WhisperError::Cancelled.into();
        assert_eq!(mapped, TranscriptionError::Cancelled);
    }
}
