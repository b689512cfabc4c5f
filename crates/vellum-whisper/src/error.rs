//! Error taxonomy for the native speech-to-text wrapper.

use thiserror::Error;
use vellum_errors::{ErrorSeverity, IntoErrorContext};

/// Result alias for wrapper operations.
pub type WhisperResult<T> = Result<T, WhisperError>;

/// Failure modes for [`crate::WhisperWrapper`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum WhisperError {
    /// The native context failed to initialize.
    #[error("whisper context initialization failed")]
    InitializationFailed,
    /// `whisper_init_from_file` returned null.
    #[error("failed to load model")]
    ModelLoadFailed,
    /// Audio conversion (format, resample, downmix) failed.
    #[error("audio processing failed")]
    AudioProcessingFailed,
    /// `whisper_full` returned a non-zero status.
    #[error("inference failed")]
    InferenceFailed,
    /// Caller-supplied samples or configuration were invalid.
    #[error("invalid input")]
    InvalidInput,
    /// The native allocator reported exhaustion.
    #[error("out of memory")]
    OutOfMemory,
    /// The model file is absent, empty, or smaller than 1 MiB.
    #[error("invalid model file")]
    InvalidModel,
    /// A requested capability is not supported by this build.
    #[error("unsupported feature")]
    UnsupportedFeature,
    /// `request_cancel` aborted the in-flight call.
    #[error("operation was cancelled")]
    Cancelled,
}

impl IntoErrorContext for WhisperError {
    fn component(&self) -> &'static str {
        "WhisperWrapper"
    }

    fn code(&self) -> &'static str {
        match self {
            Self::InitializationFailed => "initialization_failed",
            Self::ModelLoadFailed => "model_load_failed",
            Self::AudioProcessingFailed => "audio_processing_failed",
            Self::InferenceFailed => "inference_failed",
            Self::InvalidInput => "invalid_input",
            Self::OutOfMemory => "out_of_memory",
            Self::InvalidModel => "invalid_model",
            Self::UnsupportedFeature => "unsupported_feature",
            Self::Cancelled => "cancelled",
        }
    }

    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::InitializationFailed | Self::OutOfMemory => ErrorSeverity::Critical,
            Self::ModelLoadFailed | Self::InvalidModel | Self::AudioProcessingFailed => {
                ErrorSeverity::Error
            }
            Self::InferenceFailed => ErrorSeverity::Error,
            Self::InvalidInput | Self::UnsupportedFeature => ErrorSeverity::Warning,
            Self::Cancelled => ErrorSeverity::Info,
        }
    }
}

/// Minimum accepted model file size: files smaller than this are rejected
/// as [`WhisperError::InvalidModel`].
pub const MIN_MODEL_SIZE_BYTES: u64 = 1024 * 1024;
