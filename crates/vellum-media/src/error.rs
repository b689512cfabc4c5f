//! Error taxonomy for the media pipeline.

use thiserror::Error;
use vellum_errors::{ErrorSeverity, IntoErrorContext};

/// Result alias for media pipeline operations.
pub type MediaResult<T> = Result<T, MediaError>;

/// Failure modes for [`crate::MediaPipeline`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MediaError {
    /// The input path does not exist or is not a recognized media file.
    #[error("invalid input file")]
    InvalidFile,
    /// The requested output container/codec combination is not supported.
    #[error("unsupported format")]
    UnsupportedFormat,
    /// The encoder subprocess exited non-zero or could not be started.
    #[error("media processing failed")]
    ProcessingFailed,
    /// The output file could not be written to its target path.
    #[error("output error")]
    OutputError,
    /// The operation was rejected because `max_concurrent_operations` or
    /// the memory cap would be exceeded.
    #[error("resource exhausted")]
    ResourceExhausted,
    /// `cancel_operation`/`cancel_all_operations` aborted the operation.
    #[error("operation cancelled")]
    Cancelled,
}

impl IntoErrorContext for MediaError {
    fn component(&self) -> &'static str {
        "MediaPipeline"
    }

    fn code(&self) -> &'static str {
        match self {
            Self::InvalidFile => "invalid_file",
            Self::UnsupportedFormat => "unsupported_format",
            Self::ProcessingFailed => "processing_failed",
            Self::OutputError => "output_error",
            Self::ResourceExhausted => "resource_exhausted",
            Self::Cancelled => "cancelled",
        }
    }

    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::InvalidFile | Self::UnsupportedFormat => ErrorSeverity::Warning,
            Self::ProcessingFailed | Self::OutputError => ErrorSeverity::Error,
            Self::ResourceExhausted => ErrorSeverity::Critical,
            Self::Cancelled => ErrorSeverity::Info,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn into_context_carries_component_and_code() {
        let ctx = MediaError::ProcessingFailed.into_context("convert");
        assert_eq!(ctx.component, "MediaPipeline");
        assert_eq!(ctx.code, "processing_failed");
        assert_eq!(ctx.severity, ErrorSeverity::Error);
    }

    #[test]
    fn cancelled_is_info_severity() {
        assert_eq!(MediaError::Cancelled.severity(), ErrorSeverity::Info);
    }
}
