//! Error taxonomy for the model manager.

use thiserror::Error;
use vellum_errors::{ErrorSeverity, IntoErrorContext};

/// Result alias for model manager operations.
pub type ModelResult<T> = Result<T, ModelError>;

/// Failure modes for [`crate::ModelManager`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ModelError {
    /// The manager's catalogue or models directory failed to initialize.
    #[error("model manager initialization failed")]
    InitializationFailed,
    /// No catalogue entry exists for the requested id.
    #[error("model not found")]
    ModelNotFound,
    /// The model exists in the catalogue but has no local file and no
    /// download URL to fetch one from.
    #[error("model not available")]
    ModelNotAvailable,
    /// The Download Manager reported a terminal failure.
    #[error("model download failed")]
    DownloadFailed,
    /// The STT wrapper rejected the downloaded file.
    #[error("model failed to load")]
    LoadingFailed,
    /// Magic-header or size validation failed.
    #[error("model validation failed")]
    ValidationFailed,
    /// A caller-supplied configuration value was invalid.
    #[error("invalid model manager configuration")]
    InvalidConfiguration,
    /// A network-level failure not otherwise classified.
    #[error("network error")]
    NetworkError,
    /// A filesystem-level failure not otherwise classified.
    #[error("disk error")]
    DiskError,
    /// Memory allocation for the model failed.
    #[error("memory error")]
    MemoryError,
    /// The local file is present but smaller than the minimum size or
    /// otherwise unreadable.
    #[error("model file is corrupted")]
    CorruptedModel,
    /// The requested model type/variant is not supported by this build.
    #[error("unsupported model")]
    UnsupportedModel,
    /// The models directory could not be written to.
    #[error("permission denied")]
    PermissionDenied,
}

impl IntoErrorContext for ModelError {
    fn component(&self) -> &'static str {
        "ModelManager"
    }

    fn code(&self) -> &'static str {
        match self {
            Self::InitializationFailed => "initialization_failed",
            Self::ModelNotFound => "model_not_found",
            Self::ModelNotAvailable => "model_not_available",
            Self::DownloadFailed => "download_failed",
            Self::LoadingFailed => "loading_failed",
            Self::ValidationFailed => "validation_failed",
            Self::InvalidConfiguration => "invalid_configuration",
            Self::NetworkError => "network_error",
            Self::DiskError => "disk_error",
            Self::MemoryError => "memory_error",
            Self::CorruptedModel => "corrupted_model",
            Self::UnsupportedModel => "unsupported_model",
            Self::PermissionDenied => "permission_denied",
        }
    }

    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::InitializationFailed | Self::MemoryError => ErrorSeverity::Critical,
            Self::DownloadFailed
            | Self::LoadingFailed
            | Self::ValidationFailed
            | Self::CorruptedModel
            | Self::DiskError
            | Self::PermissionDenied => ErrorSeverity::Error,
            Self::NetworkError => ErrorSeverity::Warning,
            Self::ModelNotFound | Self::ModelNotAvailable | Self::UnsupportedModel => {
                ErrorSeverity::Warning
            }
            Self::InvalidConfiguration => ErrorSeverity::Error,
        }
    }
}

impl From<vellum_download::DownloadError> for ModelError {
    fn from(error: vellum_download::DownloadError) -> Self {
        use vellum_download::DownloadError as D;
        match error {
            D::NetworkError | D::TimeoutError | D::ServerError => Self::NetworkError,
            D::ChecksumMismatch => Self::ValidationFailed,
            D::InsufficientDiskSpace | D::FileSystemError => Self::DiskError,
            D::PermissionDenied => Self::PermissionDenied,
            D::InvalidUrl => Self::InvalidConfiguration,
            D::CancellationRequested => Self::DownloadFailed,
            D::UnknownError => Self::DownloadFailed,
        }
    }
}

impl From<vellum_whisper::WhisperError> for ModelError {
    fn from(error: vellum_whisper::WhisperError) -> Self {
        use vellum_whisper::WhisperError as W;
        match error {
            W::InvalidModel => Self::CorruptedModel,
            W::OutOfMemory => Self::MemoryError,
            W::UnsupportedFeature => Self::UnsupportedModel,
            _ => Self::LoadingFailed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn into_context_carries_component_and_code() {
        let ctx = ModelError::CorruptedModel.into_context("load_model");
        assert_eq!(ctx.component, "ModelManager");
        assert_eq!(ctx.code, "corrupted_model");
    }

    #[test]
    fn download_error_maps_checksum_mismatch_to_validation_failed() {
        let mapped: ModelError = vellum_download::DownloadError::ChecksumMismatch.into();
        assert_eq!(mapped, ModelError::ValidationFailed);
    }
}
