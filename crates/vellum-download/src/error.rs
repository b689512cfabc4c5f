//! Error taxonomy for the download manager.

use thiserror::Error;
use vellum_errors::{ErrorSeverity, IntoErrorContext};

/// Result alias for download manager operations.
pub type DownloadResult<T> = Result<T, DownloadError>;

/// Failure modes for [`crate::DownloadManager::download_file`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DownloadError {
    /// The transport failed to connect or the connection dropped mid-transfer.
    #[error("network error communicating with the remote host")]
    NetworkError,
    /// The request exceeded its configured timeout.
    #[error("download timed out")]
    TimeoutError,
    /// The completed file's SHA-256 digest did not match the expected value.
    #[error("checksum mismatch")]
    ChecksumMismatch,
    /// The target filesystem reported (or is predicted to report) `ENOSPC`.
    #[error("insufficient disk space for download")]
    InsufficientDiskSpace,
    /// The target directory or file could not be created or written.
    #[error("permission denied writing to target path")]
    PermissionDenied,
    /// The supplied URL was not `http`/`https` or failed to parse.
    #[error("invalid URL")]
    InvalidUrl,
    /// A filesystem operation (create dir, rename, open) failed for a
    /// reason other than permissions or disk space.
    #[error("filesystem error")]
    FileSystemError,
    /// `cancel_download` was called for this download.
    #[error("download was cancelled")]
    CancellationRequested,
    /// The remote server returned a non-2xx status after any redirects.
    #[error("server returned an error status")]
    ServerError,
    /// Any failure not covered by a more specific variant.
    #[error("unknown download error")]
    UnknownError,
}

impl IntoErrorContext for DownloadError {
    fn component(&self) -> &'static str {
        "DownloadManager"
    }

    fn code(&self) -> &'static str {
        match self {
            Self::NetworkError => "network_error",
            Self::TimeoutError => "timeout_error",
            Self::ChecksumMismatch => "checksum_mismatch",
            Self::InsufficientDiskSpace => "insufficient_disk_space",
            Self::PermissionDenied => "permission_denied",
            Self::InvalidUrl => "invalid_url",
            Self::FileSystemError => "filesystem_error",
            Self::CancellationRequested => "cancellation_requested",
            Self::ServerError => "server_error",
            Self::UnknownError => "unknown_error",
        }
    }

    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::NetworkError | Self::TimeoutError | Self::ServerError => ErrorSeverity::Warning,
            Self::ChecksumMismatch | Self::InsufficientDiskSpace | Self::PermissionDenied => {
                ErrorSeverity::Error
            }
            Self::InvalidUrl | Self::CancellationRequested => ErrorSeverity::Info,
            Self::FileSystemError | Self::UnknownError => ErrorSeverity::Error,
        }
    }
}

/// Whether a [`DownloadError`] is eligible for the transport-level retry
/// loop: transient network/server failures retry, everything else
/// (checksum, disk space, permissions, invalid input, cancellation) is
/// terminal.
#[must_use]
pub fn is_retryable(error: &DownloadError) -> bool {
    matches!(error, DownloadError::NetworkError | DownloadError::TimeoutError | DownloadError::ServerError)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_transient_errors_are_retryable() {
        assert!(is_retryable(&DownloadError::NetworkError));
        assert!(is_retryable(&DownloadError::ServerError));
        assert!(!is_retryable(&DownloadError::ChecksumMismatch));
        assert!(!is_retryable(&DownloadError::InsufficientDiskSpace));
        assert!(!is_retryable(&DownloadError::CancellationRequested));
    }

    #[test]
    fn into_context_carries_component_and_code() {
        let ctx = DownloadError::ChecksumMismatch.into_context("download_file");
        assert_eq!(ctx.component, "DownloadManager");
        assert_eq!(ctx.code, "checksum_mismatch");
        assert_eq!(ctx.severity, ErrorSeverity::Error);
    }
}
