//! Error taxonomy for torrent engine adapters.

use thiserror::Error;
use uuid::Uuid;

/// Failure modes surfaced by a [`crate::TorrentEngine`] adapter.
#[derive(Debug, Error)]
pub enum TorrentError {
    /// The operation is not implemented by this adapter.
    #[error("torrent operation not supported")]
    Unsupported {
        /// Name of the unsupported operation.
        operation: &'static str,
    },
    /// The referenced torrent is unknown to the adapter.
    #[error("torrent not found")]
    NotFound {
        /// Missing torrent identifier.
        torrent_id: Uuid,
    },
    /// The adapter failed to perform the operation.
    #[error("torrent operation failed")]
    OperationFailed {
        /// Name of the failing operation.
        operation: &'static str,
        /// Torrent identifier, when known.
        torrent_id: Option<Uuid>,
        /// Underlying failure description.
        message: String,
    },
}

/// Convenience alias for torrent adapter results.
pub type TorrentResult<T> = Result<T, TorrentError>;
