//! Error types for the storage layer.

use thiserror::Error;
use vellum_errors::{ErrorSeverity, IntoErrorContext};

/// Result alias for storage layer operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors raised by [`crate::Storage`].
#[derive(Debug, Error)]
pub enum StorageError {
    /// Schema migration failed to apply.
    #[error("schema migration failed")]
    MigrationFailed(#[source] sqlx::migrate::MigrateError),
    /// A query or statement execution failed.
    #[error("database query failed")]
    QueryFailed(#[source] sqlx::Error),
    /// The requested row does not exist.
    #[error("record not found")]
    NotFound,
    /// A hash column did not match the required `^[0-9a-fA-F]{40}$` shape.
    #[error("invalid info hash")]
    InvalidHash,
    /// A numeric field that must be non-negative was negative.
    #[error("negative value not permitted for this field")]
    NegativeValue,
    /// A JSON column failed to (de)serialize.
    #[error("failed to encode or decode JSON column")]
    SerializationFailed(#[source] serde_json::Error),
    /// A filesystem operation backing backup/restore failed.
    #[error("filesystem operation failed")]
    IoFailed(#[source] std::io::Error),
}

impl From<sqlx::Error> for StorageError {
    fn from(source: sqlx::Error) -> Self {
        match source {
            sqlx::Error::RowNotFound => Self::NotFound,
            other => Self::QueryFailed(other),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for StorageError {
    fn from(source: sqlx::migrate::MigrateError) -> Self {
        Self::MigrationFailed(source)
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(source: serde_json::Error) -> Self {
        Self::SerializationFailed(source)
    }
}

impl From<std::io::Error> for StorageError {
    fn from(source: std::io::Error) -> Self {
        Self::IoFailed(source)
    }
}

impl IntoErrorContext for StorageError {
    fn component(&self) -> &'static str {
        "StorageLayer"
    }

    fn code(&self) -> &'static str {
        match self {
            Self::MigrationFailed(_) => "migration_failed",
            Self::QueryFailed(_) => "query_failed",
            Self::NotFound => "not_found",
            Self::InvalidHash => "invalid_hash",
            Self::NegativeValue => "negative_value",
            Self::SerializationFailed(_) => "serialization_failed",
            Self::IoFailed(_) => "io_failed",
        }
    }

    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::MigrationFailed(_) => ErrorSeverity::Critical,
            Self::QueryFailed(_) | Self::SerializationFailed(_) | Self::IoFailed(_) => {
                ErrorSeverity::Error
            }
            Self::NotFound => ErrorSeverity::Info,
            Self::InvalidHash | Self::NegativeValue => ErrorSeverity::Warning,
        }
    }
}

/// Validate a torrent info hash: 40 hex characters.
#[must_use]
pub fn is_valid_info_hash(hash: &str) -> bool {
    hash.len() == 40 && hash.bytes().all(|b| b.is_ascii_hexdigit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_hashes_accepted() {
        assert!(is_valid_info_hash(&"a".repeat(40)));
        assert!(is_valid_info_hash(&"ABCDEF0123456789ABCDEF0123456789ABCDEF01".to_string()));
    }

    #[test]
    fn invalid_hashes_rejected() {
        assert!(!is_valid_info_hash("too-short"));
        assert!(!is_valid_info_hash(&"g".repeat(40)));
        assert!(!is_valid_info_hash(&"a".repeat(41)));
    }

    #[test]
    fn not_found_maps_from_sqlx_row_not_found() {
        let err: StorageError = sqlx::Error::RowNotFound.into();
        assert!(matches!(err, StorageError::NotFound));
    }
}
