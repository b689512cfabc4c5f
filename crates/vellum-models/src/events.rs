//! Lifecycle events published by the model manager.

use crate::error::ModelError;

/// Observable events for the model catalogue.
#[derive(Debug, Clone, PartialEq)]
pub enum ModelEvent {
    /// A download for `id` began.
    DownloadStarted {
        /// Catalogue id.
        id: String,
    },
    /// Download progress for `id`, percentage in `[0, 100]`.
    DownloadProgress {
        /// Catalogue id.
        id: String,
        /// Completion percentage.
        percentage: f64,
    },
    /// The download for `id` finished and passed validation.
    DownloadCompleted {
        /// Catalogue id.
        id: String,
    },
    /// The download or validation for `id` failed terminally.
    DownloadFailed {
        /// Catalogue id.
        id: String,
        /// Terminal error.
        error: ModelError,
    },
    /// `cancel_download` was invoked for `id`.
    DownloadCancelled {
        /// Catalogue id.
        id: String,
    },
    /// `id` became the STT wrapper's active model.
    ModelLoaded {
        /// Catalogue id.
        id: String,
    },
    /// `id` was unloaded (explicitly, or displaced by another `load_model`).
    ModelUnloaded {
        /// Catalogue id.
        id: String,
    },
    /// `id` was removed from the catalogue and disk by the eviction sweep
    /// or an explicit `delete_model`.
    ModelEvicted {
        /// Catalogue id.
        id: String,
        /// Human-readable reason (`"unused"`, `"failed"`, `"corrupted"`,
        /// `"deleted"`).
        reason: &'static str,
    },
}
