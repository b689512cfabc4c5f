#![forbid(unsafe_code)]
#![deny(
    warnings,
    dead_code,
    unused,
    unused_imports,
    unused_must_use,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]
#![allow(clippy::module_name_repetitions)]

//! Relational persistence for torrents, media files, transcriptions, and
//! playback sessions.
//!
//! Backed by SQLite in WAL mode through `sqlx`. [`Storage::open`] applies
//! any pending `sqlx::migrate!` migrations on startup; every mutating
//! method additionally serializes on an application-level write guard so
//! that multi-statement transactions stay atomic across concurrent
//! callers.

mod error;
mod model;
mod store;

pub use error::{is_valid_info_hash, StorageError, StorageResult};
pub use model::{Media, Session, StorageStatistics, Torrent, Transcription};
pub use store::{empty_metadata, Storage};
