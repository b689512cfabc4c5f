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

//! Resumable, checksum-verified HTTP downloads with bounded concurrency
//! and transient-failure retry.
//!
//! [`DownloadManager`] is the component's only entry point: construct one
//! from a [`DownloadManagerConfig`], call
//! [`download_file`](DownloadManager::download_file) per transfer, and
//! subscribe to [`DownloadEvent`]s for progress reporting. Every transfer
//! streams into a `<target>.tmp` sibling file and is only renamed into
//! place after checksum verification succeeds, so a consumer polling the
//! target path never observes a partially written file.

mod config;
mod error;
mod events;
mod manager;
mod model;

pub use config::DownloadManagerConfig;
pub use error::{is_retryable, DownloadError, DownloadResult};
pub use events::DownloadEvent;
pub use manager::DownloadManager;
pub use model::{DownloadInfo, DownloadStatus};
