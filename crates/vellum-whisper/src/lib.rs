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

//! Safe façade over the native speech-to-text engine.
//!
//! [`WhisperWrapper`] owns at most one loaded model at a time and
//! serializes all inference through an internal mutex; the raw FFI
//! surface lives in the sibling `vellum-whisper-sys` crate. This crate
//! is the boundary where that `unsafe` surface gets wrapped in a safe
//! API, so unlike most crates in this workspace it does not forbid
//! `unsafe_code` outright; every `unsafe` block here carries a safety
//! comment justifying it.

mod config;
mod error;
mod model;
mod wrapper;

pub use config::TranscribeConfig;
pub use error::{WhisperError, WhisperResult, MIN_MODEL_SIZE_BYTES};
pub use model::{ModelInfo, WhisperSegment, WhisperTranscription};
pub use wrapper::WhisperWrapper;
