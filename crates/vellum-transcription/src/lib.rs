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

//! The user-facing transcription orchestrator: file, video, realtime,
//! and microphone transcription over the Model Manager and STT Wrapper
//!.
//!
//! [`TranscriptionEngine`] is the component's only entry point: construct
//! one with [`TranscriptionEngine::new`] given a shared
//! [`vellum_models::ModelManager`] and [`vellum_whisper::WhisperWrapper`],
//! then call [`transcribe_audio`](TranscriptionEngine::transcribe_audio)/
//! [`transcribe_from_video`](TranscriptionEngine::transcribe_from_video)
//! for file-based work or
//! [`start_realtime_transcription`](TranscriptionEngine::start_realtime_transcription)/
//! [`start_microphone_transcription`](TranscriptionEngine::start_microphone_transcription)
//! for streaming, and subscribe to [`TranscriptionEvent`]s for progress.

mod config;
mod engine;
mod error;
mod events;
mod media;
mod microphone;
mod realtime;
mod stats;

pub use config::{EngineConfig, OutputFormat, TranscriptionSettings};
pub use engine::TranscriptionEngine;
pub use error::{TranscriptionError, TranscriptionResult};
pub use events::TranscriptionEvent;
pub use realtime::RealtimeSession;
pub use stats::PerformanceStats;
