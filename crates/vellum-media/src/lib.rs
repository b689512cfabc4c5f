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

//! Asynchronous video analysis, transcoding, audio extraction, and
//! thumbnail generation over an external `ffmpeg`/`ffprobe` collaborator,
//! with hardware-acceleration negotiation, bounded concurrency, progress
//! reporting, and cancellation.
//!
//! [`MediaPipeline`] is the component's only entry point: construct one
//! with [`MediaPipeline::new`] (or [`MediaPipeline::with_probed_hwaccel`]
//! to auto-detect hardware encoders), then call
//! [`analyze_video`](MediaPipeline::analyze_video)/
//! [`convert_video`](MediaPipeline::convert_video)/
//! [`extract_audio`](MediaPipeline::extract_audio)/
//! [`generate_thumbnail`](MediaPipeline::generate_thumbnail) and subscribe
//! to [`MediaEvent`]s for progress reporting.

mod config;
mod encoder;
mod error;
mod events;
mod hwaccel;
mod model;
mod pipeline;

pub use config::PipelineConfig;
pub use error::{MediaError, MediaResult};
pub use events::{MediaEvent, ProgressSnapshot};
pub use hwaccel::{FfmpegHardwareAccelerator, HardwareAccelerator};
pub use model::{
    ConvertOptions, ExtractAudioOptions, OperationContext, OperationKind, ThumbnailOptions, VideoAnalysis,
};
pub use pipeline::MediaPipeline;
