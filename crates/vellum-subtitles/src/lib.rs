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

//! Subtitle Formatter: the shared transcription data model, segment
//! transformations (merge, split, post-process text), and renderers for
//! every output format the Transcription Core supports.

pub mod error;
pub mod formats;
pub mod model;
pub mod timestamps;
pub mod transform;
pub mod validate;

pub use error::FormatError;
pub use formats::ass::to_ass;
pub use formats::csv::{to_csv, CsvOptions};
pub use formats::json::{from_json, to_json, to_json_string, JsonResult, JsonSegment};
pub use formats::lrc::{to_lrc, LrcMetadata};
pub use formats::srt::to_srt;
pub use formats::txt::{to_txt, TxtOptions};
pub use formats::vtt::{to_vtt, VttOptions};
pub use model::{TranscriptionResult, TranscriptionSegment, MAX_TIMESTAMP_MS};
pub use transform::{merge_segments, split_long_segments, post_process_text, PostProcessOptions};
pub use validate::validate_result;
