//! Value types exchanged with the media pipeline.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Result of [`crate::MediaPipeline::analyze_video`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoAnalysis {
    /// Path that was analyzed.
    pub file_path: String,
    /// Container format name as reported by the probe (e.g. `"mov,mp4,m4a"`).
    pub format: String,
    /// Duration in milliseconds.
    pub duration_ms: u64,
    /// File size in bytes.
    pub file_size: u64,
    /// Pixel width of the primary video stream.
    pub width: u32,
    /// Pixel height of the primary video stream.
    pub height: u32,
    /// Frame rate in frames per second.
    pub frame_rate: f64,
    /// Video codec name (e.g. `"h264"`).
    pub codec: String,
    /// Overall bitrate in bits per second, when reported.
    pub bitrate: Option<u64>,
    /// Whether the file carries at least one audio stream.
    pub has_audio: bool,
    /// Audio codec name, when `has_audio`.
    pub audio_codec: Option<String>,
    /// Audio channel count, when `has_audio`.
    pub audio_channels: Option<u32>,
    /// Audio sample rate in Hz, when `has_audio`.
    pub audio_sample_rate: Option<u32>,
}

/// Parameters for [`crate::MediaPipeline::convert_video`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConvertOptions {
    /// Target container/format (e.g. `"mp4"`, `"mkv"`, `"webm"`).
    pub output_format: String,
    /// Target video codec; `None` keeps the encoder's default for
    /// `output_format`.
    pub video_codec: Option<String>,
    /// Target audio codec; `None` keeps the encoder's default.
    pub audio_codec: Option<String>,
    /// Target video bitrate in bits per second.
    pub video_bitrate: Option<u64>,
    /// Target audio bitrate in bits per second.
    pub audio_bitrate: Option<u64>,
    /// Clamp the output width, preserving aspect ratio.
    pub max_width: Option<u32>,
    /// Clamp the output height, preserving aspect ratio.
    pub max_height: Option<u32>,
    /// Also write a sibling audio-only file alongside the video output.
    pub extract_audio: bool,
    /// Prefer quality over speed/size (maps to a higher encoder preset).
    pub preserve_quality: bool,
    /// Raw additional encoder flags, appended verbatim after the options
    /// this struct derives.
    pub custom_options: Vec<String>,
}

/// Parameters for [`crate::MediaPipeline::extract_audio`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractAudioOptions {
    /// Target sample rate in Hz.
    pub sample_rate: u32,
    /// Target bit depth.
    pub bit_depth: u16,
    /// Target channel count (`1` = mono).
    pub channels: u16,
    /// Output container/codec (e.g. `"wav"`, `"mp3"`, `"flac"`).
    pub format: String,
}

impl Default for ExtractAudioOptions {
    /// Defaults to 16 kHz/16-bit/mono WAV, the format the transcription
    /// engine requests.
    fn default() -> Self {
        Self { sample_rate: 16_000, bit_depth: 16, channels: 1, format: "wav".to_string() }
    }
}

/// Parameters for [`crate::MediaPipeline::generate_thumbnail`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ThumbnailOptions {
    /// Seek offset in seconds before capturing the frame.
    pub time_offset_secs: f64,
    /// Output image width in pixels; `None` keeps the source width.
    pub width: Option<u32>,
    /// Output image height in pixels; `None` keeps the source height.
    pub height: Option<u32>,
}

impl Default for ThumbnailOptions {
    fn default() -> Self {
        Self { time_offset_secs: 1.0, width: None, height: None }
    }
}

/// Which encoder invocation an [`OperationContext`] tracks; used for
/// labeling progress events and the component-restart table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    /// `analyze_video`/`validate_video_file`.
    Analyze,
    /// `convert_video`.
    Convert,
    /// `extract_audio`.
    ExtractAudio,
    /// `generate_thumbnail`.
    Thumbnail,
}

/// Per-operation bookkeeping tracked in the pipeline's operations map.
/// Lives until the operation completes or is cancelled.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperationContext {
    /// Unique operation identifier.
    pub id: Uuid,
    /// Which encoder invocation this context tracks.
    pub kind: OperationKind,
    /// Source file path.
    pub input_path: PathBuf,
    /// Destination file path; `None` for read-only operations (analyze).
    pub output_path: Option<PathBuf>,
    /// Wall-clock start time.
    pub start_time: DateTime<Utc>,
    /// Total frames expected, once known from the probe.
    pub total_frames: Option<u64>,
    /// Whether `cancel_operation` has flagged this context.
    pub cancelled: bool,
}
