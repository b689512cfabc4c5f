//! Per-call settings and engine-wide tunables.

use std::time::Duration;

/// Caller-supplied knobs for a single transcription call.
#[derive(Debug, Clone)]
pub struct TranscriptionSettings {
    /// Language code, or `None`/`"auto"` for auto-detection.
    pub language: Option<String>,
    /// Preferred model size; `None` defers to `findBestModel`.
    pub model_size: Option<vellum_models::ModelType>,
    /// Emit segment-level start/end timestamps.
    pub enable_timestamps: bool,
    /// Emit per-word confidence scores.
    pub enable_word_confidence: bool,
    /// Reserved: voice-activity-gated segmentation.
    pub enable_vad: bool,
    /// Silence threshold used when `enable_vad` is set.
    pub silence_threshold: f32,
    /// Maximum segment length, in milliseconds, before splitting.
    pub max_segment_length_ms: u64,
    /// Reserved: speaker diarization is not implemented.
    pub enable_diarization: bool,
    /// Apply terminal punctuation during post-processing.
    pub enable_punctuation: bool,
    /// Capitalize sentence starts during post-processing.
    pub enable_capitalization: bool,
    /// Requested rendering for convenience conversion helpers.
    pub output_format: OutputFormat,
    /// Beam width forwarded to the STT wrapper.
    pub beam_size: u32,
    /// Sampling temperature forwarded to the STT wrapper.
    pub temperature: f32,
    /// Request GPU-accelerated inference when available.
    pub enable_gpu: bool,
}

impl Default for TranscriptionSettings {
    fn default() -> Self {
        Self {
            language: None,
            model_size: None,
            enable_timestamps: true,
            enable_word_confidence: false,
            enable_vad: false,
            silence_threshold: 0.01,
            max_segment_length_ms: 30_000,
            enable_diarization: false,
            enable_punctuation: true,
            enable_capitalization: true,
            output_format: OutputFormat::Json,
            beam_size: 5,
            temperature: 0.0,
            enable_gpu: false,
        }
    }
}

/// Output rendering requested for a transcription call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Structured [`vellum_subtitles::TranscriptionResult`] JSON.
    Json,
    /// `SubRip` subtitles.
    Srt,
    /// `WebVTT` subtitles.
    Vtt,
    /// Plain text.
    Txt,
}

/// Engine-wide tunables.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Maximum number of file/video transcription tasks running at once.
    pub max_concurrent_transcriptions: usize,
    /// Soft ceiling on `currentProcessMemory + Σ(perTaskEstimate)`, bytes.
    pub memory_limit_bytes: u64,
    /// Bounded FIFO size for a realtime session's audio buffer, bytes.
    pub realtime_buffer_bytes: usize,
    /// Scheduler tick for realtime segment emission decisions.
    pub realtime_tick: Duration,
    /// Minimum accumulated audio before a realtime segment is emitted.
    pub realtime_emit_threshold: Duration,
    /// Minimum audio when emitting purely because of elapsed time.
    pub realtime_min_emit_audio: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_concurrent_transcriptions: 4,
            memory_limit_bytes: 4 * 1024 * 1024 * 1024,
            realtime_buffer_bytes: 32 * 1024 * 1024,
            realtime_tick: Duration::from_millis(500),
            realtime_emit_threshold: Duration::from_secs(5),
            realtime_min_emit_audio: Duration::from_secs(1),
        }
    }
}
