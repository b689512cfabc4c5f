//! Raw transcription output produced by the native engine.

/// A single recognized segment, in the wrapper's own coordinate space
/// (offsets relative to the start of the samples passed to `transcribe`).
#[derive(Debug, Clone, PartialEq)]
pub struct WhisperSegment {
    /// Start offset, in milliseconds.
    pub start_ms: u64,
    /// End offset, in milliseconds.
    pub end_ms: u64,
    /// Recognized text.
    pub text: String,
    /// `1.0 - no_speech_prob`, used as a confidence proxy.
    pub confidence: f64,
}

/// Full output of one `transcribe`/`transcribe_file` call.
#[derive(Debug, Clone, PartialEq)]
pub struct WhisperTranscription {
    /// Ordered segments.
    pub segments: Vec<WhisperSegment>,
    /// Language used for decoding (requested, or detected when `auto`).
    pub language: String,
    /// Wall-clock inference time, in milliseconds.
    pub processing_time_ms: u64,
}

/// Introspection snapshot returned by [`crate::WhisperWrapper::model_info`].
#[derive(Debug, Clone, PartialEq)]
pub struct ModelInfo {
    /// Path the currently loaded model was loaded from.
    pub path: String,
    /// File size in bytes.
    pub size_bytes: u64,
    /// Approximate resident memory reported by the native context.
    pub memory_bytes: u64,
}
