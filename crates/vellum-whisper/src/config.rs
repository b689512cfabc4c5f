//! Per-call transcription configuration.

/// Controls passed to [`crate::WhisperWrapper::transcribe`].
#[derive(Debug, Clone)]
pub struct TranscribeConfig {
    /// Language code, or `None` for auto-detection.
    pub language: Option<String>,
    /// Emit segment-level start/end timestamps.
    pub enable_timestamps: bool,
    /// Emit per-token timestamps (implies `enable_timestamps`).
    pub enable_token_timestamps: bool,
    /// Sampling temperature.
    pub temperature: f32,
    /// Beam width (0 selects greedy decoding).
    pub beam_size: u32,
    /// Worker threads the native context may use.
    pub n_threads: u32,
    /// Translate non-English audio to English.
    pub enable_translation: bool,
    /// Force the entire input into a single segment.
    pub single_segment: bool,
    /// Ignore prior context when decoding.
    pub no_context: bool,
    /// Prefer splitting segments on word boundaries.
    pub split_on_word: bool,
    /// Opaque bitmask forwarded to the native `print_*` flags for debug
    /// tooling.
    pub print_flags: u32,
}

impl Default for TranscribeConfig {
    fn default() -> Self {
        Self {
            language: None,
            enable_timestamps: true,
            enable_token_timestamps: false,
            temperature: 0.0,
            beam_size: 5,
            n_threads: 4,
            enable_translation: false,
            single_segment: false,
            no_context: false,
            split_on_word: true,
            print_flags: 0,
        }
    }
}
