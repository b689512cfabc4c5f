#![allow(
    non_camel_case_types,
    non_snake_case,
    non_upper_case_globals,
    clippy::all,
    missing_docs
)]
#![allow(unsafe_code)]

//! Raw `extern "C"` bindings to `whisper.cpp`'s public C API.
//!
//! This crate declares the subset of `whisper.h` that [`vellum_whisper`]'s
//! safe wrapper needs. It performs no memory-safety enforcement of its
//! own: every function is `unsafe` and callers must uphold whisper.cpp's
//! own invariants (a context pointer is only valid between
//! `whisper_init_from_file` and `whisper_free`, `whisper_full` is not
//! reentrant for the same context, etc). [`vellum_whisper::WhisperWrapper`]
//! is the crate meant to be used directly; this crate exists only to give
//! it something safe to wrap.

use std::os::raw::{c_char, c_float, c_int, c_void};

/// Opaque whisper inference context.
#[repr(C)]
pub struct whisper_context {
    _private: [u8; 0],
}

/// Opaque per-call whisper state (used by the stateful `_with_state` API;
/// this crate always uses the stateless convenience functions that manage
/// state internally).
#[repr(C)]
pub struct whisper_state {
    _private: [u8; 0],
}

/// Sampling strategy selector for [`whisper_full_params`].
pub type whisper_sampling_strategy = c_int;
/// Greedy decoding.
pub const WHISPER_SAMPLING_GREEDY: whisper_sampling_strategy = 0;
/// Beam search decoding.
pub const WHISPER_SAMPLING_BEAM_SEARCH: whisper_sampling_strategy = 1;

/// Progress callback invoked during `whisper_full`: `(ctx, state, progress_percent, user_data)`.
pub type whisper_progress_callback =
    Option<unsafe extern "C" fn(*mut whisper_context, *mut whisper_state, c_int, *mut c_void)>;

/// New-segment callback invoked as each segment is finalized.
pub type whisper_new_segment_callback = Option<
    unsafe extern "C" fn(*mut whisper_context, *mut whisper_state, c_int, *mut c_void),
>;

/// Abort callback; returning non-zero cancels the in-flight `whisper_full`
/// call at the next checkpoint.
pub type whisper_abort_callback = Option<unsafe extern "C" fn(*mut c_void) -> bool>;

/// Beam search configuration nested in [`whisper_full_params`].
#[repr(C)]
#[derive(Clone, Copy)]
pub struct whisper_full_params_beam_search {
    /// Beam width.
    pub beam_size: c_int,
    /// Patience factor.
    pub patience: c_float,
}

/// Greedy search configuration nested in [`whisper_full_params`].
#[repr(C)]
#[derive(Clone, Copy)]
pub struct whisper_full_params_greedy {
    /// Number of best candidates to keep.
    pub best_of: c_int,
}

/// Parameters for a single `whisper_full` invocation. Field order and
/// layout must track whisper.cpp's `whisper_full_params` exactly since
/// this struct is passed by value across the FFI boundary.
#[repr(C)]
#[derive(Clone, Copy)]
pub struct whisper_full_params {
    /// Decoding strategy.
    pub strategy: whisper_sampling_strategy,
    /// Number of threads to use for inference.
    pub n_threads: c_int,
    /// Maximum number of text context tokens to use.
    pub n_max_text_ctx: c_int,
    /// Start offset in milliseconds.
    pub offset_ms: c_int,
    /// Audio duration to process, in milliseconds (0 = till the end).
    pub duration_ms: c_int,
    /// Translate non-English audio to English.
    pub translate: bool,
    /// Do not use past transcription (if any) as initial prompt for the decoder.
    pub no_context: bool,
    /// Force the entire audio chunk into a single segment.
    pub single_segment: bool,
    /// Emit special tokens (e.g. `<SOT>`) in the output text.
    pub print_special: bool,
    /// Print progress to stderr.
    pub print_progress: bool,
    /// Print results to stderr as they are computed.
    pub print_realtime: bool,
    /// Print timestamps for each text segment when printing realtime.
    pub print_timestamps: bool,
    /// Enable token-level timestamps.
    pub token_timestamps: bool,
    /// Timestamp token probability threshold.
    pub thold_pt: c_float,
    /// Timestamp token sum probability threshold.
    pub thold_ptsum: c_float,
    /// Max segment length in characters.
    pub max_len: c_int,
    /// Split on word rather than on token boundaries.
    pub split_on_word: bool,
    /// Max tokens per segment.
    pub max_tokens: c_int,
    /// Speed up audio by x2 (deprecated upstream; kept for ABI parity).
    pub speed_up: bool,
    /// Overlap audio chunks with a diarization-friendly padding.
    pub debug_mode: bool,
    /// Audio context size override (0 = use default).
    pub audio_ctx: c_int,
    /// Enable tinydiarize speaker-turn detection.
    pub tdrz_enable: bool,
    /// Regex of tokens to suppress, or null.
    pub suppress_regex: *const c_char,
    /// Initial decoding prompt text, or null.
    pub initial_prompt: *const c_char,
    /// Array of token ids to prepend as prompt context, or null.
    pub prompt_tokens: *const c_int,
    /// Length of `prompt_tokens`.
    pub prompt_n_tokens: c_int,
    /// BCP-47-ish language code (e.g. `"en"`), `"auto"`, or null for auto-detect.
    pub language: *const c_char,
    /// Detect the language and return without transcribing.
    pub detect_language: bool,
    /// Suppress blank outputs.
    pub suppress_blank: bool,
    /// Suppress non-speech tokens.
    pub suppress_non_speech_tokens: bool,
    /// Sampling temperature.
    pub temperature: c_float,
    /// Probability threshold below which decoding falls back to a higher temperature.
    pub max_initial_ts: c_float,
    /// Length penalty applied during beam search.
    pub length_penalty: c_float,
    /// Temperature increment applied on fallback.
    pub temperature_inc: c_float,
    /// Entropy threshold below which fallback is triggered.
    pub entropy_thold: c_float,
    /// Log-probability threshold below which fallback is triggered.
    pub logprob_thold: c_float,
    /// No-speech probability threshold.
    pub no_speech_thold: c_float,
    /// Greedy-strategy parameters.
    pub greedy: whisper_full_params_greedy,
    /// Beam-search-strategy parameters.
    pub beam_search: whisper_full_params_beam_search,
    /// Invoked with an integer progress percentage.
    pub progress_callback: whisper_progress_callback,
    /// Opaque pointer forwarded to `progress_callback`.
    pub progress_callback_user_data: *mut c_void,
    /// Invoked once per finalized segment.
    pub new_segment_callback: whisper_new_segment_callback,
    /// Opaque pointer forwarded to `new_segment_callback`.
    pub new_segment_callback_user_data: *mut c_void,
    /// Polled periodically; a `true` return aborts inference.
    pub abort_callback: whisper_abort_callback,
    /// Opaque pointer forwarded to `abort_callback`.
    pub abort_callback_user_data: *mut c_void,
}

unsafe extern "C" {
    /// Load a model from a GGML/GGUF file on disk. Returns null on failure.
    pub fn whisper_init_from_file(path_model: *const c_char) -> *mut whisper_context;

    /// Release all resources associated with a context.
    pub fn whisper_free(ctx: *mut whisper_context);

    /// Default parameters for the given sampling strategy.
    pub fn whisper_full_default_params(
        strategy: whisper_sampling_strategy,
    ) -> whisper_full_params;

    /// Run full transcription over `samples` (mono, 16 kHz, `[-1, 1]` f32 PCM).
    ///
    /// Returns `0` on success, negative on failure.
    pub fn whisper_full(
        ctx: *mut whisper_context,
        params: whisper_full_params,
        samples: *const c_float,
        n_samples: c_int,
    ) -> c_int;

    /// Number of segments produced by the most recent `whisper_full` call.
    pub fn whisper_full_n_segments(ctx: *mut whisper_context) -> c_int;

    /// Text of segment `i_segment`, valid until the next `whisper_full` call.
    pub fn whisper_full_get_segment_text(
        ctx: *mut whisper_context,
        i_segment: c_int,
    ) -> *const c_char;

    /// Start time of segment `i_segment`, in 10ms units.
    pub fn whisper_full_get_segment_t0(ctx: *mut whisper_context, i_segment: c_int) -> i64;

    /// End time of segment `i_segment`, in 10ms units.
    pub fn whisper_full_get_segment_t1(ctx: *mut whisper_context, i_segment: c_int) -> i64;

    /// Average token probability for segment `i_segment`, in `[0, 1]`.
    pub fn whisper_full_get_segment_no_speech_prob(
        ctx: *mut whisper_context,
        i_segment: c_int,
    ) -> c_float;

    /// Compute the mel spectrogram for `samples` and cache it on the
    /// context; a prerequisite for [`whisper_lang_auto_detect`]. Returns
    /// `0` on success.
    pub fn whisper_pcm_to_mel(
        ctx: *mut whisper_context,
        samples: *const c_float,
        n_samples: c_int,
        n_threads: c_int,
    ) -> c_int;

    /// Detect the dominant language from up to 30s of mel-spectrogram
    /// samples already loaded into the context; writes per-language
    /// probabilities into `lang_probs` (must have room for
    /// `whisper_lang_max_id() + 1` entries) and returns the winning
    /// language id.
    pub fn whisper_lang_auto_detect(
        ctx: *mut whisper_context,
        offset_ms: c_int,
        n_threads: c_int,
        lang_probs: *mut c_float,
    ) -> c_int;

    /// Highest valid language id, for sizing `lang_probs` buffers.
    pub fn whisper_lang_max_id() -> c_int;

    /// Short language code (e.g. `"en"`) for a language id.
    pub fn whisper_lang_str(lang_id: c_int) -> *const c_char;

    /// Number of languages whisper.cpp recognizes.
    pub fn whisper_lang_id(lang: *const c_char) -> c_int;

    /// Approximate resident memory, in bytes, used by the loaded model.
    pub fn whisper_model_size(ctx: *mut whisper_context) -> usize;

    /// Library version string (e.g. `"1.6.2"`).
    pub fn whisper_print_system_info() -> *const c_char;
}
