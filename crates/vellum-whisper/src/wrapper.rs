//! The safe façade over [`vellum_whisper_sys`]'s raw bindings.

use std::ffi::{CStr, CString};
use std::os::raw::{c_int, c_void};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::Instant;

use tokio::io::AsyncReadExt;
use tokio::process::Command;
use tracing::{debug, warn};
use vellum_whisper_sys as sys;

use crate::config::TranscribeConfig;
use crate::error::{WhisperError, WhisperResult, MIN_MODEL_SIZE_BYTES};
use crate::model::{ModelInfo, WhisperSegment, WhisperTranscription};

/// A native context pointer. Whisper.cpp permits using a context from any
/// single thread at a time (never two at once); wrapping it here and
/// requiring `Send` but not `Sync` lets the pointer move between threads
/// without ever being accessed from two at the same moment, since every
/// access goes through `WhisperWrapper`'s `Mutex`.
struct RawContext(*mut sys::whisper_context);

// SAFETY: whisper.cpp's context is safe to move across threads as long as
// it is never used from two threads simultaneously, which the wrapping
// `Mutex<Option<RawContext>>` guarantees.
unsafe impl Send for RawContext {}

/// Thin safe wrapper around a native speech-to-text context. Only one model may be loaded at a time; inference is serialized
/// through the same mutex that guards the context pointer, so a second
/// caller blocks until the first call returns rather than racing the
/// native context.
pub struct WhisperWrapper {
    context: Mutex<Option<RawContext>>,
    model_path: Mutex<Option<PathBuf>>,
    cancel_requested: AtomicBool,
}

impl Default for WhisperWrapper {
    fn default() -> Self {
        Self::new()
    }
}

impl WhisperWrapper {
    /// Construct an unloaded wrapper.
    #[must_use]
    pub fn new() -> Self {
        Self {
            context: Mutex::new(None),
            model_path: Mutex::new(None),
            cancel_requested: AtomicBool::new(false),
        }
    }

    /// Prepare the wrapper for use. Present for contract parity with the
    /// original wrapper; this implementation performs no native
    /// allocation until [`WhisperWrapper::load_model`] is called.
    ///
    /// # Errors
    ///
    /// This implementation never fails but returns a `Result` to match
    /// the documented contract and allow future validation.
    pub fn initialize(&self) -> WhisperResult<()> {
        Ok(())
    }

    /// Load a model from `path`, unloading any previously loaded model
    /// first. Rejects files smaller than 1 MiB as
    /// [`WhisperError::InvalidModel`].
    ///
    /// # Errors
    ///
    /// Returns [`WhisperError::InvalidModel`] if the file is missing or
    /// too small, or [`WhisperError::ModelLoadFailed`] if the native
    /// loader rejects the file.
    pub fn load_model(&self, path: impl AsRef<Path>) -> WhisperResult<()> {
        let path = path.as_ref();
        let metadata = std::fs::metadata(path).map_err(|_| WhisperError::InvalidModel)?;
        if metadata.len() < MIN_MODEL_SIZE_BYTES {
            return Err(WhisperError::InvalidModel);
        }
        check_magic_header(path);

        let c_path = CString::new(path.to_string_lossy().as_bytes())
            .map_err(|_| WhisperError::InvalidInput)?;

        let mut guard = self.context.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        if let Some(existing) = guard.take() {
            // SAFETY: `existing` was produced by a prior successful
            // `whisper_init_from_file` call and has not been freed yet.
            unsafe { sys::whisper_free(existing.0) };
        }

        // SAFETY: `c_path` is a valid, nul-terminated C string for the
        // duration of this call.
        let raw = unsafe { sys::whisper_init_from_file(c_path.as_ptr()) };
        if raw.is_null() {
            return Err(WhisperError::ModelLoadFailed);
        }

        *guard = Some(RawContext(raw));
        *self.model_path.lock().unwrap_or_else(std::sync::PoisonError::into_inner) =
            Some(path.to_path_buf());
        Ok(())
    }

    /// Unload the current model, if any. A no-op if no model is loaded.
    ///
    /// # Errors
    ///
    /// This implementation never fails but returns a `Result` to match
    /// the documented contract.
    pub fn unload_model(&self) -> WhisperResult<()> {
        let mut guard = self.context.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        if let Some(existing) = guard.take() {
            // SAFETY: see `load_model`.
            unsafe { sys::whisper_free(existing.0) };
        }
        *self.model_path.lock().unwrap_or_else(std::sync::PoisonError::into_inner) = None;
        Ok(())
    }

    /// Whether a model is currently loaded.
    #[must_use]
    pub fn is_model_loaded(&self) -> bool {
        self.context
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .is_some()
    }

    /// Request cancellation of the in-flight `transcribe`/`transcribe_file`
    /// call, if any. Takes effect at whisper.cpp's next abort checkpoint.
    pub fn request_cancel(&self) {
        self.cancel_requested.store(true, Ordering::SeqCst);
    }

    /// Run inference over `samples` (mono, 16 kHz, `[-1, 1]` f32 PCM).
    /// `progress`, if supplied, is invoked with an integer percentage;
    /// consecutive duplicate values are suppressed before the callback is
    /// invoked.
    ///
    /// # Errors
    ///
    /// Returns [`WhisperError::InitializationFailed`] if no model is
    /// loaded, [`WhisperError::InvalidInput`] for empty input,
    /// [`WhisperError::Cancelled`] if `request_cancel` fired mid-call, or
    /// [`WhisperError::InferenceFailed`] if the native call errors.
    pub fn transcribe(
        &self,
        samples: &[f32],
        config: &TranscribeConfig,
        mut progress: Option<&mut dyn FnMut(u32)>,
    ) -> WhisperResult<WhisperTranscription> {
        if samples.is_empty() {
            return Err(WhisperError::InvalidInput);
        }

        let mut guard = self.context.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        let Some(ctx) = guard.as_mut() else {
            return Err(WhisperError::InitializationFailed);
        };
        self.cancel_requested.store(false, Ordering::SeqCst);

        let started = Instant::now();
        let strategy = if config.beam_size > 0 {
            sys::WHISPER_SAMPLING_BEAM_SEARCH
        } else {
            sys::WHISPER_SAMPLING_GREEDY
        };

        // SAFETY: `strategy` is one of the two defined constants.
        let mut params = unsafe { sys::whisper_full_default_params(strategy) };

        let language_cstring = config
            .language
            .as_deref()
            .filter(|lang| *lang != "auto")
            .map(CString::new)
            .transpose()
            .map_err(|_| WhisperError::InvalidInput)?;
        params.language = language_cstring.as_ref().map_or(std::ptr::null(), |c| c.as_ptr());
        params.detect_language = config.language.as_deref().is_none_or(|lang| lang == "auto");
        params.translate = config.enable_translation;
        params.no_context = config.no_context;
        params.single_segment = config.single_segment;
        params.token_timestamps = config.enable_token_timestamps;
        params.split_on_word = config.split_on_word;
        params.temperature = config.temperature;
        params.n_threads = i32::try_from(config.n_threads).unwrap_or(i32::MAX);
        params.print_progress = false;
        params.print_realtime = false;
        params.print_special = false;
        params.print_timestamps = false;
        if strategy == sys::WHISPER_SAMPLING_BEAM_SEARCH {
            params.beam_search.beam_size = i32::try_from(config.beam_size).unwrap_or(i32::MAX);
        }

        let mut progress_data = ProgressUserData {
            callback: progress.take(),
            last_value: -1,
        };
        params.progress_callback = Some(progress_trampoline);
        params.progress_callback_user_data =
            std::ptr::from_mut(&mut progress_data).cast::<c_void>();

        params.abort_callback = Some(abort_trampoline);
        params.abort_callback_user_data =
            std::ptr::from_ref(&self.cancel_requested).cast_mut().cast::<c_void>();

        let n_samples = i32::try_from(samples.len()).map_err(|_| WhisperError::InvalidInput)?;
        // SAFETY: `ctx.0` is a live context owned by this wrapper, `samples`
        // is a valid slice for the duration of this call, and the
        // callbacks' user-data pointers outlive the call (both are local
        // stack values that are not dropped until after `whisper_full`
        // returns).
        let rc = unsafe { sys::whisper_full(ctx.0, params, samples.as_ptr(), n_samples) };

        if self.cancel_requested.load(Ordering::SeqCst) {
            return Err(WhisperError::Cancelled);
        }
        if rc != 0 {
            return Err(WhisperError::InferenceFailed);
        }

        // SAFETY: inference completed successfully above; segment
        // accessors are valid until the next `whisper_full` call on this
        // context, which cannot happen concurrently since we hold the lock.
        let n_segments = unsafe { sys::whisper_full_n_segments(ctx.0) };
        let mut segments = Vec::with_capacity(usize::try_from(n_segments.max(0)).unwrap_or(0));
        for i in 0..n_segments {
            // SAFETY: `i` is in `0..n_segments`, matching the invariant above.
            let (text, t0, t1, no_speech) = unsafe {
                (
                    ptr_to_string(sys::whisper_full_get_segment_text(ctx.0, i)),
                    sys::whisper_full_get_segment_t0(ctx.0, i),
                    sys::whisper_full_get_segment_t1(ctx.0, i),
                    sys::whisper_full_get_segment_no_speech_prob(ctx.0, i),
                )
            };
            segments.push(WhisperSegment {
                start_ms: u64::try_from(t0.max(0)).unwrap_or(0) * 10,
                end_ms: u64::try_from(t1.max(0)).unwrap_or(0) * 10,
                text,
                confidence: f64::from(1.0 - no_speech),
            });
        }

        let language = config.language.clone().unwrap_or_else(|| "auto".to_string());
        Ok(WhisperTranscription {
            segments,
            language,
            processing_time_ms: u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
        })
    }

    /// Detect the dominant language using at most the first 30 seconds
    /// (16 kHz) of `samples`.
    ///
    /// # Errors
    ///
    /// Returns [`WhisperError::InitializationFailed`] if no model is
    /// loaded, or [`WhisperError::AudioProcessingFailed`]/
    /// [`WhisperError::InferenceFailed`] on native failures.
    pub fn detect_language(&self, samples: &[f32]) -> WhisperResult<String> {
        const SAMPLE_RATE: usize = 16_000;
        const MAX_SECONDS: usize = 30;

        if samples.is_empty() {
            return Err(WhisperError::InvalidInput);
        }
        let window = &samples[..samples.len().min(SAMPLE_RATE * MAX_SECONDS)];

        let mut guard = self.context.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        let Some(ctx) = guard.as_mut() else {
            return Err(WhisperError::InitializationFailed);
        };

        let n_samples = i32::try_from(window.len()).map_err(|_| WhisperError::InvalidInput)?;
        // SAFETY: `ctx.0` is a live context; `window` is a valid slice
        // for the duration of this call.
        let mel_rc = unsafe { sys::whisper_pcm_to_mel(ctx.0, window.as_ptr(), n_samples, 4) };
        if mel_rc != 0 {
            return Err(WhisperError::AudioProcessingFailed);
        }

        // SAFETY: `ctx.0` has a freshly computed mel spectrogram from the
        // call above.
        let max_id = unsafe { sys::whisper_lang_max_id() };
        let mut probs = vec![0.0_f32; usize::try_from(max_id.max(0)).unwrap_or(0) + 1];
        // SAFETY: `probs` has `max_id + 1` entries, matching the
        // documented buffer size requirement.
        let lang_id = unsafe { sys::whisper_lang_auto_detect(ctx.0, 0, 4, probs.as_mut_ptr()) };
        if lang_id < 0 {
            return Err(WhisperError::InferenceFailed);
        }

        // SAFETY: `lang_id` was just returned as valid by the native call.
        let lang_str = unsafe { ptr_to_string(sys::whisper_lang_str(lang_id)) };
        Ok(lang_str)
    }

    /// BCP-47-ish language codes whisper.cpp recognizes.
    #[must_use]
    pub fn supported_languages(&self) -> Vec<String> {
        // SAFETY: `whisper_lang_max_id`/`whisper_lang_str` take no
        // pointers and have no preconditions beyond library initialization,
        // which is a link-time guarantee for this FFI surface.
        unsafe {
            let max_id = sys::whisper_lang_max_id();
            (0..=max_id).map(|id| ptr_to_string(sys::whisper_lang_str(id))).collect()
        }
    }

    /// Snapshot of the currently loaded model, if any.
    #[must_use]
    pub fn model_info(&self) -> Option<ModelInfo> {
        let guard = self.context.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        let ctx = guard.as_ref()?;
        let path = self
            .model_path
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()?;
        let size_bytes = std::fs::metadata(&path).map(|m| m.len()).unwrap_or(0);
        // SAFETY: `ctx.0` is a live context.
        let memory_bytes = unsafe { sys::whisper_model_size(ctx.0) } as u64;
        Some(ModelInfo {
            path: path.to_string_lossy().into_owned(),
            size_bytes,
            memory_bytes,
        })
    }

    /// Approximate resident memory used by the loaded model, in bytes.
    /// Returns `0` when no model is loaded.
    #[must_use]
    pub fn memory_usage(&self) -> u64 {
        self.model_info().map_or(0, |info| info.memory_bytes)
    }

    /// Decode `path` to mono 16 kHz PCM via an external `ffmpeg` process and
    /// transcribe it. The blocking native call runs on the current blocking
    /// thread pool via [`tokio::task::block_in_place`] so it does not stall
    /// the async runtime's worker threads.
    ///
    /// # Errors
    ///
    /// Returns [`WhisperError::AudioProcessingFailed`] if `ffmpeg` cannot be
    /// spawned or exits non-zero, or any error documented on
    /// [`WhisperWrapper::transcribe`].
    pub async fn transcribe_file(
        &self,
        path: impl AsRef<Path>,
        config: &TranscribeConfig,
        mut progress: Option<&mut dyn FnMut(u32)>,
    ) -> WhisperResult<WhisperTranscription> {
        let samples = decode_to_pcm16k(path.as_ref()).await?;
        tokio::task::block_in_place(|| self.transcribe(&samples, config, progress.take()))
    }
}

/// Decode an arbitrary media file to mono 16 kHz `f32` PCM using `ffmpeg`.
async fn decode_to_pcm16k(path: &Path) -> WhisperResult<Vec<f32>> {
    let mut child = Command::new("ffmpeg")
        .arg("-nostdin")
        .arg("-loglevel")
        .arg("error")
        .arg("-i")
        .arg(path)
        .arg("-f")
        .arg("f32le")
        .arg("-ac")
        .arg("1")
        .arg("-ar")
        .arg("16000")
        .arg("-")
        .stdin(std::process::Stdio::null())
        .stdout(std::process::Stdio::piped())
        .stderr(std::process::Stdio::piped())
        .spawn()
        .map_err(|_| WhisperError::AudioProcessingFailed)?;

    let mut stdout = child.stdout.take().ok_or(WhisperError::AudioProcessingFailed)?;
    let mut raw = Vec::new();
    stdout
        .read_to_end(&mut raw)
        .await
        .map_err(|_| WhisperError::AudioProcessingFailed)?;

    let status = child.wait().await.map_err(|_| WhisperError::AudioProcessingFailed)?;
    if !status.success() {
        return Err(WhisperError::AudioProcessingFailed);
    }

    if raw.len() % 4 != 0 {
        return Err(WhisperError::AudioProcessingFailed);
    }
    let samples = raw
        .chunks_exact(4)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect();
    Ok(samples)
}

impl Drop for WhisperWrapper {
    fn drop(&mut self) {
        if let Ok(mut guard) = self.context.lock() {
            if let Some(existing) = guard.take() {
                // SAFETY: dropping the only owner of this context pointer.
                unsafe { sys::whisper_free(existing.0) };
            }
        }
    }
}

struct ProgressUserData<'a> {
    callback: Option<&'a mut dyn FnMut(u32)>,
    last_value: i32,
}

unsafe extern "C" fn progress_trampoline(
    _ctx: *mut sys::whisper_context,
    _state: *mut sys::whisper_state,
    progress: c_int,
    user_data: *mut c_void,
) {
    if user_data.is_null() {
        return;
    }
    // SAFETY: `user_data` was set by `transcribe` to point at a live
    // `ProgressUserData` on its stack for the duration of the call this
    // trampoline is invoked from.
    let data = unsafe { &mut *user_data.cast::<ProgressUserData<'_>>() };
    if progress == data.last_value {
        return;
    }
    data.last_value = progress;
    if let Some(callback) = data.callback.as_mut() {
        callback(u32::try_from(progress.max(0)).unwrap_or(0));
    }
}

unsafe extern "C" fn abort_trampoline(user_data: *mut c_void) -> bool {
    if user_data.is_null() {
        return false;
    }
    // SAFETY: `user_data` was set by `transcribe` to point at the
    // wrapper's `cancel_requested` flag, which outlives the call.
    let flag = unsafe { &*user_data.cast::<AtomicBool>() };
    flag.load(Ordering::SeqCst)
}

/// # Safety
///
/// `ptr` must be either null or point at a valid, nul-terminated C string
/// that remains valid for the duration of this call.
unsafe fn ptr_to_string(ptr: *const std::os::raw::c_char) -> String {
    if ptr.is_null() {
        return String::new();
    }
    // SAFETY: upheld by this function's own precondition.
    unsafe { CStr::from_ptr(ptr) }.to_string_lossy().into_owned()
}

/// Known GGML/GGJT/GGUF magic prefixes. A mismatch is logged but does not
/// block loading, since some valid model variants omit the header.
const KNOWN_MAGIC_PREFIXES: [&[u8]; 3] = [b"ggml", b"ggjt", b"gguf"];

fn check_magic_header(path: &Path) {
    let Ok(bytes) = std::fs::read(path).map(|data| data.into_iter().take(16).collect::<Vec<u8>>())
    else {
        return;
    };
    let recognized = KNOWN_MAGIC_PREFIXES
        .iter()
        .any(|prefix| bytes.len() >= prefix.len() && &bytes[..prefix.len()] == *prefix);
    if recognized {
        debug!(path = %path.display(), "model file has a recognized magic header");
    } else {
        warn!(path = %path.display(), "model file has no recognized magic header; proceeding anyway");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_samples() {
        let wrapper = WhisperWrapper::new();
        let err = wrapper.transcribe(&[], &TranscribeConfig::default(), None).unwrap_err();
        assert_eq!(err, WhisperError::InvalidInput);
    }

    #[test]
    fn transcribe_without_loaded_model_fails() {
        let wrapper = WhisperWrapper::new();
        let err = wrapper
            .transcribe(&[0.0; 16_000], &TranscribeConfig::default(), None)
            .unwrap_err();
        assert_eq!(err, WhisperError::InitializationFailed);
    }

    #[test]
    fn load_model_rejects_small_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tiny.bin");
        std::fs::write(&path, b"too small").unwrap();

        let wrapper = WhisperWrapper::new();
        let err = wrapper.load_model(&path).unwrap_err();
        assert_eq!(err, WhisperError::InvalidModel);
    }

    #[test]
    fn load_model_rejects_missing_files() {
        let wrapper = WhisperWrapper::new();
        let err = wrapper.load_model("/nonexistent/model.bin").unwrap_err();
        assert_eq!(err, WhisperError::InvalidModel);
    }

    #[test]
    fn is_model_loaded_false_initially() {
        let wrapper = WhisperWrapper::new();
        assert!(!wrapper.is_model_loaded());
        assert!(wrapper.model_info().is_none());
        assert_eq!(wrapper.memory_usage(), 0);
    }
}
