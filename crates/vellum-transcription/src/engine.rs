//! The user-facing transcription orchestrator.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use tracing::warn;
use uuid::Uuid;
use vellum_events::{Channel, Subscription};
use vellum_models::ModelManager;
use vellum_subtitles::{TranscriptionResult as FormattedResult, TranscriptionSegment};
use vellum_whisper::{TranscribeConfig, WhisperWrapper};

use crate::config::{EngineConfig, OutputFormat, TranscriptionSettings};
use crate::error::{TranscriptionError, TranscriptionResult};
use crate::events::TranscriptionEvent;
use crate::media::{extract_audio_to_temp_wav, probe_duration_ms, validate_media_path};
use crate::realtime::RealtimeSession;
use crate::stats::PerformanceStats;

struct TaskHandle {
    cancelled: Arc<AtomicBool>,
}

/// Orchestrates the Model Manager and STT Wrapper into file, video, and
/// streaming transcription.
pub struct TranscriptionEngine {
    config: EngineConfig,
    models: Arc<ModelManager>,
    whisper: Arc<WhisperWrapper>,
    serialize: tokio::sync::Mutex<()>,
    active_tasks: tokio::sync::Mutex<HashMap<Uuid, TaskHandle>>,
    realtime_sessions: tokio::sync::Mutex<HashMap<Uuid, RealtimeSession>>,
    stats: tokio::sync::Mutex<PerformanceStats>,
    cancel_all: Arc<AtomicBool>,
    events: Channel<TranscriptionEvent>,
}

impl TranscriptionEngine {
    /// Build a new engine sharing `models` and `whisper` with whatever
    /// host wired them together.
    #[must_use]
    pub fn new(config: EngineConfig, models: Arc<ModelManager>, whisper: Arc<WhisperWrapper>) -> Arc<Self> {
        Arc::new(Self {
            config,
            models,
            whisper,
            serialize: tokio::sync::Mutex::new(()),
            active_tasks: tokio::sync::Mutex::new(HashMap::new()),
            realtime_sessions: tokio::sync::Mutex::new(HashMap::new()),
            stats: tokio::sync::Mutex::new(PerformanceStats::default()),
            cancel_all: Arc::new(AtomicBool::new(false)),
            events: Channel::new(),
        })
    }

    /// Subscribe to task and session lifecycle events.
    #[must_use]
    pub fn subscribe(&self) -> Subscription<TranscriptionEvent> {
        self.events.subscribe()
    }

    /// Current aggregate performance statistics.
    pub async fn performance_stats(&self) -> PerformanceStats {
        *self.stats.lock().await
    }

    /// Transcribe an audio file end to end.
    ///
    /// # Errors
    ///
    /// Returns [`TranscriptionError::InvalidInput`] for an unrecognized
    /// path, [`TranscriptionError::ModelNotLoaded`] if no model is
    /// loaded, [`TranscriptionError::ResourceExhausted`] under resource
    /// gating, or a mapped wrapper/model error on failure.
    pub async fn transcribe_audio(
        self: &Arc<Self>,
        path: &std::path::Path,
        settings: &TranscriptionSettings,
    ) -> TranscriptionResult<FormattedResult> {
        validate_media_path(path)?;
        self.validate_language(settings)?;
        let audio_duration_ms = probe_duration_ms(path).await.unwrap_or(0);
        self.check_resource_budget(settings, audio_duration_ms).await?;

        let id = Uuid::new_v4();
        let cancelled = Arc::new(AtomicBool::new(false));
        self.active_tasks.lock().await.insert(id, TaskHandle { cancelled: cancelled.clone() });
        let _ = self.events.publish(TranscriptionEvent::TaskStarted { id });

        let result = self.run_transcription(id, path, settings, &cancelled).await;

        self.active_tasks.lock().await.remove(&id);
        match &result {
            Ok(formatted) => {
                let audio_duration_ms = if audio_duration_ms == 0 {
                    Self::audio_span_ms(formatted)
                } else {
                    audio_duration_ms
                };
                self.stats.lock().await.record(formatted.processing_time_ms, audio_duration_ms);
                let _ = self.events.publish(TranscriptionEvent::Completed { id, result: formatted.clone() });
            }
            Err(TranscriptionError::Cancelled) => {
                let _ = self.events.publish(TranscriptionEvent::Cancelled { id });
            }
            Err(error) => {
                let _ = self.events.publish(TranscriptionEvent::Failed { id, error: error.clone() });
            }
        }
        result
    }

    async fn run_transcription(
        self: &Arc<Self>,
        id: Uuid,
        path: &std::path::Path,
        settings: &TranscriptionSettings,
        cancelled: &Arc<AtomicBool>,
    ) -> TranscriptionResult<FormattedResult> {
        let _guard = self.serialize.lock().await;

        if !self.whisper.is_model_loaded() {
            return Err(TranscriptionError::ModelNotLoaded);
        }

        let _ = self.events.publish(TranscriptionEvent::Progress { id, percentage: 0 });

        let config = Self::transcribe_config(settings);
        let mut last_reported = 0_u32;
        let mut progress = |percentage: u32| {
            if percentage != last_reported {
                last_reported = percentage;
                let _ = self.events.publish(TranscriptionEvent::Progress { id, percentage });
            }
        };
        let whisper = Arc::clone(&self.whisper);
        let path_owned = path.to_path_buf();
        let outcome = if cancelled.load(Ordering::SeqCst) {
            Err(TranscriptionError::Cancelled)
        } else {
            whisper
                .transcribe_file(&path_owned, &config, Some(&mut progress))
                .await
                .map_err(TranscriptionError::from)
        };
        drop(_guard);

        let transcription = outcome?;
        let _ = self.events.publish(TranscriptionEvent::Progress { id, percentage: 50 });

        let mut formatted = Self::map_result(transcription, settings);
        formatted.processed_at = chrono::Utc::now();
        formatted.recompute_derived_fields();

        let _ = self.events.publish(TranscriptionEvent::Progress { id, percentage: 100 });
        Ok(formatted)
    }

    /// Extract audio from a video file to a temporary 16 kHz mono WAV,
    /// transcribe it, and remove the temp file whether or not the
    /// transcription succeeds.
    ///
    /// # Errors
    ///
    /// Returns [`TranscriptionError::EncoderFailed`] if extraction fails,
    /// otherwise the same errors as [`Self::transcribe_audio`].
    pub async fn transcribe_from_video(
        self: &Arc<Self>,
        path: &std::path::Path,
        settings: &TranscriptionSettings,
    ) -> TranscriptionResult<FormattedResult> {
        validate_media_path(path)?;
        let wav_path = extract_audio_to_temp_wav(path).await?;
        let result = self.transcribe_audio(&wav_path, settings).await;
        let _ = tokio::fs::remove_file(&wav_path).await;
        result
    }

    /// Detect the dominant language of up to the first 30 seconds of
    /// `path`'s audio.
    ///
    /// # Errors
    ///
    /// Returns [`TranscriptionError::ModelNotLoaded`] if no model is
    /// loaded, or [`TranscriptionError::EncoderFailed`] if decoding
    /// fails.
    pub async fn detect_language(&self, path: &std::path::Path) -> TranscriptionResult<String> {
        validate_media_path(path)?;
        if !self.whisper.is_model_loaded() {
            return Err(TranscriptionError::ModelNotLoaded);
        }
        let wav_path = extract_audio_to_temp_wav(path).await?;
        let samples = crate::microphone::read_wav_as_f32(&wav_path).await?;
        let _ = tokio::fs::remove_file(&wav_path).await;

        let whisper = Arc::clone(&self.whisper);
        tokio::task::spawn_blocking(move || whisper.detect_language(&samples))
            .await
            .map_err(|_| TranscriptionError::ProcessingFailed)?
            .map_err(TranscriptionError::from)
    }

    /// Signal cancellation for every active task and realtime session,
    /// and the native wrapper's in-flight call, if any.
    pub async fn cancel_all_transcriptions(&self) {
        self.cancel_all.store(true, Ordering::SeqCst);
        self.whisper.request_cancel();
        for handle in self.active_tasks.lock().await.values() {
            handle.cancelled.store(true, Ordering::SeqCst);
        }
        for session in self.realtime_sessions.lock().await.values_mut() {
            session.stop();
        }
    }

    /// Signal cancellation for a single task.
    pub async fn cancel_transcription(&self, id: Uuid) {
        if let Some(handle) = self.active_tasks.lock().await.get(&id) {
            handle.cancelled.store(true, Ordering::SeqCst);
        }
    }

    /// Start a streaming session; audio arrives through
    /// [`Self::feed_audio_data`].
    pub async fn start_realtime_transcription(&self, settings: TranscriptionSettings) -> Uuid {
        let id = Uuid::new_v4();
        let session = RealtimeSession::new(id, settings, false, &self.config);
        self.realtime_sessions.lock().await.insert(id, session);
        id
    }

    /// Feed raw 16-bit PCM bytes into an active session, emitting a
    /// segment if the scheduler tick decides the session has accumulated
    /// enough audio.
    ///
    /// # Errors
    ///
    /// Returns [`TranscriptionError::SessionNotFound`] if `id` has no
    /// active session.
    pub async fn feed_audio_data(self: &Arc<Self>, id: Uuid, bytes: &[u8]) -> TranscriptionResult<()> {
        {
            let mut sessions = self.realtime_sessions.lock().await;
            let session = sessions.get_mut(&id).ok_or(TranscriptionError::SessionNotFound)?;
            if !session.is_active {
                return Err(TranscriptionError::SessionNotFound);
            }
            session.feed_audio_data(bytes);
            let _ = self.events.publish(TranscriptionEvent::VolumeLevel { session_id: id, level: session.current_volume });
        }
        self.maybe_emit_realtime_segment(id).await
    }

    async fn maybe_emit_realtime_segment(self: &Arc<Self>, id: Uuid) -> TranscriptionResult<()> {
        if !self.whisper.is_model_loaded() {
            return Ok(());
        }
        let (samples, offset_ms, settings) = {
            let sessions = self.realtime_sessions.lock().await;
            let Some(session) = sessions.get(&id) else { return Ok(()) };
            if !session.is_active || !session.should_emit() {
                return Ok(());
            }
            (session.take_unprocessed_as_f32(), session.pending_offset_ms(), session.settings.clone())
        };
        if samples.is_empty() {
            return Ok(());
        }

        let config = Self::transcribe_config(&settings);
        let whisper = Arc::clone(&self.whisper);
        let transcription = {
            let _guard = self.serialize.lock().await;
            tokio::task::spawn_blocking(move || whisper.transcribe(&samples, &config, None))
                .await
                .map_err(|_| TranscriptionError::ProcessingFailed)?
                .map_err(TranscriptionError::from)?
        };

        {
            let mut sessions = self.realtime_sessions.lock().await;
            if let Some(session) = sessions.get_mut(&id) {
                session.mark_processed();
            }
        }

        for raw in transcription.segments {
            let segment = TranscriptionSegment {
                id: Uuid::new_v4(),
                start_time_ms: raw.start_ms + offset_ms,
                end_time_ms: raw.end_ms + offset_ms,
                text: raw.text,
                confidence: raw.confidence,
                language: Some(transcription.language.clone()),
                is_word_level: false,
                tokens: Vec::new(),
                token_probs: Vec::new(),
                metadata: serde_json::Map::new(),
            };
            let _ = self.events.publish(TranscriptionEvent::RealtimeSegment { session_id: id, segment });
        }
        Ok(())
    }

    /// Stop a realtime or microphone session, removing its buffer.
    pub async fn stop_realtime_transcription(&self, id: Uuid) {
        if let Some(mut session) = self.realtime_sessions.lock().await.remove(&id) {
            session.stop();
        }
        let _ = self.events.publish(TranscriptionEvent::SessionStopped { session_id: id });
    }

    /// Start capturing from the system default microphone and route
    /// samples through [`Self::feed_audio_data`].
    ///
    /// # Errors
    ///
    /// Returns [`TranscriptionError::EncoderFailed`] if no input device
    /// is available or the stream cannot be built.
    pub async fn start_microphone_transcription(
        self: &Arc<Self>,
        settings: TranscriptionSettings,
    ) -> TranscriptionResult<Uuid> {
        let id = self.start_realtime_transcription(settings).await;
        if let Some(session) = self.realtime_sessions.lock().await.get_mut(&id) {
            session.is_microphone_session = true;
        }
        let engine = Arc::clone(self);
        crate::microphone::spawn_capture(id, engine)?;
        Ok(id)
    }

    fn transcribe_config(settings: &TranscriptionSettings) -> TranscribeConfig {
        TranscribeConfig {
            language: settings.language.clone().filter(|lang| lang != "auto"),
            enable_timestamps: settings.enable_timestamps,
            enable_token_timestamps: settings.enable_word_confidence,
            temperature: settings.temperature,
            beam_size: settings.beam_size,
            n_threads: 4,
            enable_translation: false,
            single_segment: false,
            no_context: false,
            split_on_word: true,
            print_flags: 0,
        }
    }

    fn map_result(transcription: vellum_whisper::WhisperTranscription, settings: &TranscriptionSettings) -> FormattedResult {
        let segments: Vec<TranscriptionSegment> = transcription
            .segments
            .into_iter()
            .map(|segment| TranscriptionSegment {
                id: Uuid::new_v4(),
                start_time_ms: segment.start_ms,
                end_time_ms: segment.end_ms,
                text: segment.text,
                confidence: segment.confidence,
                language: Some(transcription.language.clone()),
                is_word_level: false,
                tokens: Vec::new(),
                token_probs: Vec::new(),
                metadata: serde_json::Map::new(),
            })
            .collect();

        FormattedResult {
            language: settings.language.clone().unwrap_or_else(|| "auto".to_string()),
            detected_language: Some(transcription.language),
            segments,
            full_text: String::new(),
            avg_confidence: 0.0,
            processing_time_ms: transcription.processing_time_ms,
            model_used: "unknown".to_string(),
            processed_at: chrono::Utc::now(),
            metadata: serde_json::Map::new(),
        }
    }

    /// Fallback audio duration when `ffprobe` could not be run: the span
    /// from the first segment's start to the last segment's end.
    fn audio_span_ms(result: &FormattedResult) -> u64 {
        result.segments.last().map_or(0, |segment| segment.end_time_ms)
    }

    fn validate_language(&self, settings: &TranscriptionSettings) -> TranscriptionResult<()> {
        let Some(language) = settings.language.as_deref() else { return Ok(()) };
        if language == "auto" {
            return Ok(());
        }
        let supported = self.whisper.supported_languages();
        if supported.iter().any(|candidate| candidate == language) {
            Ok(())
        } else {
            Err(TranscriptionError::UnsupportedLanguage)
        }
    }

    async fn check_resource_budget(
        &self,
        settings: &TranscriptionSettings,
        audio_duration_ms: u64,
    ) -> TranscriptionResult<()> {
        let active = self.active_tasks.lock().await.len();
        if active >= self.config.max_concurrent_transcriptions {
            return Err(TranscriptionError::ResourceExhausted);
        }

        const BYTES_PER_AUDIO_SECOND: u64 = 1024 * 1024;
        let model_memory_factor: u64 = if settings.enable_gpu { 3 } else { 2 };
        let model_bytes = self
            .models
            .find_best_model(settings.language.as_deref())
            .await
            .and_then(|model| model.file_size)
            .unwrap_or(0);
        let audio_seconds = audio_duration_ms / 1000;
        let per_task_estimate = model_memory_factor * model_bytes + BYTES_PER_AUDIO_SECOND * audio_seconds;
        let projected = current_process_memory() + per_task_estimate;
        if projected > self.config.memory_limit_bytes {
            warn!(projected, limit = self.config.memory_limit_bytes, "rejecting transcription task: memory budget exceeded");
            return Err(TranscriptionError::ResourceExhausted);
        }
        Ok(())
    }

    /// Convenience wrapper rendering a result as SRT.
    ///
    /// # Errors
    ///
    /// Returns [`TranscriptionError::FormatError`] if `result` fails
    /// validation.
    pub fn convert_to_srt(result: &FormattedResult) -> TranscriptionResult<String> {
        vellum_subtitles::validate_result(result)?;
        Ok(vellum_subtitles::to_srt(result))
    }

    /// Convenience wrapper rendering a result as VTT.
    ///
    /// # Errors
    ///
    /// Returns [`TranscriptionError::FormatError`] if `result` fails
    /// validation.
    pub fn convert_to_vtt(result: &FormattedResult) -> TranscriptionResult<String> {
        vellum_subtitles::validate_result(result)?;
        Ok(vellum_subtitles::to_vtt(result, &vellum_subtitles::formats::vtt::VttOptions::default()))
    }

    /// Convenience wrapper rendering a result as plain text.
    ///
    /// # Errors
    ///
    /// Returns [`TranscriptionError::FormatError`] if `result` fails
    /// validation.
    pub fn convert_to_plain_text(result: &FormattedResult) -> TranscriptionResult<String> {
        vellum_subtitles::validate_result(result)?;
        Ok(vellum_subtitles::to_txt(result, &vellum_subtitles::formats::txt::TxtOptions::default()))
    }

    /// Render `result` per its own `output_format` choice.
    ///
    /// # Errors
    ///
    /// Returns [`TranscriptionError::FormatError`] if `result` fails
    /// validation, or propagates JSON serialization failure.
    pub fn convert_result(result: &FormattedResult, format: OutputFormat) -> TranscriptionResult<String> {
        match format {
            OutputFormat::Srt => Self::convert_to_srt(result),
            OutputFormat::Vtt => Self::convert_to_vtt(result),
            OutputFormat::Txt => Self::convert_to_plain_text(result),
            OutputFormat::Json => vellum_subtitles::to_json_string(result).map_err(TranscriptionError::from),
        }
    }
}

fn current_process_memory() -> u64 {
    let mut system = sysinfo::System::new();
    let pid = sysinfo::Pid::from_u32(std::process::id());
    system.refresh_processes(sysinfo::ProcessesToUpdate::Some(&[pid]), true);
    system.process(pid).map_or(0, sysinfo::Process::memory)
}
