//! The media pipeline itself: analyze/convert/extract-audio/thumbnail
//! with bounded concurrency, hardware-acceleration negotiation, progress
//! reporting, and cancellation.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::{Mutex, Semaphore};
use tokio_util::sync::CancellationToken;
use tracing::warn;
use uuid::Uuid;
use vellum_events::{Channel, Subscription};

use crate::config::PipelineConfig;
use crate::encoder;
use crate::error::{MediaError, MediaResult};
use crate::events::MediaEvent;
use crate::hwaccel::{FfmpegHardwareAccelerator, HardwareAccelerator};
use crate::model::{ConvertOptions, ExtractAudioOptions, OperationContext, OperationKind, ThumbnailOptions, VideoAnalysis};

struct TrackedOperation {
    cancel: CancellationToken,
    context: Mutex<OperationContext>,
}

/// Analyze/convert/extract-audio/thumbnail over an external `ffmpeg`/
/// `ffprobe` collaborator, bounded by `max_concurrent_operations`.
pub struct MediaPipeline {
    config: PipelineConfig,
    hwaccel: Arc<dyn HardwareAccelerator>,
    semaphore: Arc<Semaphore>,
    operations: Mutex<HashMap<Uuid, Arc<TrackedOperation>>>,
    events: Channel<MediaEvent>,
}

impl MediaPipeline {
    /// Construct a pipeline with a pre-probed hardware accelerator.
    #[must_use]
    pub fn new(config: PipelineConfig, hwaccel: Arc<dyn HardwareAccelerator>) -> Arc<Self> {
        Arc::new(Self {
            semaphore: Arc::new(Semaphore::new(config.max_concurrent_operations)),
            operations: Mutex::new(HashMap::new()),
            events: Channel::new(),
            config,
            hwaccel,
        })
    }

    /// Construct a pipeline, probing `ffmpeg -hwaccels` for the
    /// accelerator.
    pub async fn with_probed_hwaccel(config: PipelineConfig) -> Arc<Self> {
        let hwaccel = Arc::new(FfmpegHardwareAccelerator::probe().await);
        Self::new(config, hwaccel)
    }

    /// Subscribe to operation lifecycle events.
    #[must_use]
    pub fn subscribe(&self) -> Subscription<MediaEvent> {
        self.events.subscribe()
    }

    /// Analyze `path` via `ffprobe`.
    ///
    /// # Errors
    ///
    /// Returns [`MediaError::InvalidFile`] if the path is not a readable,
    /// probeable media file.
    pub async fn analyze_video(&self, path: impl AsRef<Path>) -> MediaResult<VideoAnalysis> {
        encoder::probe_video(path.as_ref()).await
    }

    /// Validate that `path` is a file `ffprobe` can analyze, without
    /// returning the analysis.
    ///
    /// # Errors
    ///
    /// See [`Self::analyze_video`].
    pub async fn validate_video_file(&self, path: impl AsRef<Path>) -> MediaResult<()> {
        self.analyze_video(path).await.map(|_| ())
    }

    /// Convert `input` to `output` per `options`, negotiating hardware
    /// acceleration when the caller's codec choice supports it and
    /// falling back to software on an encoder-reported initialization
    /// failure.
    ///
    /// # Errors
    ///
    /// Returns [`MediaError::ResourceExhausted`] if admission is gated by
    /// the concurrency or memory caps, [`MediaError::Cancelled`] if
    /// [`Self::cancel_operation`] fires mid-transfer, or
    /// [`MediaError::ProcessingFailed`] on an encoder failure.
    pub async fn convert_video(
        &self,
        input: impl AsRef<Path>,
        output: impl AsRef<Path>,
        options: ConvertOptions,
    ) -> MediaResult<PathBuf> {
        let input = input.as_ref().to_path_buf();
        let output = output.as_ref().to_path_buf();

        let total_frames = self
            .analyze_video(&input)
            .await
            .ok()
            .map(|analysis| (analysis.duration_ms as f64 / 1_000.0 * analysis.frame_rate).round() as u64);

        let (id, tracked, _permit) =
            self.admit(OperationKind::Convert, input.clone(), Some(output.clone()), total_frames).await?;

        let mut args = encoder::build_convert_args(&input, &output, &options);
        if let Some(codec) = &options.video_codec {
            if self.hwaccel.supports_codec(codec) {
                if let Some(accel) = self.hwaccel.available().first() {
                    args.splice(0..0, ["-hwaccel".to_string(), accel.clone()]);
                }
            }
        }

        let result = self.run_tracked(id, &tracked, &output, &args, total_frames).await;
        if let Err(MediaError::ProcessingFailed) = result {
            if args.iter().any(|a| a == "-hwaccel") {
                warn!(?input, "hardware-accelerated encode failed to initialize; retrying in software");
                let software_args = encoder::build_convert_args(&input, &output, &options);
                let retried = self.run_tracked(id, &tracked, &output, &software_args, total_frames).await;
                return self.finish(id, &output, retried).await;
            }
        }
        self.finish(id, &output, result).await
    }

    /// Extract audio from `input` into `output` per `options`, defaulting
    /// to 16 kHz/16-bit/mono WAV.
    ///
    /// # Errors
    ///
    /// See [`Self::convert_video`].
    pub async fn extract_audio(
        &self,
        input: impl AsRef<Path>,
        output: impl AsRef<Path>,
        options: ExtractAudioOptions,
    ) -> MediaResult<PathBuf> {
        let input = input.as_ref().to_path_buf();
        let output = output.as_ref().to_path_buf();
        let (id, tracked, _permit) =
            self.admit(OperationKind::ExtractAudio, input.clone(), Some(output.clone()), None).await?;

        let _ = self.events.publish(MediaEvent::OperationStarted { id });
        let result = encoder::run_extract_audio(&input, &output, &options, &tracked.cancel).await;
        self.finish(id, &output, result).await
    }

    /// Seek to `options.time_offset_secs` and write a single frame to
    /// `output`.
    ///
    /// # Errors
    ///
    /// See [`Self::convert_video`].
    pub async fn generate_thumbnail(
        &self,
        input: impl AsRef<Path>,
        output: impl AsRef<Path>,
        options: ThumbnailOptions,
    ) -> MediaResult<PathBuf> {
        let input = input.as_ref().to_path_buf();
        let output = output.as_ref().to_path_buf();
        let (id, _tracked, _permit) =
            self.admit(OperationKind::Thumbnail, input.clone(), Some(output.clone()), None).await?;

        let _ = self.events.publish(MediaEvent::OperationStarted { id });
        let result = encoder::run_thumbnail(&input, &output, &options).await;
        self.finish(id, &output, result).await
    }

    /// Flip the cancelled flag on `id`'s context and signal its encoder
    /// subprocess to terminate. No-op if `id` is not currently tracked.
    pub async fn cancel_operation(&self, id: Uuid) {
        if let Some(tracked) = self.operations.lock().await.get(&id) {
            tracked.context.lock().await.cancelled = true;
            tracked.cancel.cancel();
        }
    }

    /// Cancel every currently tracked operation.
    pub async fn cancel_all_operations(&self) {
        for tracked in self.operations.lock().await.values() {
            tracked.context.lock().await.cancelled = true;
            tracked.cancel.cancel();
        }
    }

    /// Snapshot of all currently tracked operations.
    pub async fn active_operations(&self) -> Vec<OperationContext> {
        let operations = self.operations.lock().await;
        let mut contexts = Vec::with_capacity(operations.len());
        for tracked in operations.values() {
            contexts.push(tracked.context.lock().await.clone());
        }
        contexts
    }

    async fn admit(
        &self,
        kind: OperationKind,
        input_path: PathBuf,
        output_path: Option<PathBuf>,
        total_frames: Option<u64>,
    ) -> MediaResult<(Uuid, Arc<TrackedOperation>, tokio::sync::OwnedSemaphorePermit)> {
        let projected = current_process_memory();
        if projected > self.config.memory_limit_bytes {
            warn!(
                projected,
                limit = self.config.memory_limit_bytes,
                "rejecting media operation: memory budget exceeded"
            );
            return Err(MediaError::ResourceExhausted);
        }

        let permit = Arc::clone(&self.semaphore)
            .acquire_owned()
            .await
            .map_err(|_| MediaError::ResourceExhausted)?;

        let id = Uuid::new_v4();
        let context = OperationContext {
            id,
            kind,
            input_path,
            output_path,
            start_time: Utc::now(),
            total_frames,
            cancelled: false,
        };
        let tracked = Arc::new(TrackedOperation {
            cancel: CancellationToken::new(),
            context: Mutex::new(context),
        });
        self.operations.lock().await.insert(id, tracked.clone());
        Ok((id, tracked, permit))
    }

    async fn run_tracked(
        &self,
        id: Uuid,
        tracked: &TrackedOperation,
        output: &Path,
        args: &[String],
        total_frames: Option<u64>,
    ) -> MediaResult<()> {
        let _ = self.events.publish(MediaEvent::OperationStarted { id });
        let events = self.events.clone();
        encoder::run_ffmpeg(args, total_frames, &tracked.cancel, move |progress| {
            let _ = events.publish(MediaEvent::Progress { id, progress });
        })
        .await
        .inspect_err(|_| {
            let _ = std::fs::remove_file(output);
        })
    }

    async fn finish(&self, id: Uuid, output: &Path, result: MediaResult<()>) -> MediaResult<PathBuf> {
        self.operations.lock().await.remove(&id);
        match result {
            Ok(()) => {
                let _ = self.events.publish(MediaEvent::Completed {
                    id,
                    output_path: output.to_string_lossy().into_owned(),
                });
                Ok(output.to_path_buf())
            }
            Err(MediaError::Cancelled) => {
                let _ = tokio::fs::remove_file(output).await;
                let _ = self.events.publish(MediaEvent::Cancelled { id });
                Err(MediaError::Cancelled)
            }
            Err(error) => {
                let _ = tokio::fs::remove_file(output).await;
                let _ = self.events.publish(MediaEvent::Failed { id, error: error.clone() });
                Err(error)
            }
        }
    }
}

/// Process RSS in bytes, via `sysinfo`; `0` (never gates) if the platform
/// query fails.
fn current_process_memory() -> u64 {
    let mut system = sysinfo::System::new();
    let pid = sysinfo::Pid::from_u32(std::process::id());
    system.refresh_processes(sysinfo::ProcessesToUpdate::Some(&[pid]), true);
    system.process(pid).map_or(0, sysinfo::Process::memory)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn analyze_video_rejects_missing_file() {
        let pipeline = MediaPipeline::new(PipelineConfig::default(), Arc::new(FfmpegHardwareAccelerator::default()));
        let result = pipeline.analyze_video("/nonexistent/clip.mov").await;
        assert_eq!(result, Err(MediaError::InvalidFile));
    }

    #[tokio::test]
    async fn cancel_operation_on_unknown_id_is_noop() {
        let pipeline = MediaPipeline::new(PipelineConfig::default(), Arc::new(FfmpegHardwareAccelerator::default()));
        pipeline.cancel_operation(Uuid::new_v4()).await;
        assert!(pipeline.active_operations().await.is_empty());
    }

    #[tokio::test]
    async fn admission_rejects_when_memory_budget_exceeded() {
        let pipeline = MediaPipeline::new(
            PipelineConfig { memory_limit_bytes: 1, ..PipelineConfig::default() },
            Arc::new(FfmpegHardwareAccelerator::default()),
        );
        let result = pipeline
            .extract_audio("/nonexistent/clip.mov", "/tmp/out.wav", ExtractAudioOptions::default())
            .await;
        assert_eq!(result, Err(MediaError::ResourceExhausted));
    }
}
