//! Bootstraps every engine from a loaded [`vellum_config::AppConfig`] and
//! hands the host application one shared handle per component.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context as _;
use vellum_config::AppConfig;
use vellum_models::{ModelManager, ModelManagerConfig as ModelManagerEngineConfig};
use vellum_storage::Storage;
use vellum_transcription::{EngineConfig, TranscriptionEngine};
use vellum_whisper::WhisperWrapper;

use crate::error::{CliError, CliResult};

/// Every engine the CLI's subcommands dispatch into, constructed once at
/// startup and shared behind `Arc` for the lifetime of the process.
pub(crate) struct AppContext {
    /// Relational persistence for torrents/media/transcriptions/sessions.
    pub(crate) storage: Arc<Storage>,
    /// Model catalogue and download/load orchestration.
    pub(crate) models: Arc<ModelManager>,
    /// The user-facing transcription orchestrator.
    pub(crate) transcription: Arc<TranscriptionEngine>,
}

impl AppContext {
    /// Load configuration from `config_path` (or defaults, if no file is
    /// present), then construct every engine in dependency order: storage,
    /// the STT wrapper, the model manager, and the transcription engine.
    ///
    /// # Errors
    ///
    /// Returns [`CliError::Failure`] if configuration loading, storage
    /// initialization, or STT wrapper initialization fails.
    pub(crate) async fn bootstrap(config_path: Option<&Path>) -> CliResult<Self> {
        let config = match config_path {
            Some(path) => vellum_config::load(path).map_err(CliError::failure)?,
            None => AppConfig::default(),
        };

        let storage = Arc::new(
            Storage::open(&config.storage.database_path)
                .await
                .map_err(CliError::failure)?,
        );

        let whisper = Arc::new(WhisperWrapper::new());
        whisper
            .initialize()
            .context("failed to initialize the speech-to-text engine")
            .map_err(CliError::failure)?;

        let models = ModelManager::initialize(
            ModelManagerEngineConfig {
                models_dir: config.models.models_dir.clone(),
                max_concurrent_downloads: config.models.max_concurrent_downloads,
                download_timeout: Duration::from_secs(config.models.download_timeout_seconds),
                max_retry_attempts: config.models.max_retry_attempts,
                auto_cleanup_enabled: config.models.auto_cleanup_enabled,
                auto_cleanup_interval: Duration::from_secs(config.models.auto_cleanup_interval_seconds),
                unused_eviction: Duration::from_secs(config.models.unused_eviction_days * 24 * 3_600),
            },
            Arc::clone(&whisper),
        )
        .await
        .map_err(CliError::failure)?;

        let transcription = TranscriptionEngine::new(
            EngineConfig {
                max_concurrent_transcriptions: config.transcription.max_concurrent_transcriptions,
                memory_limit_bytes: config.transcription.memory_limit_mb * 1024 * 1024,
                ..EngineConfig::default()
            },
            Arc::clone(&models),
            whisper,
        );

        Ok(Self {
            storage,
            models,
            transcription,
        })
    }
}
