//! The model manager itself: a persisted catalogue plus download-and-load
//! orchestration delegating to the Download Manager and the STT Wrapper.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::{Mutex, Semaphore};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use vellum_download::{DownloadManager, DownloadManagerConfig};
use vellum_events::{Channel, Subscription};
use vellum_whisper::WhisperWrapper;

use crate::catalogue::{local_path_for, ModelCatalogue};
use crate::config::ModelManagerConfig;
use crate::error::{ModelError, ModelResult};
use crate::events::ModelEvent;
use crate::model::{ModelInfo, ModelStatus, ModelType};

/// Minimum size a model file must reach to be considered valid.
pub const MIN_MODEL_SIZE_BYTES: u64 = 1024 * 1024;

const KNOWN_MAGIC_PREFIXES: [&[u8]; 3] = [b"ggml", b"ggjt", b"gguf"];

/// Owns the model catalogue, the download queue, and the single
/// currently-loaded model slot.
pub struct ModelManager {
    config: ModelManagerConfig,
    models_dir: PathBuf,
    whisper: Arc<WhisperWrapper>,
    download_manager: DownloadManager,
    download_semaphore: Arc<Semaphore>,
    catalogue: Mutex<ModelCatalogue>,
    in_flight: Mutex<HashMap<String, CancellationToken>>,
    loaded_id: Mutex<Option<String>>,
    events: Channel<ModelEvent>,
}

impl ModelManager {
    /// Load (or seed) the catalogue at `config.models_dir` and return a
    /// ready manager. If `config.auto_cleanup_enabled`, also spawns the
    /// periodic eviction sweep.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::InitializationFailed`] if the models
    /// directory cannot be created or the catalogue file is corrupt.
    pub async fn initialize(
        config: ModelManagerConfig,
        whisper: Arc<WhisperWrapper>,
    ) -> ModelResult<Arc<Self>> {
        let models_dir = PathBuf::from(&config.models_dir);
        let catalogue = ModelCatalogue::load(&models_dir).await?;

        let download_manager = DownloadManager::new(DownloadManagerConfig {
            max_concurrent_downloads: config.max_concurrent_downloads,
            timeout: config.download_timeout,
            max_retries: config.max_retry_attempts,
            ..DownloadManagerConfig::default()
        });

        let manager = Arc::new(Self {
            download_semaphore: Arc::new(Semaphore::new(config.max_concurrent_downloads)),
            catalogue: Mutex::new(catalogue),
            in_flight: Mutex::new(HashMap::new()),
            loaded_id: Mutex::new(None),
            events: Channel::new(),
            download_manager,
            models_dir,
            whisper,
            config,
        });

        if manager.config.auto_cleanup_enabled {
            let weak = Arc::downgrade(&manager);
            let interval = manager.config.auto_cleanup_interval;
            tokio::spawn(async move {
                let mut ticker = tokio::time::interval(interval);
                ticker.tick().await; // first tick fires immediately; skip it
                loop {
                    ticker.tick().await;
                    let Some(manager) = weak.upgrade() else { break };
                    manager.run_eviction_sweep().await;
                }
            });
        }

        Ok(manager)
    }

    /// Subscribe to catalogue/download/load lifecycle events.
    #[must_use]
    pub fn subscribe(&self) -> Subscription<ModelEvent> {
        self.events.subscribe()
    }

    /// Every known model: default catalogue, discovered files, and
    /// user-imported entries.
    pub async fn available_models(&self) -> Vec<ModelInfo> {
        self.catalogue.lock().await.all()
    }

    /// Models whose status is `Downloaded` or `Loaded`.
    pub async fn downloaded_models(&self) -> Vec<ModelInfo> {
        self.catalogue.lock().await.downloaded()
    }

    /// First catalogue entry of `model_type`, optionally filtered by
    /// `language`.
    pub async fn find_model(&self, model_type: ModelType, language: Option<&str>) -> Option<ModelInfo> {
        self.catalogue.lock().await.find_model(model_type, language).cloned()
    }

    /// Highest-priority downloaded model.
    pub async fn find_best_model(&self, language: Option<&str>) -> Option<ModelInfo> {
        self.catalogue.lock().await.find_best_model(language).cloned()
    }

    /// Rescan the models directory and reconcile catalogue status against
    /// what is actually present on disk.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::DiskError`] if the catalogue cannot be
    /// re-persisted.
    pub async fn refresh_model_list(&self) -> ModelResult<()> {
        let mut catalogue = self.catalogue.lock().await;
        catalogue.refresh(&self.models_dir).await;
        catalogue.save(&self.models_dir).await
    }

    /// Download the file for `id`, bounded by `max_concurrent_downloads`;
    /// excess callers queue on the semaphore FIFO.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::ModelNotFound`] if `id` is not catalogued,
    /// [`ModelError::ModelNotAvailable`] if it has no `download_url`, or a
    /// mapped [`vellum_download::DownloadError`] on transfer failure.
    pub async fn download_model(&self, id: &str) -> ModelResult<()> {
        let (url, checksum) = {
            let catalogue = self.catalogue.lock().await;
            let entry = catalogue.get(id).ok_or(ModelError::ModelNotFound)?;
            let url = entry.download_url.clone().ok_or(ModelError::ModelNotAvailable)?;
            (url, entry.checksum.clone())
        };

        self.set_status(id, ModelStatus::Downloading).await;
        let _ = self.events.publish(ModelEvent::DownloadStarted { id: id.to_string() });

        let token = CancellationToken::new();
        self.in_flight.lock().await.insert(id.to_string(), token.clone());

        let _permit = self.download_semaphore.acquire().await.expect("semaphore closed");
        let local_path = local_path_for(&self.models_dir, id);

        let result = tokio::select! {
            result = self.download_manager.download_file(&url, &local_path, checksum.as_deref(), true) => {
                result.map_err(ModelError::from)
            }
            () = token.cancelled() => Err(ModelError::DownloadFailed),
        };
        self.in_flight.lock().await.remove(id);

        match result {
            Ok(_) => {
                drop(_permit);
                match self.validate_model(id).await {
                    Ok(()) => {
                        self.set_status(id, ModelStatus::Downloaded).await;
                        let mut catalogue = self.catalogue.lock().await;
                        if let Some(entry) = catalogue.get_mut(id) {
                            entry.file_path = Some(local_path.to_string_lossy().into_owned());
                            entry.file_size = tokio::fs::metadata(&local_path).await.ok().map(|m| m.len());
                            entry.download_progress = 100.0;
                        }
                        catalogue.save(&self.models_dir).await?;
                        drop(catalogue);
                        let _ = self.events.publish(ModelEvent::DownloadCompleted { id: id.to_string() });
                        Ok(())
                    }
                    Err(error) => {
                        self.set_status(id, ModelStatus::Corrupted).await;
                        let _ = self.events.publish(ModelEvent::DownloadFailed {
                            id: id.to_string(),
                            error: error.clone(),
                        });
                        Err(error)
                    }
                }
            }
            Err(ModelError::DownloadFailed) if token.is_cancelled() => {
                self.set_status(id, ModelStatus::NotDownloaded).await;
                let _ = self.events.publish(ModelEvent::DownloadCancelled { id: id.to_string() });
                Err(ModelError::DownloadFailed)
            }
            Err(error) => {
                self.set_status(id, ModelStatus::Failed).await;
                let _ = self.events.publish(ModelEvent::DownloadFailed {
                    id: id.to_string(),
                    error: error.clone(),
                });
                Err(error)
            }
        }
    }

    /// Cancel an in-flight download for `id`. No-op if `id` has no
    /// tracked download.
    pub async fn cancel_download(&self, id: &str) {
        if let Some(token) = self.in_flight.lock().await.get(id) {
            token.cancel();
        }
    }

    /// Read the first 16 bytes of `id`'s local file and check for known
    /// `ggml`/`ggjt`/`gguf` magic prefixes; a mismatch is logged but does
    /// not fail the call.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::ModelNotAvailable`] if `id` has no local
    /// file, or [`ModelError::CorruptedModel`] if the file is smaller than
    /// [`MIN_MODEL_SIZE_BYTES`].
    pub async fn validate_model(&self, id: &str) -> ModelResult<()> {
        let path = {
            let catalogue = self.catalogue.lock().await;
            let entry = catalogue.get(id).ok_or(ModelError::ModelNotFound)?;
            entry
                .file_path
                .clone()
                .unwrap_or_else(|| local_path_for(&self.models_dir, id).to_string_lossy().into_owned())
        };

        let metadata = tokio::fs::metadata(&path).await.map_err(|_| ModelError::ModelNotAvailable)?;
        if metadata.len() < MIN_MODEL_SIZE_BYTES {
            return Err(ModelError::CorruptedModel);
        }

        let header = tokio::fs::read(&path).await.map_err(|_| ModelError::CorruptedModel)?;
        let recognized = KNOWN_MAGIC_PREFIXES
            .iter()
            .any(|prefix| header.len() >= prefix.len() && &header[..prefix.len()] == *prefix);
        if recognized {
            info!(id, "model file has a recognized magic header");
        } else {
            warn!(id, "model file has no recognized magic header; proceeding anyway");
        }
        Ok(())
    }

    /// Download (if absent), validate, and load `id` into the STT
    /// Wrapper, unloading any previously loaded model first.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::CorruptedModel`]/[`ModelError::DownloadFailed`]
    /// per the sequence's validation steps, or [`ModelError::LoadingFailed`]
    /// if the STT Wrapper rejects the file.
    pub async fn load_model(&self, id: &str) -> ModelResult<()> {
        let has_file = {
            let catalogue = self.catalogue.lock().await;
            let entry = catalogue.get(id).ok_or(ModelError::ModelNotFound)?;
            entry.file_path.is_some() && matches!(entry.status, ModelStatus::Downloaded | ModelStatus::Loaded)
        };
        if !has_file {
            self.download_model(id).await?;
        } else {
            self.validate_model(id).await?;
        }

        if let Some(previous) = self.loaded_id.lock().await.clone() {
            if previous != id {
                self.unload_model(&previous).await?;
            }
        }

        self.set_status(id, ModelStatus::Loading).await;
        let path = {
            let catalogue = self.catalogue.lock().await;
            catalogue.get(id).and_then(|entry| entry.file_path.clone()).ok_or(ModelError::ModelNotFound)?
        };

        let whisper = Arc::clone(&self.whisper);
        let load_path = path.clone();
        tokio::task::spawn_blocking(move || whisper.load_model(load_path))
            .await
            .map_err(|_| ModelError::LoadingFailed)?
            .map_err(ModelError::from)?;

        self.set_status(id, ModelStatus::Loaded).await;
        *self.loaded_id.lock().await = Some(id.to_string());
        {
            let mut catalogue = self.catalogue.lock().await;
            if let Some(entry) = catalogue.get_mut(id) {
                entry.last_used = Some(Utc::now());
            }
            catalogue.save(&self.models_dir).await?;
        }
        let _ = self.events.publish(ModelEvent::ModelLoaded { id: id.to_string() });
        Ok(())
    }

    /// Unload `id`. A no-op (beyond bookkeeping) unless `id` is currently
    /// the loaded model.
    ///
    /// # Errors
    ///
    /// Returns a mapped [`vellum_whisper::WhisperError`] if the native
    /// unload fails.
    pub async fn unload_model(&self, id: &str) -> ModelResult<()> {
        let mut loaded = self.loaded_id.lock().await;
        if loaded.as_deref() != Some(id) {
            return Ok(());
        }
        self.whisper.unload_model().map_err(ModelError::from)?;
        self.set_status(id, ModelStatus::Downloaded).await;
        *loaded = None;
        let _ = self.events.publish(ModelEvent::ModelUnloaded { id: id.to_string() });
        Ok(())
    }

    /// Remove `id`'s local file and catalogue entry for any catalogue
    /// entry that carries a `download_url` (built-in models are never
    /// deleted from the catalogue, only their local file).
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::ModelNotFound`] if `id` is not catalogued, or
    /// a disk error if the file cannot be removed.
    pub async fn delete_model(&self, id: &str) -> ModelResult<()> {
        if self.loaded_id.lock().await.as_deref() == Some(id) {
            self.unload_model(id).await?;
        }
        let path = {
            let catalogue = self.catalogue.lock().await;
            let entry = catalogue.get(id).ok_or(ModelError::ModelNotFound)?;
            entry.file_path.clone()
        };
        if let Some(path) = path {
            let _ = tokio::fs::remove_file(&path).await;
        }
        {
            let mut catalogue = self.catalogue.lock().await;
            if let Some(entry) = catalogue.get_mut(id) {
                entry.file_path = None;
                entry.file_size = None;
                entry.status = ModelStatus::NotDownloaded;
                entry.download_progress = 0.0;
            }
            catalogue.save(&self.models_dir).await?;
        }
        let _ = self.events.publish(ModelEvent::ModelEvicted { id: id.to_string(), reason: "deleted" });
        Ok(())
    }

    async fn set_status(&self, id: &str, status: ModelStatus) {
        let mut catalogue = self.catalogue.lock().await;
        if let Some(entry) = catalogue.get_mut(id) {
            entry.status = status;
        }
    }

    /// Remove `Failed`/`Corrupted` entries and entries `Downloaded` but
    /// unused for longer than `unused_eviction`, provided the catalogue
    /// retains at least one model and the candidate is not the currently
    /// loaded one.
    async fn run_eviction_sweep(&self) {
        let loaded = self.loaded_id.lock().await.clone();
        let mut catalogue = self.catalogue.lock().await;
        let total = catalogue.all().len();
        if total <= 1 {
            return;
        }

        let now = Utc::now();
        let mut to_evict = Vec::new();
        for entry in catalogue.all() {
            if loaded.as_deref() == Some(entry.id.as_str()) {
                continue;
            }
            let reason = if matches!(entry.status, ModelStatus::Failed) {
                Some("failed")
            } else if matches!(entry.status, ModelStatus::Corrupted) {
                Some("corrupted")
            } else if entry.status == ModelStatus::Downloaded {
                let last_used = entry.last_used.unwrap_or(entry_epoch());
                let age = now.signed_duration_since(last_used);
                (age.to_std().unwrap_or(Duration::ZERO) >= self.config.unused_eviction).then_some("unused")
            } else {
                None
            };
            if let Some(reason) = reason {
                to_evict.push((entry.id, reason));
            }
        }

        for (id, reason) in to_evict {
            if catalogue.all().len() <= 1 {
                break;
            }
            if let Some(entry) = catalogue.get(&id) {
                if let Some(path) = entry.file_path.clone() {
                    let _ = tokio::fs::remove_file(&path).await;
                }
            }
            catalogue.remove(&id);
            let _ = self.events.publish(ModelEvent::ModelEvicted { id, reason });
        }
        let _ = catalogue.save(&self.models_dir).await;
    }
}

fn entry_epoch() -> chrono::DateTime<Utc> {
    chrono::DateTime::<Utc>::UNIX_EPOCH
}

#[cfg(test)]
mod tests {
    use super::*;
    use vellum_test_support::{sha256_hex, stub_server, temp_dir};

    fn ggml_payload() -> Vec<u8> {
        let mut body = b"ggml".to_vec();
        body.extend(std::iter::repeat_n(0_u8, MIN_MODEL_SIZE_BYTES as usize));
        body
    }

    #[tokio::test]
    async fn download_and_validate_rejects_files_under_minimum_size() {
        let dir = temp_dir();
        let manager = ModelManager::initialize(
            ModelManagerConfig {
                models_dir: dir.path().to_string_lossy().into_owned(),
                auto_cleanup_enabled: false,
                ..ModelManagerConfig::default()
            },
            Arc::new(WhisperWrapper::new()),
        )
        .await
        .unwrap();

        let body = b"too small".to_vec();
        let server = stub_server::serve_full_body("/ggml-tiny.bin", body).await;
        {
            let mut catalogue = manager.catalogue.lock().await;
            catalogue.get_mut("tiny").unwrap().download_url = Some(format!("{}/ggml-tiny.bin", server.uri()));
        }

        let result = manager.download_model("tiny").await;
        assert_eq!(result, Err(ModelError::CorruptedModel));
    }

    #[tokio::test]
    async fn download_model_succeeds_and_updates_catalogue() {
        let dir = temp_dir();
        let manager = ModelManager::initialize(
            ModelManagerConfig {
                models_dir: dir.path().to_string_lossy().into_owned(),
                auto_cleanup_enabled: false,
                ..ModelManagerConfig::default()
            },
            Arc::new(WhisperWrapper::new()),
        )
        .await
        .unwrap();

        let body = ggml_payload();
        let checksum = sha256_hex(&body);
        let server = stub_server::serve_full_body("/ggml-tiny.bin", body).await;
        {
            let mut catalogue = manager.catalogue.lock().await;
            let entry = catalogue.get_mut("tiny").unwrap();
            entry.download_url = Some(format!("{}/ggml-tiny.bin", server.uri()));
            entry.checksum = Some(checksum);
        }

        manager.download_model("tiny").await.unwrap();
        let entry = manager.catalogue.lock().await.get("tiny").unwrap().clone();
        assert_eq!(entry.status, ModelStatus::Downloaded);
        assert!(entry.file_path.is_some());
    }

    #[tokio::test]
    async fn find_best_model_returns_none_before_any_download() {
        let dir = temp_dir();
        let manager = ModelManager::initialize(
            ModelManagerConfig {
                models_dir: dir.path().to_string_lossy().into_owned(),
                auto_cleanup_enabled: false,
                ..ModelManagerConfig::default()
            },
            Arc::new(WhisperWrapper::new()),
        )
        .await
        .unwrap();
        assert!(manager.find_best_model(None).await.is_none());
    }
}
