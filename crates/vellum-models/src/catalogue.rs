//! Persisted catalogue of known and discovered models.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tracing::warn;

use crate::error::{ModelError, ModelResult};
use crate::model::{ModelInfo, ModelStatus, ModelType};

const CATALOGUE_FILE_NAME: &str = "models.json";
const GGML_BASE_URL: &str = "https://huggingface.co/ggerganov/whisper.cpp/resolve/main";

/// In-memory catalogue, persisted as `<models_dir>/models.json`.
#[derive(Debug, Default)]
pub struct ModelCatalogue {
    entries: HashMap<String, ModelInfo>,
}

impl ModelCatalogue {
    /// The built-in set of known `ggml` models, seeded on first
    /// `initialize` when no persisted catalogue exists yet.
    #[must_use]
    pub fn default_entries() -> Vec<ModelInfo> {
        [
            ("tiny", "Tiny", ModelType::Tiny, true),
            ("tiny.en", "Tiny (English)", ModelType::Tiny, false),
            ("base", "Base", ModelType::Base, true),
            ("base.en", "Base (English)", ModelType::Base, false),
            ("small", "Small", ModelType::Small, true),
            ("small.en", "Small (English)", ModelType::Small, false),
            ("medium", "Medium", ModelType::Medium, true),
            ("medium.en", "Medium (English)", ModelType::Medium, false),
            ("large-v1", "Large", ModelType::Large, true),
            ("large-v2", "Large v2", ModelType::LargeV2, true),
            ("large-v3", "Large v3", ModelType::LargeV3, true),
        ]
        .into_iter()
        .map(|(id, name, model_type, multilingual)| {
            let mut info = ModelInfo::new(id, name, model_type, format!("{GGML_BASE_URL}/ggml-{id}.bin"));
            info.multilingual = multilingual;
            if !multilingual {
                info.language = Some("en".to_string());
            }
            info
        })
        .collect()
    }

    /// Load the persisted catalogue from `<dir>/models.json`, seeding it
    /// with [`Self::default_entries`] when the file does not exist yet.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::InitializationFailed`] if the directory
    /// cannot be created or the existing file is not valid JSON.
    pub async fn load(dir: &Path) -> ModelResult<Self> {
        tokio::fs::create_dir_all(dir)
            .await
            .map_err(|_| ModelError::InitializationFailed)?;
        let path = dir.join(CATALOGUE_FILE_NAME);

        let entries = match tokio::fs::read_to_string(&path).await {
            Ok(contents) => {
                let entries: Vec<ModelInfo> =
                    serde_json::from_str(&contents).map_err(|_| ModelError::InitializationFailed)?;
                entries.into_iter().map(|entry| (entry.id.clone(), entry)).collect()
            }
            Err(_) => {
                Self::default_entries().into_iter().map(|entry| (entry.id.clone(), entry)).collect()
            }
        };

        let mut catalogue = Self { entries };
        catalogue.discover_local_files(dir).await;
        catalogue.save(dir).await?;
        Ok(catalogue)
    }

    /// Persist the catalogue to `<dir>/models.json`.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::DiskError`] if the file cannot be written.
    pub async fn save(&self, dir: &Path) -> ModelResult<()> {
        let mut entries: Vec<&ModelInfo> = self.entries.values().collect();
        entries.sort_by(|a, b| a.id.cmp(&b.id));
        let json = serde_json::to_string_pretty(&entries).map_err(|_| ModelError::DiskError)?;
        tokio::fs::write(dir.join(CATALOGUE_FILE_NAME), json)
            .await
            .map_err(|_| ModelError::DiskError)
    }

    /// Mark any catalogue entry whose `<dir>/ggml-<id>.bin` file exists on
    /// disk as `Downloaded`, picking up models placed there outside the
    /// manager (manual copy, prior run).
    async fn discover_local_files(&mut self, dir: &Path) {
        for entry in self.entries.values_mut() {
            if entry.file_path.is_some() {
                continue;
            }
            let candidate = dir.join(format!("ggml-{}.bin", entry.id));
            if let Ok(metadata) = tokio::fs::metadata(&candidate).await {
                entry.file_path = Some(candidate.to_string_lossy().into_owned());
                entry.file_size = Some(metadata.len());
                entry.status = ModelStatus::Downloaded;
                entry.download_progress = 100.0;
            }
        }
    }

    /// All known models (default catalogue + discovered + imported).
    #[must_use]
    pub fn all(&self) -> Vec<ModelInfo> {
        let mut entries: Vec<ModelInfo> = self.entries.values().cloned().collect();
        entries.sort_by(|a, b| a.id.cmp(&b.id));
        entries
    }

    /// Models whose status is `Downloaded` or `Loaded`.
    #[must_use]
    pub fn downloaded(&self) -> Vec<ModelInfo> {
        self.entries
            .values()
            .filter(|entry| matches!(entry.status, ModelStatus::Downloaded | ModelStatus::Loaded))
            .cloned()
            .collect()
    }

    /// Look up a single entry by id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&ModelInfo> {
        self.entries.get(id)
    }

    /// Mutable lookup by id.
    pub fn get_mut(&mut self, id: &str) -> Option<&mut ModelInfo> {
        self.entries.get_mut(id)
    }

    /// Insert or replace a catalogue entry (used for user-imported custom
    /// models).
    pub fn insert(&mut self, info: ModelInfo) {
        self.entries.insert(info.id.clone(), info);
    }

    /// Remove an entry entirely.
    pub fn remove(&mut self, id: &str) -> Option<ModelInfo> {
        self.entries.remove(id)
    }

    /// Find the first model matching `model_type`, optionally filtered by
    /// `language`.
    #[must_use]
    pub fn find_model(&self, model_type: ModelType, language: Option<&str>) -> Option<&ModelInfo> {
        self.entries.values().find(|entry| {
            entry.model_type == model_type
                && language.is_none_or(|lang| {
                    entry.multilingual || entry.language.as_deref() == Some(lang)
                })
        })
    }

    /// The highest-priority downloaded (or loaded) model, ranked
    /// `LargeV3 > LargeV2 > Large > Medium > Small > Base > Tiny`
    /// (`Custom` models are never selected), optionally filtered by
    /// `language`.
    #[must_use]
    pub fn find_best_model(&self, language: Option<&str>) -> Option<&ModelInfo> {
        self.entries
            .values()
            .filter(|entry| {
                matches!(entry.status, ModelStatus::Downloaded | ModelStatus::Loaded)
                    && entry.model_type != ModelType::Custom
                    && language.is_none_or(|lang| {
                        entry.multilingual || entry.language.as_deref() == Some(lang)
                    })
            })
            .max_by_key(|entry| entry.model_type.rank())
    }

    /// Rescan `dir` for local files and reconcile catalogue status,
    /// logging (but not failing on) any individual read error.
    pub async fn refresh(&mut self, dir: &Path) {
        self.discover_local_files(dir).await;
        for entry in self.entries.values_mut() {
            if entry.status != ModelStatus::Downloaded {
                continue;
            }
            let Some(path) = entry.file_path.clone() else { continue };
            if tokio::fs::metadata(&path).await.is_err() {
                warn!(id = %entry.id, path, "catalogued model file is missing; marking not downloaded");
                entry.status = ModelStatus::NotDownloaded;
                entry.file_path = None;
                entry.file_size = None;
                entry.download_progress = 0.0;
            }
        }
    }
}

/// Path a model's local file would live at within `dir`.
#[must_use]
pub fn local_path_for(dir: &Path, id: &str) -> PathBuf {
    dir.join(format!("ggml-{id}.bin"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn load_seeds_default_catalogue_when_absent() {
        let dir = vellum_test_support::temp_dir();
        let catalogue = ModelCatalogue::load(dir.path()).await.unwrap();
        assert!(catalogue.get("large-v3").is_some());
        assert!(tokio::fs::metadata(dir.path().join(CATALOGUE_FILE_NAME)).await.is_ok());
    }

    #[tokio::test]
    async fn find_best_model_prefers_highest_rank_among_downloaded() {
        let dir = vellum_test_support::temp_dir();
        let mut catalogue = ModelCatalogue::load(dir.path()).await.unwrap();
        catalogue.get_mut("small").unwrap().status = ModelStatus::Downloaded;
        catalogue.get_mut("base").unwrap().status = ModelStatus::Downloaded;

        let best = catalogue.find_best_model(None).unwrap();
        assert_eq!(best.id, "small");
    }

    #[tokio::test]
    async fn find_best_model_none_when_nothing_downloaded() {
        let dir = vellum_test_support::temp_dir();
        let catalogue = ModelCatalogue::load(dir.path()).await.unwrap();
        assert!(catalogue.find_best_model(None).is_none());
    }

    #[tokio::test]
    async fn discover_local_files_marks_existing_file_downloaded() {
        let dir = vellum_test_support::temp_dir();
        tokio::fs::write(dir.path().join("ggml-tiny.bin"), vec![0_u8; 2048]).await.unwrap();
        let catalogue = ModelCatalogue::load(dir.path()).await.unwrap();
        assert_eq!(catalogue.get("tiny").unwrap().status, ModelStatus::Downloaded);
    }
}
