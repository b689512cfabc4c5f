//! Catalogue entry types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Whisper model size/variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelType {
    /// ~75 MiB, fastest, least accurate.
    Tiny,
    /// ~142 MiB.
    Base,
    /// ~466 MiB.
    Small,
    /// ~1.5 GiB.
    Medium,
    /// ~2.9 GiB, original large variant.
    Large,
    /// ~2.9 GiB, second large revision.
    LargeV2,
    /// ~2.9 GiB, third large revision, highest accuracy.
    LargeV3,
    /// A user-imported model outside the known size ladder.
    Custom,
}

impl ModelType {
    /// Preference rank used by [`crate::ModelCatalogue::find_best_model`]:
    /// higher ranks first. `Custom` models are never auto-selected by
    /// `find_best_model`, so its rank is lowest.
    #[must_use]
    pub const fn rank(self) -> u8 {
        match self {
            Self::LargeV3 => 7,
            Self::LargeV2 => 6,
            Self::Large => 5,
            Self::Medium => 4,
            Self::Small => 3,
            Self::Base => 2,
            Self::Tiny => 1,
            Self::Custom => 0,
        }
    }
}

/// Lifecycle status of a catalogue entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelStatus {
    /// Known but no local file exists yet.
    NotDownloaded,
    /// Transfer in progress.
    Downloading,
    /// Local file present and validated.
    Downloaded,
    /// Being handed to the STT wrapper.
    Loading,
    /// Currently the STT wrapper's active model; at most one at a time.
    Loaded,
    /// The download or validation failed.
    Failed,
    /// The local file failed magic-header/size validation.
    Corrupted,
}

/// One entry in the model catalogue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelInfo {
    /// Stable catalogue key.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Size/variant.
    #[serde(rename = "type")]
    pub model_type: ModelType,
    /// Current lifecycle status.
    pub status: ModelStatus,
    /// Primary language, when the model is not multilingual.
    pub language: Option<String>,
    /// Upstream release/version tag.
    pub version: String,
    /// Source URL the Download Manager fetches from.
    pub download_url: Option<String>,
    /// Local path once downloaded.
    pub file_path: Option<String>,
    /// Expected SHA-256 checksum, lowercase hex.
    pub checksum: Option<String>,
    /// Size in bytes, when known.
    pub file_size: Option<u64>,
    /// Download completion percentage in `[0, 100]`.
    pub download_progress: f64,
    /// Last time this model was loaded, for eviction aging.
    pub last_used: Option<DateTime<Utc>>,
    /// Whether the model supports more than one language.
    pub multilingual: bool,
    /// Free-form metadata.
    pub metadata: Map<String, Value>,
}

impl ModelInfo {
    /// Construct a catalogue entry for a model that has not been
    /// downloaded yet.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        model_type: ModelType,
        download_url: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            model_type,
            status: ModelStatus::NotDownloaded,
            language: None,
            version: "1".to_string(),
            download_url: Some(download_url.into()),
            file_path: None,
            checksum: None,
            file_size: None,
            download_progress: 0.0,
            last_used: None,
            multilingual: true,
            metadata: Map::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rank_orders_large_v3_first() {
        assert!(ModelType::LargeV3.rank() > ModelType::LargeV2.rank());
        assert!(ModelType::LargeV2.rank() > ModelType::Large.rank());
        assert!(ModelType::Large.rank() > ModelType::Medium.rank());
        assert!(ModelType::Tiny.rank() > ModelType::Custom.rank());
    }
}
