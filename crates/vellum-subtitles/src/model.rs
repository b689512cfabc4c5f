//! Shared data model produced by the Transcription Engine and consumed
//! by every formatter and transformation in this crate.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Upper bound on any segment timestamp: 24 hours, in milliseconds.
pub const MAX_TIMESTAMP_MS: u64 = 24 * 60 * 60 * 1_000;

/// A single time-bounded unit of recognized speech.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TranscriptionSegment {
    /// Unique identifier for this segment.
    pub id: Uuid,
    /// Start offset from the beginning of the audio, in milliseconds.
    pub start_time_ms: u64,
    /// End offset from the beginning of the audio, in milliseconds.
    pub end_time_ms: u64,
    /// Recognized text.
    pub text: String,
    /// Model confidence for this segment, in `[0, 1]`.
    pub confidence: f64,
    /// Language code, when known for this specific segment.
    pub language: Option<String>,
    /// Whether this segment represents a single word rather than a
    /// multi-word utterance.
    pub is_word_level: bool,
    /// Token strings, when token-level detail was requested.
    #[serde(default)]
    pub tokens: Vec<String>,
    /// Per-token probabilities, parallel to `tokens`.
    #[serde(default)]
    pub token_probs: Vec<f64>,
    /// Free-form metadata attached by the producing engine.
    #[serde(default)]
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

impl TranscriptionSegment {
    /// Duration of this segment, in milliseconds.
    #[must_use]
    pub const fn duration_ms(&self) -> u64 {
        self.end_time_ms.saturating_sub(self.start_time_ms)
    }

    /// Whether this segment carries any recognizable text.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// The full output of transcribing one audio source.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TranscriptionResult {
    /// Language requested or assumed for the transcription.
    pub language: String,
    /// Language actually detected by the model, when auto-detection ran.
    pub detected_language: Option<String>,
    /// Ordered, non-overlapping segments.
    pub segments: Vec<TranscriptionSegment>,
    /// Concatenation of segment texts, whitespace-normalized.
    pub full_text: String,
    /// Average confidence across all non-empty segments.
    pub avg_confidence: f64,
    /// Wall-clock processing time, in milliseconds.
    pub processing_time_ms: u64,
    /// Identifier of the model used to produce this result.
    pub model_used: String,
    /// Timestamp this result was produced.
    pub processed_at: DateTime<Utc>,
    /// Free-form metadata attached by the producing engine.
    #[serde(default)]
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

impl TranscriptionResult {
    /// Recompute `full_text` and `avg_confidence` from `segments`,
    /// matching the invariant that `full_text` equals the
    /// whitespace-normalized concatenation of non-empty segment texts.
    pub fn recompute_derived_fields(&mut self) {
        self.full_text = self
            .segments
            .iter()
            .filter(|segment| !segment.is_empty())
            .map(|segment| segment.text.trim())
            .collect::<Vec<_>>()
            .join(" ");

        let scored: Vec<f64> = self
            .segments
            .iter()
            .filter(|segment| !segment.is_empty())
            .map(|segment| segment.confidence)
            .collect();
        self.avg_confidence = if scored.is_empty() {
            0.0
        } else {
            scored.iter().sum::<f64>() / scored.len() as f64
        };
    }
}
