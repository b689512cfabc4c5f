//! JSON output, round-trippable for `{segments, language, metadata}`.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::error::FormatError;
use crate::model::{TranscriptionResult, TranscriptionSegment};

/// Wire shape for JSON subtitle export.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonResult {
    /// Language code.
    pub language: String,
    /// Full concatenated text.
    pub text: String,
    /// Model identifier.
    pub model: String,
    #[serde(rename = "processingTime")]
    /// Processing time, in milliseconds.
    pub processing_time: u64,
    #[serde(rename = "averageConfidence")]
    /// Average confidence across segments.
    pub average_confidence: f64,
    /// Per-segment detail.
    pub segments: Vec<JsonSegment>,
    /// Free-form metadata.
    #[serde(default)]
    pub metadata: serde_json::Map<String, Value>,
}

/// One segment in [`JsonResult`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonSegment {
    /// Start offset, in milliseconds.
    pub start: u64,
    /// End offset, in milliseconds.
    pub end: u64,
    /// Segment text.
    pub text: String,
    /// Segment confidence.
    pub confidence: f64,
    /// Word-level tokens, when available.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub words: Option<Vec<String>>,
}

/// Render `result` as the JSON wire shape.
#[must_use]
pub fn to_json(result: &TranscriptionResult) -> JsonResult {
    JsonResult {
        language: result.language.clone(),
        text: result.full_text.clone(),
        model: result.model_used.clone(),
        processing_time: result.processing_time_ms,
        average_confidence: result.avg_confidence,
        segments: result
            .segments
            .iter()
            .filter(|segment| !segment.is_empty())
            .map(|segment| JsonSegment {
                start: segment.start_time_ms,
                end: segment.end_time_ms,
                text: segment.text.clone(),
                confidence: segment.confidence,
                words: (!segment.tokens.is_empty()).then(|| segment.tokens.clone()),
            })
            .collect(),
        metadata: result.metadata.clone(),
    }
}

/// Serialize `result` to a JSON string.
///
/// # Errors
///
/// Returns [`FormatError::Serialization`] if the underlying serializer
/// fails (only possible for non-UTF-8 map keys, which cannot occur here).
pub fn to_json_string(result: &TranscriptionResult) -> Result<String, FormatError> {
    serde_json::to_string_pretty(&to_json(result)).map_err(|err| FormatError::Serialization {
        message: err.to_string(),
    })
}

/// Reconstruct a [`TranscriptionResult`] from the JSON wire shape,
/// filling in fields the wire shape does not carry
/// (`detected_language`, per-segment `id`/`language`/`is_word_level`)
/// with sensible defaults. Round-trips `{segments, language, metadata}`
/// exactly.
#[must_use]
pub fn from_json(json: &JsonResult) -> TranscriptionResult {
    let segments = json
        .segments
        .iter()
        .map(|segment| TranscriptionSegment {
            id: Uuid::new_v4(),
            start_time_ms: segment.start,
            end_time_ms: segment.end,
            text: segment.text.clone(),
            confidence: segment.confidence,
            language: None,
            is_word_level: false,
            tokens: segment.words.clone().unwrap_or_default(),
            token_probs: Vec::new(),
            metadata: serde_json::Map::new(),
        })
        .collect();

    let mut result = TranscriptionResult {
        language: json.language.clone(),
        detected_language: None,
        segments,
        full_text: json.text.clone(),
        avg_confidence: json.average_confidence,
        processing_time_ms: json.processing_time,
        model_used: json.model.clone(),
        processed_at: chrono::Utc::now(),
        metadata: json.metadata.clone(),
    };
    result.recompute_derived_fields();
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TranscriptionSegment;
    use chrono::Utc;

    fn sample() -> TranscriptionResult {
        let segments = vec![
            TranscriptionSegment {
                id: Uuid::new_v4(),
                start_time_ms: 0,
                end_time_ms: 1_000,
                text: "Hello".to_string(),
                confidence: 0.9,
                language: Some("en".to_string()),
                is_word_level: false,
                tokens: vec![],
                token_probs: vec![],
                metadata: serde_json::Map::new(),
            },
            TranscriptionSegment {
                id: Uuid::new_v4(),
                start_time_ms: 1_000,
                end_time_ms: 2_000,
                text: "world".to_string(),
                confidence: 0.8,
                language: Some("en".to_string()),
                is_word_level: false,
                tokens: vec![],
                token_probs: vec![],
                metadata: serde_json::Map::new(),
            },
        ];
        let mut result = TranscriptionResult {
            language: "en".to_string(),
            detected_language: Some("en".to_string()),
            segments,
            full_text: String::new(),
            avg_confidence: 0.0,
            processing_time_ms: 42,
            model_used: "base".to_string(),
            processed_at: Utc::now(),
            metadata: serde_json::Map::new(),
        };
        result.recompute_derived_fields();
        result
    }

    #[test]
    fn round_trip_preserves_segments_language_and_text() {
        let original = sample();
        let wire = to_json(&original);
        let restored = from_json(&wire);

        assert_eq!(restored.language, original.language);
        assert_eq!(restored.full_text, original.full_text);
        assert_eq!(restored.segments.len(), original.segments.len());
        for (a, b) in original.segments.iter().zip(restored.segments.iter()) {
            assert_eq!(a.start_time_ms, b.start_time_ms);
            assert_eq!(a.end_time_ms, b.end_time_ms);
            assert_eq!(a.text, b.text);
            assert!((a.confidence - b.confidence).abs() < 1e-9);
        }
    }

    #[test]
    fn to_json_string_produces_valid_json() {
        let text = to_json_string(&sample()).expect("serialize");
        let value: Value = serde_json::from_str(&text).expect("parse");
        assert_eq!(value["language"], "en");
    }
}
