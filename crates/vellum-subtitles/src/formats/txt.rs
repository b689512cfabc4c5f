//! Plain-text output.

use crate::model::TranscriptionResult;
use crate::timestamps;

/// Options for [`to_txt`].
#[derive(Debug, Clone, Copy, Default)]
pub struct TxtOptions {
    /// Prefix each line with `[start --> end]`.
    pub include_timestamps: bool,
    /// Prepend a metadata header (language, model, processed-at).
    pub include_metadata_header: bool,
}

/// Render `result` as plain text.
#[must_use]
pub fn to_txt(result: &TranscriptionResult, options: &TxtOptions) -> String {
    let mut out = String::new();
    if options.include_metadata_header {
        out.push_str(&format!(
            "# language: {}\n# model: {}\n# processed_at: {}\n\n",
            result.language, result.model_used, result.processed_at,
        ));
    }
    if !options.include_timestamps {
        out.push_str(&result.full_text);
        return out;
    }
    for segment in &result.segments {
        if segment.is_empty() {
            continue;
        }
        out.push_str(&format!(
            "[{} --> {}] {}\n",
            timestamps::vtt(segment.start_time_ms),
            timestamps::vtt(segment.end_time_ms),
            segment.text.trim(),
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TranscriptionSegment;
    use chrono::Utc;
    use uuid::Uuid;

    fn result_with(full_text: &str) -> TranscriptionResult {
        TranscriptionResult {
            language: "en".to_string(),
            detected_language: None,
            segments: vec![TranscriptionSegment {
                id: Uuid::new_v4(),
                start_time_ms: 0,
                end_time_ms: 1_000,
                text: full_text.to_string(),
                confidence: 0.9,
                language: None,
                is_word_level: false,
                tokens: vec![],
                token_probs: vec![],
                metadata: serde_json::Map::new(),
            }],
            full_text: full_text.to_string(),
            avg_confidence: 0.0,
            processing_time_ms: 0,
            model_used: "base".to_string(),
            processed_at: Utc::now(),
            metadata: serde_json::Map::new(),
        }
    }

    #[test]
    fn without_timestamps_returns_full_text() {
        let rendered = to_txt(&result_with("hello world"), &TxtOptions::default());
        assert_eq!(rendered, "hello world");
    }

    #[test]
    fn with_timestamps_prefixes_each_segment() {
        let options = TxtOptions {
            include_timestamps: true,
            include_metadata_header: false,
        };
        let rendered = to_txt(&result_with("hello world"), &options);
        assert_eq!(rendered, "[00:00:00.000 --> 00:00:01.000] hello world\n");
    }
}
