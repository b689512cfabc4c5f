//! SRT (`SubRip`) output.

use crate::model::TranscriptionResult;
use crate::timestamps;

/// Render `result` as SRT text.
///
/// Empty segments are skipped; control characters are stripped from the
/// remaining text; the sequence index is assigned after skipping.
#[must_use]
pub fn to_srt(result: &TranscriptionResult) -> String {
    let mut out = String::new();
    let mut index = 1;
    for segment in &result.segments {
        if segment.is_empty() {
            continue;
        }
        let text = strip_control_chars(segment.text.trim());
        out.push_str(&format!(
            "{index}\n{} --> {}\n{text}\n\n",
            timestamps::srt(segment.start_time_ms),
            timestamps::srt(segment.end_time_ms),
        ));
        index += 1;
    }
    out
}

fn strip_control_chars(text: &str) -> String {
    text.chars().filter(|c| !c.is_control() || *c == '\n').collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TranscriptionSegment;
    use chrono::Utc;
    use uuid::Uuid;

    fn result_of(segments: Vec<TranscriptionSegment>) -> TranscriptionResult {
        TranscriptionResult {
            language: "en".to_string(),
            detected_language: None,
            segments,
            full_text: String::new(),
            avg_confidence: 0.0,
            processing_time_ms: 0,
            model_used: "base".to_string(),
            processed_at: Utc::now(),
            metadata: serde_json::Map::new(),
        }
    }

    fn seg(start: u64, end: u64, text: &str) -> TranscriptionSegment {
        TranscriptionSegment {
            id: Uuid::new_v4(),
            start_time_ms: start,
            end_time_ms: end,
            text: text.to_string(),
            confidence: 0.9,
            language: None,
            is_word_level: false,
            tokens: vec![],
            token_probs: vec![],
            metadata: serde_json::Map::new(),
        }
    }

    #[test]
    fn merged_segments_render_matches_spec_scenario() {
        let result = result_of(vec![seg(0, 4_000, "Hello world")]);
        let rendered = to_srt(&result);
        assert_eq!(
            rendered,
            "1\n00:00:00,000 --> 00:00:04,000\nHello world\n\n"
        );
    }

    #[test]
    fn empty_segments_are_skipped_and_index_stays_sequential() {
        let result = result_of(vec![seg(0, 1_000, ""), seg(1_000, 2_000, "only this")]);
        let rendered = to_srt(&result);
        assert!(rendered.starts_with("1\n"));
        assert!(!rendered.contains("2\n"));
    }
}
