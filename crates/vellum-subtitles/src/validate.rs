//! Validation shared by every formatter.

use crate::error::FormatError;
use crate::model::{MAX_TIMESTAMP_MS, TranscriptionResult};

/// Validate a result before formatting it.
///
/// # Errors
///
/// Returns [`FormatError::EmptyTranscription`] when no segment carries
/// non-empty text, [`FormatError::InvalidTimestamp`] when a segment's
/// timestamps are out of range or non-increasing, or
/// [`FormatError::InvalidConfidence`] when a confidence falls outside
/// `[0, 1]`.
pub fn validate_result(result: &TranscriptionResult) -> Result<(), FormatError> {
    if result.segments.iter().all(super::model::TranscriptionSegment::is_empty) {
        return Err(FormatError::EmptyTranscription);
    }

    for (index, segment) in result.segments.iter().enumerate() {
        if segment.is_empty() {
            continue;
        }
        if segment.end_time_ms <= segment.start_time_ms || segment.end_time_ms > MAX_TIMESTAMP_MS
        {
            return Err(FormatError::InvalidTimestamp { index });
        }
        if !(0.0..=1.0).contains(&segment.confidence) {
            return Err(FormatError::InvalidConfidence { index });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TranscriptionSegment;
    use chrono::Utc;
    use uuid::Uuid;

    fn segment(start: u64, end: u64, text: &str, confidence: f64) -> TranscriptionSegment {
        TranscriptionSegment {
            id: Uuid::new_v4(),
            start_time_ms: start,
            end_time_ms: end,
            text: text.to_string(),
            confidence,
            language: None,
            is_word_level: false,
            tokens: vec![],
            token_probs: vec![],
            metadata: serde_json::Map::new(),
        }
    }

    fn result(segments: Vec<TranscriptionSegment>) -> TranscriptionResult {
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

    #[test]
    fn empty_segments_rejected() {
        let r = result(vec![segment(0, 1000, "", 0.9)]);
        assert_eq!(validate_result(&r), Err(FormatError::EmptyTranscription));
    }

    #[test]
    fn end_before_start_rejected() {
        let r = result(vec![segment(1000, 500, "hi", 0.9)]);
        assert_eq!(
            validate_result(&r),
            Err(FormatError::InvalidTimestamp { index: 0 })
        );
    }

    #[test]
    fn confidence_out_of_range_rejected() {
        let r = result(vec![segment(0, 1000, "hi", 1.5)]);
        assert_eq!(
            validate_result(&r),
            Err(FormatError::InvalidConfidence { index: 0 })
        );
    }

    #[test]
    fn valid_result_passes() {
        let r = result(vec![segment(0, 1000, "hi", 0.9)]);
        assert!(validate_result(&r).is_ok());
    }
}
