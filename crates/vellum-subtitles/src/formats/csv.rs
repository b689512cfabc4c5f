//! CSV output, End (ms), Duration (ms), Text[, Confidence]`).

use crate::model::TranscriptionResult;

/// Options for [`to_csv`].
#[derive(Debug, Clone, Copy, Default)]
pub struct CsvOptions {
    /// Append a `Confidence` column.
    pub include_confidence: bool,
}

/// Render `result` as CSV text with a header row.
#[must_use]
pub fn to_csv(result: &TranscriptionResult, options: &CsvOptions) -> String {
    let mut out = if options.include_confidence {
        "Start (ms),End (ms),Duration (ms),Text,Confidence\n".to_string()
    } else {
        "Start (ms),End (ms),Duration (ms),Text\n".to_string()
    };

    for segment in &result.segments {
        if segment.is_empty() {
            continue;
        }
        out.push_str(&format!(
            "{},{},{},{}",
            segment.start_time_ms,
            segment.end_time_ms,
            segment.duration_ms(),
            quote(segment.text.trim()),
        ));
        if options.include_confidence {
            out.push_str(&format!(",{:.4}", segment.confidence));
        }
        out.push('\n');
    }
    out
}

fn quote(field: &str) -> String {
    if field.contains(',') || field.contains('"') || field.contains('\n') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TranscriptionSegment;
    use chrono::Utc;
    use uuid::Uuid;

    fn result_with(text: &str) -> TranscriptionResult {
        TranscriptionResult {
            language: "en".to_string(),
            detected_language: None,
            segments: vec![TranscriptionSegment {
                id: Uuid::new_v4(),
                start_time_ms: 0,
                end_time_ms: 1_000,
                text: text.to_string(),
                confidence: 0.875,
                language: None,
                is_word_level: false,
                tokens: vec![],
                token_probs: vec![],
                metadata: serde_json::Map::new(),
            }],
            full_text: String::new(),
            avg_confidence: 0.0,
            processing_time_ms: 0,
            model_used: "base".to_string(),
            processed_at: Utc::now(),
            metadata: serde_json::Map::new(),
        }
    }

    #[test]
    fn header_and_row_without_confidence() {
        let rendered = to_csv(&result_with("hello"), &CsvOptions::default());
        assert_eq!(rendered, "Start (ms),End (ms),Duration (ms),Text\n0,1000,1000,hello\n");
    }

    #[test]
    fn confidence_column_is_appended_when_requested() {
        let rendered = to_csv(
            &result_with("hello"),
            &CsvOptions {
                include_confidence: true,
            },
        );
        assert_eq!(
            rendered,
            "Start (ms),End (ms),Duration (ms),Text,Confidence\n0,1000,1000,hello,0.8750\n"
        );
    }

    #[test]
    fn text_with_commas_and_quotes_is_quoted() {
        let rendered = to_csv(&result_with("say \"hi\", ok"), &CsvOptions::default());
        assert!(rendered.contains("\"say \"\"hi\"\", ok\""));
    }
}
