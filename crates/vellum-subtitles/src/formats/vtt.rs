//! WebVTT output.

use crate::model::TranscriptionResult;
use crate::timestamps;

/// Cue positioning/alignment applied to every cue; `None` fields are
/// omitted from the cue settings line.
#[derive(Debug, Clone, Default)]
pub struct VttOptions {
    /// `position:` cue setting, e.g. `"50%"`.
    pub position: Option<String>,
    /// `align:` cue setting, e.g. `"center"`.
    pub align: Option<String>,
}

/// Render `result` as WebVTT text.
#[must_use]
pub fn to_vtt(result: &TranscriptionResult, options: &VttOptions) -> String {
    let mut out = String::from("WEBVTT\n\n");
    for segment in &result.segments {
        if segment.is_empty() {
            continue;
        }
        let mut cue_line = format!(
            "{} --> {}",
            timestamps::vtt(segment.start_time_ms),
            timestamps::vtt(segment.end_time_ms),
        );
        if let Some(position) = &options.position {
            cue_line.push_str(&format!(" position:{position}"));
        }
        if let Some(align) = &options.align {
            cue_line.push_str(&format!(" align:{align}"));
        }
        out.push_str(&cue_line);
        out.push('\n');
        out.push_str(&escape_entities(segment.text.trim()));
        out.push_str("\n\n");
    }
    out
}

fn escape_entities(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
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
                confidence: 0.9,
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
    fn header_and_cue_are_rendered() {
        let rendered = to_vtt(&result_with("hi"), &VttOptions::default());
        assert!(rendered.starts_with("WEBVTT\n\n"));
        assert!(rendered.contains("00:00:00.000 --> 00:00:01.000"));
    }

    #[test]
    fn entities_are_escaped() {
        let rendered = to_vtt(&result_with("A & B < C > D"), &VttOptions::default());
        assert!(rendered.contains("A &amp; B &lt; C &gt; D"));
    }

    #[test]
    fn position_and_align_are_appended_to_cue_settings() {
        let options = VttOptions {
            position: Some("50%".to_string()),
            align: Some("center".to_string()),
        };
        let rendered = to_vtt(&result_with("hi"), &options);
        assert!(rendered.contains("position:50% align:center"));
    }
}
