//! Advanced SubStation Alpha (ASS) output.

use crate::model::TranscriptionResult;
use crate::timestamps;

const SCRIPT_INFO: &str = "[Script Info]\nScriptType: v4.00+\nWrapStyle: 0\nScaledBorderAndShadow: yes\n";
const STYLES: &str = "\n[V4+ Styles]\nFormat: Name, Fontname, Fontsize, PrimaryColour, SecondaryColour, OutlineColour, BackColour, Bold, Italic, Underline, StrikeOut, ScaleX, ScaleY, Spacing, Angle, BorderStyle, Outline, Shadow, Alignment, MarginL, MarginR, MarginV, Encoding\nStyle: Default,Arial,20,&H00FFFFFF,&H000000FF,&H00000000,&H00000000,0,0,0,0,100,100,0,0,1,2,0,2,10,10,10,1\n";
const EVENTS_HEADER: &str = "\n[Events]\nFormat: Layer, Start, End, Style, Name, MarginL, MarginR, MarginV, Effect, Text\n";

/// Render `result` as an ASS script.
#[must_use]
pub fn to_ass(result: &TranscriptionResult) -> String {
    let mut out = String::new();
    out.push_str(SCRIPT_INFO);
    out.push_str(STYLES);
    out.push_str(EVENTS_HEADER);
    for segment in &result.segments {
        if segment.is_empty() {
            continue;
        }
        out.push_str(&format!(
            "Dialogue: 0,{},{},Default,,0,0,0,,{}\n",
            timestamps::ass(segment.start_time_ms),
            timestamps::ass(segment.end_time_ms),
            escape(segment.text.trim()),
        ));
    }
    out
}

fn escape(text: &str) -> String {
    text.replace('\\', "\\\\")
        .replace('{', "\\{")
        .replace('}', "\\}")
        .replace('\n', "\\N")
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
                end_time_ms: 1_230,
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
    fn dialogue_line_uses_centisecond_timestamps() {
        let rendered = to_ass(&result_with("hi"));
        assert!(rendered.contains("Dialogue: 0,0:00:00.00,0:00:01.23,Default,,0,0,0,,hi"));
    }

    #[test]
    fn braces_and_newlines_are_escaped() {
        let rendered = to_ass(&result_with("a {b}\nc"));
        assert!(rendered.contains("a \\{b\\}\\Nc"));
    }
}
