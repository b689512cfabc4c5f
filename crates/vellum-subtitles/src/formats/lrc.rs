//! LRC (synchronized lyrics) output.

use crate::model::TranscriptionResult;
use crate::timestamps;

/// Metadata headers rendered before the timed lines.
#[derive(Debug, Clone, Default)]
pub struct LrcMetadata {
    /// `[ar:]` artist header.
    pub artist: Option<String>,
    /// `[ti:]` title header.
    pub title: Option<String>,
    /// `[al:]` album header.
    pub album: Option<String>,
    /// `[by:]` author-of-the-lrc-file header.
    pub by: Option<String>,
}

/// Render `result` as LRC text.
#[must_use]
pub fn to_lrc(result: &TranscriptionResult, metadata: &LrcMetadata) -> String {
    let mut out = String::new();
    if let Some(artist) = &metadata.artist {
        out.push_str(&format!("[ar:{artist}]\n"));
    }
    if let Some(title) = &metadata.title {
        out.push_str(&format!("[ti:{title}]\n"));
    }
    if let Some(album) = &metadata.album {
        out.push_str(&format!("[al:{album}]\n"));
    }
    if let Some(by) = &metadata.by {
        out.push_str(&format!("[by:{by}]\n"));
    }
    for segment in &result.segments {
        if segment.is_empty() {
            continue;
        }
        out.push_str(&timestamps::lrc(segment.start_time_ms));
        out.push_str(segment.text.trim());
        out.push('\n');
    }
    out
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
                start_time_ms: 65_230,
                end_time_ms: 70_000,
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
    fn metadata_headers_precede_lines() {
        let rendered = to_lrc(
            &result_with("hello"),
            &LrcMetadata {
                artist: Some("A".to_string()),
                title: Some("T".to_string()),
                album: None,
                by: None,
            },
        );
        assert_eq!(rendered, "[ar:A]\n[ti:T]\n[01:05.23]hello\n");
    }
}
