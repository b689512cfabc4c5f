//! Segment merging/splitting and text post-processing.

use uuid::Uuid;

use crate::model::TranscriptionSegment;

const FILLER_WORDS: &[&str] = &["um", "uh", "er", "ah", "like", "you know"];

/// Merge adjacent segments when the inter-segment gap is at most
/// `max_gap_ms` and the resulting combined duration is at most
/// `max_length_ms`. Merged confidence is the arithmetic mean of the
/// constituent segments' confidences.
///
/// Preserves the invariant that for every consecutive pair
/// `(a, b)` in the output, `b.start - a.end > max_gap_ms` or
/// `a.duration + (b.start - a.end) + b.duration > max_length_ms` — i.e.
/// anything left unmerged genuinely failed one of the two conditions.
#[must_use]
pub fn merge_segments(
    segments: &[TranscriptionSegment],
    max_gap_ms: u64,
    max_length_ms: u64,
) -> Vec<TranscriptionSegment> {
    let mut out: Vec<TranscriptionSegment> = Vec::new();
    let mut confidence_counts: Vec<usize> = Vec::new();

    for segment in segments {
        if let Some(acc) = out.last_mut() {
            let gap = segment.start_time_ms.saturating_sub(acc.end_time_ms);
            let combined_duration = acc.duration_ms() + gap + segment.duration_ms();
            if gap <= max_gap_ms && combined_duration <= max_length_ms {
                let count = confidence_counts
                    .last_mut()
                    .expect("tracked per accumulator");
                acc.end_time_ms = segment.end_time_ms;
                if !segment.text.trim().is_empty() {
                    if acc.text.is_empty() {
                        acc.text = segment.text.clone();
                    } else {
                        acc.text = format!("{} {}", acc.text, segment.text.trim());
                    }
                }
                acc.confidence = (acc.confidence * *count as f64 + segment.confidence)
                    / (*count + 1) as f64;
                *count += 1;
                acc.tokens.extend(segment.tokens.iter().cloned());
                acc.token_probs.extend(segment.token_probs.iter().copied());
                continue;
            }
        }
        out.push(segment.clone());
        confidence_counts.push(1);
    }

    out
}

/// Split any segment whose duration exceeds `max_length_ms` into
/// contiguous, equal-duration parts.
///
/// When `on_words` is `true`, each part's text is a contiguous run of
/// whitespace-delimited words, with the word count per part proportional
/// to that part's share of the total duration (here, equal shares since
/// parts are equal-length). When `false`, the raw text is divided by
/// character position in proportion to time, which may split a word
/// across two parts — matching "split time evenly" literally rather than
/// respecting word boundaries.
#[must_use]
pub fn split_long_segments(
    segments: &[TranscriptionSegment],
    max_length_ms: u64,
    on_words: bool,
) -> Vec<TranscriptionSegment> {
    let mut out = Vec::with_capacity(segments.len());
    for segment in segments {
        if segment.duration_ms() <= max_length_ms || max_length_ms == 0 {
            out.push(segment.clone());
            continue;
        }
        out.extend(split_one(segment, max_length_ms, on_words));
    }
    out
}

fn split_one(
    segment: &TranscriptionSegment,
    max_length_ms: u64,
    on_words: bool,
) -> Vec<TranscriptionSegment> {
    let duration = segment.duration_ms();
    let num_parts = duration.div_ceil(max_length_ms).max(1) as usize;
    let part_duration = duration / num_parts as u64;

    let text_parts: Vec<String> = if on_words {
        split_by_words(&segment.text, num_parts)
    } else {
        split_by_chars(&segment.text, num_parts)
    };

    let mut parts = Vec::with_capacity(num_parts);
    for index in 0..num_parts {
        let start = segment.start_time_ms + part_duration * index as u64;
        let end = if index + 1 == num_parts {
            segment.end_time_ms
        } else {
            start + part_duration
        };
        parts.push(TranscriptionSegment {
            id: Uuid::new_v4(),
            start_time_ms: start,
            end_time_ms: end,
            text: text_parts.get(index).cloned().unwrap_or_default(),
            confidence: segment.confidence,
            language: segment.language.clone(),
            is_word_level: segment.is_word_level,
            tokens: Vec::new(),
            token_probs: Vec::new(),
            metadata: segment.metadata.clone(),
        });
    }
    parts
}

fn split_by_words(text: &str, num_parts: usize) -> Vec<String> {
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.is_empty() {
        return vec![String::new(); num_parts];
    }
    let base = words.len() / num_parts;
    let remainder = words.len() % num_parts;
    let mut out = Vec::with_capacity(num_parts);
    let mut cursor = 0;
    for index in 0..num_parts {
        let take = base + usize::from(index < remainder);
        let chunk = &words[cursor..(cursor + take).min(words.len())];
        out.push(chunk.join(" "));
        cursor += take;
    }
    out
}

fn split_by_chars(text: &str, num_parts: usize) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    if chars.is_empty() {
        return vec![String::new(); num_parts];
    }
    let base = chars.len() / num_parts;
    let remainder = chars.len() % num_parts;
    let mut out = Vec::with_capacity(num_parts);
    let mut cursor = 0;
    for index in 0..num_parts {
        let take = base + usize::from(index < remainder);
        let chunk: String = chars[cursor..(cursor + take).min(chars.len())].iter().collect();
        out.push(chunk.trim().to_string());
        cursor += take;
    }
    out
}

/// Options controlling [`post_process_text`].
#[derive(Debug, Clone, Copy, Default)]
pub struct PostProcessOptions {
    /// Capitalize the first letter and the first letter after
    /// sentence-ending punctuation (`.`, `!`, `?`).
    pub capitalize: bool,
    /// Remove filler words (`um, uh, er, ah, like, you know`).
    pub remove_fillers: bool,
    /// Ensure the text ends with terminal punctuation.
    pub ensure_terminal_punctuation: bool,
}

/// Collapse whitespace and optionally capitalize, strip fillers, and add
/// terminal punctuation.
#[must_use]
pub fn post_process_text(text: &str, options: PostProcessOptions) -> String {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");

    let filtered = if options.remove_fillers {
        remove_fillers(&collapsed)
    } else {
        collapsed
    };

    let capitalized = if options.capitalize {
        capitalize_sentences(&filtered)
    } else {
        filtered
    };

    if options.ensure_terminal_punctuation
        && !capitalized.is_empty()
        && !matches!(capitalized.chars().last(), Some('.' | '!' | '?'))
    {
        format!("{capitalized}.")
    } else {
        capitalized
    }
}

fn remove_fillers(text: &str) -> String {
    let words: Vec<&str> = text.split(' ').collect();
    let mut kept: Vec<&str> = Vec::with_capacity(words.len());
    let mut index = 0;
    while index < words.len() {
        // "you know" is a two-word filler; check it before single words.
        if index + 1 < words.len() {
            let pair = format!(
                "{} {}",
                words[index].to_lowercase().trim_matches(|c: char| !c.is_alphanumeric()),
                words[index + 1].to_lowercase().trim_matches(|c: char| !c.is_alphanumeric())
            );
            if pair == "you know" {
                index += 2;
                continue;
            }
        }
        let normalized = words[index]
            .to_lowercase()
            .trim_matches(|c: char| !c.is_alphanumeric())
            .to_string();
        if FILLER_WORDS.contains(&normalized.as_str()) {
            index += 1;
            continue;
        }
        kept.push(words[index]);
        index += 1;
    }
    kept.join(" ")
}

fn capitalize_sentences(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut capitalize_next = true;
    for ch in text.chars() {
        if capitalize_next && ch.is_alphabetic() {
            out.extend(ch.to_uppercase());
            capitalize_next = false;
        } else {
            out.push(ch);
            if matches!(ch, '.' | '!' | '?') {
                capitalize_next = true;
            } else if !ch.is_whitespace() {
                capitalize_next = false;
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn seg(start: u64, end: u64, text: &str, confidence: f64) -> TranscriptionSegment {
        let _ = Utc::now();
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

    #[test]
    fn merge_combines_within_thresholds() {
        let segments = vec![
            seg(0, 2_000, "Hello", 0.8),
            seg(2_100, 4_000, "world", 0.6),
        ];
        let merged = merge_segments(&segments, 200, 10_000);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].text, "Hello world");
        assert_eq!(merged[0].start_time_ms, 0);
        assert_eq!(merged[0].end_time_ms, 4_000);
        assert!((merged[0].confidence - 0.7).abs() < 1e-9);
    }

    #[test]
    fn merge_respects_gap_threshold() {
        let segments = vec![seg(0, 1_000, "a", 1.0), seg(2_000, 3_000, "b", 1.0)];
        let merged = merge_segments(&segments, 200, 10_000);
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn merge_respects_length_threshold() {
        let segments = vec![seg(0, 5_000, "a", 1.0), seg(5_050, 10_000, "b", 1.0)];
        let merged = merge_segments(&segments, 200, 8_000);
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn split_leaves_short_segments_untouched() {
        let segments = vec![seg(0, 1_000, "short", 0.9)];
        let split = split_long_segments(&segments, 5_000, true);
        assert_eq!(split.len(), 1);
        assert_eq!(split[0].text, "short");
    }

    #[test]
    fn split_on_words_divides_word_count() {
        let segments = vec![seg(0, 6_000, "one two three four five six", 0.9)];
        let split = split_long_segments(&segments, 3_000, true);
        assert_eq!(split.len(), 2);
        assert_eq!(split[0].text, "one two three");
        assert_eq!(split[1].text, "four five six");
        assert_eq!(split[0].start_time_ms, 0);
        assert_eq!(split[1].end_time_ms, 6_000);
    }

    #[test]
    fn post_process_collapses_capitalizes_and_terminates() {
        let out = post_process_text(
            "  hello   world. it works",
            PostProcessOptions {
                capitalize: true,
                remove_fillers: false,
                ensure_terminal_punctuation: true,
            },
        );
        assert_eq!(out, "Hello world. It works.");
    }

    #[test]
    fn post_process_removes_fillers_including_two_word() {
        let out = post_process_text(
            "so um I think, you know, it works",
            PostProcessOptions {
                capitalize: false,
                remove_fillers: true,
                ensure_terminal_punctuation: false,
            },
        );
        assert_eq!(out, "so I think, it works");
    }
}
