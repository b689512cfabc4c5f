//! Bounded-buffer realtime/microphone transcription session.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use uuid::Uuid;

use crate::config::{EngineConfig, TranscriptionSettings};

/// Sample rate all realtime/microphone audio is fed at: 16 kHz mono
/// 16-bit PCM.
pub(crate) const SAMPLE_RATE_HZ: u32 = 16_000;
const BYTES_PER_SAMPLE: usize = 2;

/// One streaming transcription session's buffer and scheduling state.
pub struct RealtimeSession {
    /// Session id.
    pub id: Uuid,
    /// Settings this session was started with.
    pub settings: TranscriptionSettings,
    /// Whether audio arrives from the system microphone rather than an
    /// external producer calling `feed_audio_data` directly.
    pub is_microphone_session: bool,
    /// Whether the session is still accepting audio.
    pub is_active: bool,
    /// Normalized volume of the most recently fed chunk, in `[0, 1]`.
    pub current_volume: f32,
    buffer: VecDeque<u8>,
    max_buffer_bytes: usize,
    last_processed_offset: usize,
    session_start: Instant,
    segment_start: Instant,
    emit_threshold: Duration,
    min_emit_audio: Duration,
}

impl RealtimeSession {
    /// Start a new session with an empty buffer.
    #[must_use]
    pub fn new(id: Uuid, settings: TranscriptionSettings, is_microphone_session: bool, config: &EngineConfig) -> Self {
        let now = Instant::now();
        Self {
            id,
            settings,
            is_microphone_session,
            is_active: true,
            current_volume: 0.0,
            buffer: VecDeque::new(),
            max_buffer_bytes: config.realtime_buffer_bytes,
            last_processed_offset: 0,
            session_start: now,
            segment_start: now,
            emit_threshold: config.realtime_emit_threshold,
            min_emit_audio: config.realtime_min_emit_audio,
        }
    }

    /// Append raw 16-bit PCM bytes, computing this chunk's volume level
    /// (`mean(|sample|) / 32768`) and applying the overflow drop policy:
    /// a chunk that would push the buffer past capacity clears the whole
    /// buffer first and resets `lastProcessedOffset` to zero.
    pub fn feed_audio_data(&mut self, bytes: &[u8]) {
        self.current_volume = compute_volume(bytes);

        if self.buffer.len() + bytes.len() > self.max_buffer_bytes {
            self.buffer.clear();
            self.last_processed_offset = 0;
        }
        self.buffer.extend(bytes.iter().copied());
    }

    /// Unprocessed audio duration currently buffered.
    #[must_use]
    pub fn unprocessed_duration(&self) -> Duration {
        let samples = (self.buffer.len() - self.last_processed_offset) / BYTES_PER_SAMPLE;
        Duration::from_secs_f64(samples as f64 / f64::from(SAMPLE_RATE_HZ))
    }

    /// Whether the scheduler should emit a segment on this tick: either
    /// enough unprocessed audio has accumulated, or enough time has
    /// passed since the last emission with at least a minimal amount of
    /// audio available.
    #[must_use]
    pub fn should_emit(&self) -> bool {
        let unprocessed = self.unprocessed_duration();
        if unprocessed >= self.emit_threshold {
            return true;
        }
        self.segment_start.elapsed() >= self.emit_threshold && unprocessed >= self.min_emit_audio
    }

    /// Byte offset within the session's full audio stream where the
    /// unprocessed suffix begins, used to offset emitted segment
    /// timestamps by the session's elapsed time at that point.
    #[must_use]
    pub fn pending_offset_ms(&self) -> u64 {
        let samples = self.last_processed_offset / BYTES_PER_SAMPLE;
        (samples as u64 * 1_000) / u64::from(SAMPLE_RATE_HZ)
    }

    /// Copy the unprocessed suffix as `[-1, 1]` f32 PCM for inference.
    #[must_use]
    pub fn take_unprocessed_as_f32(&self) -> Vec<f32> {
        self.buffer
            .iter()
            .copied()
            .skip(self.last_processed_offset)
            .collect::<Vec<u8>>()
            .chunks_exact(BYTES_PER_SAMPLE)
            .map(|chunk| f32::from(i16::from_le_bytes([chunk[0], chunk[1]])) / 32_768.0)
            .collect()
    }

    /// Advance `lastProcessedOffset` to the current buffer end and reset
    /// the segment timer.
    pub fn mark_processed(&mut self) {
        self.last_processed_offset = self.buffer.len();
        self.segment_start = Instant::now();
    }

    /// Milliseconds elapsed since the session started, used as the base
    /// offset for emitted segment timestamps.
    #[must_use]
    pub fn elapsed_ms(&self) -> u64 {
        self.session_start.elapsed().as_millis() as u64
    }

    /// Stop accepting further audio.
    pub fn stop(&mut self) {
        self.is_active = false;
    }
}

fn compute_volume(bytes: &[u8]) -> f32 {
    if bytes.len() < BYTES_PER_SAMPLE {
        return 0.0;
    }
    let samples: Vec<i16> = bytes
        .chunks_exact(BYTES_PER_SAMPLE)
        .map(|chunk| i16::from_le_bytes([chunk[0], chunk[1]]))
        .collect();
    if samples.is_empty() {
        return 0.0;
    }
    let mean_abs: f64 = samples.iter().map(|sample| f64::from(sample.unsigned_abs())).sum::<f64>()
        / samples.len() as f64;
    (mean_abs / 32_768.0) as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn samples_to_bytes(samples: &[i16]) -> Vec<u8> {
        samples.iter().flat_map(|sample| sample.to_le_bytes()).collect()
    }

    #[test]
    fn feed_audio_data_computes_volume() {
        let config = EngineConfig::default();
        let mut session = RealtimeSession::new(Uuid::new_v4(), TranscriptionSettings::default(), false, &config);
        session.feed_audio_data(&samples_to_bytes(&[16_384, -16_384, 16_384, -16_384]));
        assert!(session.current_volume > 0.49 && session.current_volume < 0.51);
    }

    #[test]
    fn overflow_clears_buffer_and_resets_offset() {
        let mut config = EngineConfig::default();
        config.realtime_buffer_bytes = 8;
        let mut session = RealtimeSession::new(Uuid::new_v4(), TranscriptionSettings::default(), false, &config);
        session.feed_audio_data(&[0; 4]);
        session.mark_processed();
        session.feed_audio_data(&[1; 8]);
        assert_eq!(session.pending_offset_ms(), 0);
    }

    #[test]
    fn should_emit_true_once_five_seconds_of_audio_buffered() {
        let config = EngineConfig::default();
        let mut session = RealtimeSession::new(Uuid::new_v4(), TranscriptionSettings::default(), false, &config);
        let five_seconds_of_silence = vec![0_u8; SAMPLE_RATE_HZ as usize * BYTES_PER_SAMPLE * 5];
        session.feed_audio_data(&five_seconds_of_silence);
        assert!(session.should_emit());
    }
}
