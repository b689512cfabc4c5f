//! Aggregate performance statistics across all completed transcriptions.

/// Cumulative counters updated after every successful file/video
/// transcription.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PerformanceStats {
    /// Total number of transcriptions completed since engine start.
    pub total_transcriptions: u64,
    /// Sum of wall-clock processing time across all transcriptions, ms.
    pub total_processing_time_ms: u64,
    /// Sum of transcribed audio duration across all transcriptions, ms.
    pub total_audio_duration_ms: u64,
    /// Cumulative average of `processingTime / audioDuration`.
    pub average_real_time_factor: f64,
}

impl PerformanceStats {
    /// Fold in one completed transcription's timings.
    pub fn record(&mut self, processing_time_ms: u64, audio_duration_ms: u64) {
        self.total_transcriptions += 1;
        self.total_processing_time_ms += processing_time_ms;
        self.total_audio_duration_ms += audio_duration_ms;

        if audio_duration_ms == 0 {
            return;
        }
        let sample = processing_time_ms as f64 / audio_duration_ms as f64;
        let count = self.total_transcriptions as f64;
        self.average_real_time_factor += (sample - self.average_real_time_factor) / count;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_computes_cumulative_average_real_time_factor() {
        let mut stats = PerformanceStats::default();
        stats.record(1_000, 2_000);
        stats.record(3_000, 2_000);
        assert_eq!(stats.total_transcriptions, 2);
        assert!((stats.average_real_time_factor - 1.0).abs() < 1e-9);
    }

    #[test]
    fn record_ignores_zero_duration_audio_for_rtf() {
        let mut stats = PerformanceStats::default();
        stats.record(500, 0);
        assert_eq!(stats.total_transcriptions, 1);
        assert_eq!(stats.average_real_time_factor, 0.0);
    }
}
