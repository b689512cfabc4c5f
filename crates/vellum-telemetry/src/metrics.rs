//! Prometheus-backed metrics registry shared across the engines.

use std::sync::Arc;

use anyhow::Result;
use prometheus::{Encoder, IntCounter, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};

/// Process-wide metrics registry.
///
/// Cloning is cheap; all clones share the same underlying collectors.
#[derive(Clone)]
pub struct Metrics {
    inner: Arc<Inner>,
}

struct Inner {
    registry: Registry,
    downloads_started_total: IntCounter,
    downloads_completed_total: IntCounter,
    downloads_failed_total: IntCounterVec,
    downloads_active: IntGauge,
    bytes_downloaded_total: IntCounter,
    transcriptions_started_total: IntCounter,
    transcriptions_completed_total: IntCounter,
    transcriptions_failed_total: IntCounterVec,
    transcriptions_active: IntGauge,
    retries_attempted_total: IntCounterVec,
    retries_exhausted_total: IntCounterVec,
    circuit_breaker_trips_total: IntCounterVec,
    media_operations_active: IntGauge,
    media_operations_completed_total: IntCounterVec,
}

impl Metrics {
    /// Construct a fresh registry with every collector registered.
    ///
    /// # Errors
    ///
    /// Returns an error if any collector fails to register (e.g. a name
    /// collision), which should only happen if this constructor is called
    /// twice against the same [`Registry`].
    pub fn new() -> Result<Self> {
        let registry = Registry::new();

        let downloads_started_total = IntCounter::with_opts(Opts::new(
            "downloads_started_total",
            "Total downloads started by the download manager",
        ))?;
        let downloads_completed_total = IntCounter::with_opts(Opts::new(
            "downloads_completed_total",
            "Total downloads that completed and passed checksum verification",
        ))?;
        let downloads_failed_total = IntCounterVec::new(
            Opts::new("downloads_failed_total", "Total downloads that failed"),
            &["reason"],
        )?;
        let downloads_active = IntGauge::with_opts(Opts::new(
            "downloads_active",
            "Downloads currently in flight",
        ))?;
        let bytes_downloaded_total = IntCounter::with_opts(Opts::new(
            "bytes_downloaded_total",
            "Total bytes received across all downloads",
        ))?;
        let transcriptions_started_total = IntCounter::with_opts(Opts::new(
            "transcriptions_started_total",
            "Total transcription tasks started",
        ))?;
        let transcriptions_completed_total = IntCounter::with_opts(Opts::new(
            "transcriptions_completed_total",
            "Total transcription tasks completed successfully",
        ))?;
        let transcriptions_failed_total = IntCounterVec::new(
            Opts::new(
                "transcriptions_failed_total",
                "Total transcription tasks that failed",
            ),
            &["reason"],
        )?;
        let transcriptions_active = IntGauge::with_opts(Opts::new(
            "transcriptions_active",
            "Transcription tasks currently running",
        ))?;
        let retries_attempted_total = IntCounterVec::new(
            Opts::new("retries_attempted_total", "Total retry attempts made"),
            &["component"],
        )?;
        let retries_exhausted_total = IntCounterVec::new(
            Opts::new(
                "retries_exhausted_total",
                "Total retry operations that exhausted their attempt budget",
            ),
            &["component"],
        )?;
        let circuit_breaker_trips_total = IntCounterVec::new(
            Opts::new(
                "circuit_breaker_trips_total",
                "Total times a component's circuit breaker tripped open",
            ),
            &["component"],
        )?;
        let media_operations_active = IntGauge::with_opts(Opts::new(
            "media_operations_active",
            "Media pipeline operations currently running",
        ))?;
        let media_operations_completed_total = IntCounterVec::new(
            Opts::new(
                "media_operations_completed_total",
                "Total media pipeline operations completed by kind and outcome",
            ),
            &["kind", "outcome"],
        )?;

        registry.register(Box::new(downloads_started_total.clone()))?;
        registry.register(Box::new(downloads_completed_total.clone()))?;
        registry.register(Box::new(downloads_failed_total.clone()))?;
        registry.register(Box::new(downloads_active.clone()))?;
        registry.register(Box::new(bytes_downloaded_total.clone()))?;
        registry.register(Box::new(transcriptions_started_total.clone()))?;
        registry.register(Box::new(transcriptions_completed_total.clone()))?;
        registry.register(Box::new(transcriptions_failed_total.clone()))?;
        registry.register(Box::new(transcriptions_active.clone()))?;
        registry.register(Box::new(retries_attempted_total.clone()))?;
        registry.register(Box::new(retries_exhausted_total.clone()))?;
        registry.register(Box::new(circuit_breaker_trips_total.clone()))?;
        registry.register(Box::new(media_operations_active.clone()))?;
        registry.register(Box::new(media_operations_completed_total.clone()))?;

        Ok(Self {
            inner: Arc::new(Inner {
                registry,
                downloads_started_total,
                downloads_completed_total,
                downloads_failed_total,
                downloads_active,
                bytes_downloaded_total,
                transcriptions_started_total,
                transcriptions_completed_total,
                transcriptions_failed_total,
                transcriptions_active,
                retries_attempted_total,
                retries_exhausted_total,
                circuit_breaker_trips_total,
                media_operations_active,
                media_operations_completed_total,
            }),
        })
    }

    /// Record a download starting.
    pub fn download_started(&self) {
        self.inner.downloads_started_total.inc();
        self.inner.downloads_active.inc();
    }

    /// Record a download completing, successfully or not.
    pub fn download_finished(&self, outcome: Result<(), &str>) {
        self.inner.downloads_active.dec();
        match outcome {
            Ok(()) => self.inner.downloads_completed_total.inc(),
            Err(reason) => self
                .inner
                .downloads_failed_total
                .with_label_values(&[reason])
                .inc(),
        }
    }

    /// Record bytes received for an in-progress download.
    pub fn bytes_downloaded(&self, bytes: u64) {
        self.inner.bytes_downloaded_total.inc_by(bytes);
    }

    /// Record a transcription task starting.
    pub fn transcription_started(&self) {
        self.inner.transcriptions_started_total.inc();
        self.inner.transcriptions_active.inc();
    }

    /// Record a transcription task completing, successfully or not.
    pub fn transcription_finished(&self, outcome: Result<(), &str>) {
        self.inner.transcriptions_active.dec();
        match outcome {
            Ok(()) => self.inner.transcriptions_completed_total.inc(),
            Err(reason) => self
                .inner
                .transcriptions_failed_total
                .with_label_values(&[reason])
                .inc(),
        }
    }

    /// Record a retry attempt for the named component.
    pub fn retry_attempted(&self, component: &str) {
        self.inner
            .retries_attempted_total
            .with_label_values(&[component])
            .inc();
    }

    /// Record a retry operation exhausting its attempt budget.
    pub fn retry_exhausted(&self, component: &str) {
        self.inner
            .retries_exhausted_total
            .with_label_values(&[component])
            .inc();
    }

    /// Record a circuit breaker tripping open for the named component.
    pub fn circuit_breaker_tripped(&self, component: &str) {
        self.inner
            .circuit_breaker_trips_total
            .with_label_values(&[component])
            .inc();
    }

    /// Record a media pipeline operation starting.
    pub fn media_operation_started(&self) {
        self.inner.media_operations_active.inc();
    }

    /// Record a media pipeline operation completing.
    pub fn media_operation_finished(&self, kind: &str, outcome: &str) {
        self.inner.media_operations_active.dec();
        self.inner
            .media_operations_completed_total
            .with_label_values(&[kind, outcome])
            .inc();
    }

    /// Encode the registry in the Prometheus text exposition format.
    ///
    /// # Errors
    ///
    /// Returns an error if the encoder fails to serialize any collector.
    pub fn encode(&self) -> Result<String> {
        let families = self.inner.registry.gather();
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&families, &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn download_lifecycle_updates_counters() {
        let metrics = Metrics::new().expect("metrics registry");
        metrics.download_started();
        metrics.bytes_downloaded(1024);
        metrics.download_finished(Ok(()));
        let text = metrics.encode().expect("encode");
        assert!(text.contains("downloads_started_total 1"));
        assert!(text.contains("downloads_completed_total 1"));
        assert!(text.contains("downloads_active 0"));
        assert!(text.contains("bytes_downloaded_total 1024"));
    }

    #[test]
    fn failure_paths_use_labeled_counters() {
        let metrics = Metrics::new().expect("metrics registry");
        metrics.download_started();
        metrics.download_finished(Err("checksum_mismatch"));
        metrics.circuit_breaker_tripped("DownloadManager");
        let text = metrics.encode().expect("encode");
        assert!(text.contains("reason=\"checksum_mismatch\""));
        assert!(text.contains("component=\"DownloadManager\""));
    }
}
