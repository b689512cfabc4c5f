//! Hardware-acceleration capability probing and negotiation.

use std::process::Stdio;

use tokio::process::Command;

/// Capability contract the pipeline depends on from a hardware
/// accelerator collaborator: report what is available, and name the
/// `ffmpeg -hwaccel` value to request for it. A no-op/software-only
/// implementation is trivially `Vec::new()`/`false`.
pub trait HardwareAccelerator: Send + Sync {
    /// Names of `ffmpeg`-recognized hardware accelerators available on
    /// this host (e.g. `"videotoolbox"`, `"cuda"`, `"vaapi"`), most
    /// preferred first.
    fn available(&self) -> &[String];

    /// Whether `codec` is supported by at least one available
    /// accelerator. The default probe does not attempt per-codec
    /// capability detection (`ffmpeg -hwaccels` does not report it), so
    /// it conservatively returns `true` whenever any accelerator is
    /// available and lets a reported encoder-initialization failure
    /// trigger the software fallback.
    fn supports_codec(&self, codec: &str) -> bool {
        let _ = codec;
        !self.available().is_empty()
    }
}

/// Probes `ffmpeg -hwaccels` once and caches the result.
#[derive(Debug, Clone, Default)]
pub struct FfmpegHardwareAccelerator {
    available: Vec<String>,
}

impl FfmpegHardwareAccelerator {
    /// Run `ffmpeg -hwaccels` and parse its output. Returns a
    /// software-only (empty) accelerator if the subprocess cannot be
    /// started or its output is unparseable, rather than failing pipeline
    /// construction.
    pub async fn probe() -> Self {
        let output = Command::new("ffmpeg")
            .arg("-hide_banner")
            .arg("-hwaccels")
            .stdin(Stdio::null())
            .output()
            .await;

        let Ok(output) = output else {
            return Self::default();
        };
        let text = String::from_utf8_lossy(&output.stdout);
        let available = text
            .lines()
            .skip(1) // first line is the "Hardware acceleration methods:" header
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect();
        Self { available }
    }

    /// Construct directly from a known list, bypassing the subprocess
    /// probe (used in tests).
    #[must_use]
    pub const fn with_available(available: Vec<String>) -> Self {
        Self { available }
    }
}

impl HardwareAccelerator for FfmpegHardwareAccelerator {
    fn available(&self) -> &[String] {
        &self.available
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn supports_codec_is_false_without_any_accelerator() {
        let accel = FfmpegHardwareAccelerator::default();
        assert!(!accel.supports_codec("h264"));
    }

    #[test]
    fn supports_codec_is_true_when_any_accelerator_is_present() {
        let accel = FfmpegHardwareAccelerator::with_available(vec!["videotoolbox".to_string()]);
        assert!(accel.supports_codec("h264"));
    }
}
