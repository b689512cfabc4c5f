//! Small `ffmpeg`/`ffprobe` helpers shared by file, video, and
//! language-detection transcription.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use tokio::process::Command;
use uuid::Uuid;

use crate::error::TranscriptionError;

const RECOGNIZED_EXTENSIONS: &[&str] = &[
    "wav", "mp3", "flac", "ogg", "m4a", "aac", "mp4", "mkv", "mov", "avi", "webm",
];

/// Reject paths that do not exist or carry an unrecognized extension.
pub(crate) fn validate_media_path(path: &Path) -> Result<(), TranscriptionError> {
    if !path.is_file() {
        return Err(TranscriptionError::InvalidInput);
    }
    let recognized = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| RECOGNIZED_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()));
    if recognized {
        Ok(())
    } else {
        Err(TranscriptionError::InvalidInput)
    }
}

/// Probe duration via `ffprobe`'s compact key-value output, in
/// milliseconds; used both as the progress denominator and to feed
/// [`crate::stats::PerformanceStats`].
pub(crate) async fn probe_duration_ms(path: &Path) -> Result<u64, TranscriptionError> {
    let output = Command::new("ffprobe")
        .arg("-v")
        .arg("error")
        .arg("-show_entries")
        .arg("format=duration")
        .arg("-of")
        .arg("default=noprint_wrappers=1:nokey=1")
        .arg(path)
        .stdin(Stdio::null())
        .output()
        .await
        .map_err(|_| TranscriptionError::EncoderFailed)?;

    if !output.status.success() {
        return Err(TranscriptionError::EncoderFailed);
    }
    let text = String::from_utf8_lossy(&output.stdout);
    let seconds: f64 = text.trim().parse().map_err(|_| TranscriptionError::EncoderFailed)?;
    Ok((seconds * 1_000.0).round() as u64)
}

/// Extract audio from `path` into a 16 kHz mono 16-bit PCM WAV file in a
/// fresh temp directory, returning the temp file's path. The caller is
/// responsible for removing it once done.
pub(crate) async fn extract_audio_to_temp_wav(path: &Path) -> Result<PathBuf, TranscriptionError> {
    let temp_path = std::env::temp_dir().join(format!("vellum-transcribe-{}.wav", Uuid::new_v4()));

    let status = Command::new("ffmpeg")
        .arg("-nostdin")
        .arg("-loglevel")
        .arg("error")
        .arg("-y")
        .arg("-i")
        .arg(path)
        .arg("-ac")
        .arg("1")
        .arg("-ar")
        .arg("16000")
        .arg("-sample_fmt")
        .arg("s16")
        .arg(&temp_path)
        .stdin(Stdio::null())
        .status()
        .await
        .map_err(|_| TranscriptionError::EncoderFailed)?;

    if status.success() {
        Ok(temp_path)
    } else {
        let _ = tokio::fs::remove_file(&temp_path).await;
        Err(TranscriptionError::EncoderFailed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_media_path_rejects_unrecognized_extension() {
        let dir = vellum_test_support::temp_dir();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, b"hello").unwrap();
        assert_eq!(validate_media_path(&path), Err(TranscriptionError::InvalidInput));
    }

    #[test]
    fn validate_media_path_rejects_missing_file() {
        let path = PathBuf::from("/nonexistent/clip.wav");
        assert_eq!(validate_media_path(&path), Err(TranscriptionError::InvalidInput));
    }
}
