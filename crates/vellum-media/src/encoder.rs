//! Low-level `ffmpeg`/`ffprobe` subprocess invocations. Pure glue: no
//! state, no cancellation bookkeeping (that lives in [`crate::pipeline`]).

use std::path::Path;
use std::process::Stdio;
use std::time::Instant;

use serde_json::Value;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, Command};
use tokio_util::sync::CancellationToken;

use crate::error::MediaError;
use crate::events::ProgressSnapshot;
use crate::model::{ConvertOptions, ExtractAudioOptions, ThumbnailOptions, VideoAnalysis};

/// Probe `path` via `ffprobe -print_format json -show_format -show_streams`
/// and map the result into a [`VideoAnalysis`].
///
/// # Errors
///
/// Returns [`MediaError::InvalidFile`] if `ffprobe` cannot be started, exits
/// non-zero, or its output does not carry a parseable video stream.
pub(crate) async fn probe_video(path: &Path) -> Result<VideoAnalysis, MediaError> {
    let output = Command::new("ffprobe")
        .arg("-v")
        .arg("error")
        .arg("-print_format")
        .arg("json")
        .arg("-show_format")
        .arg("-show_streams")
        .arg(path)
        .stdin(Stdio::null())
        .output()
        .await
        .map_err(|_| MediaError::InvalidFile)?;

    if !output.status.success() {
        return Err(MediaError::InvalidFile);
    }
    let parsed: Value = serde_json::from_slice(&output.stdout).map_err(|_| MediaError::InvalidFile)?;
    parse_probe_json(path, &parsed)
}

fn parse_probe_json(path: &Path, value: &Value) -> Result<VideoAnalysis, MediaError> {
    let format = value.get("format").ok_or(MediaError::InvalidFile)?;
    let streams = value.get("streams").and_then(Value::as_array).ok_or(MediaError::InvalidFile)?;

    let video_stream = streams
        .iter()
        .find(|s| s.get("codec_type").and_then(Value::as_str) == Some("video"))
        .ok_or(MediaError::InvalidFile)?;
    let audio_stream = streams.iter().find(|s| s.get("codec_type").and_then(Value::as_str) == Some("audio"));

    let duration_secs: f64 = format
        .get("duration")
        .and_then(Value::as_str)
        .and_then(|s| s.parse().ok())
        .unwrap_or(0.0);

    Ok(VideoAnalysis {
        file_path: path.to_string_lossy().into_owned(),
        format: format.get("format_name").and_then(Value::as_str).unwrap_or_default().to_string(),
        duration_ms: (duration_secs * 1_000.0).round() as u64,
        file_size: format.get("size").and_then(Value::as_str).and_then(|s| s.parse().ok()).unwrap_or(0),
        width: video_stream.get("width").and_then(Value::as_u64).unwrap_or(0) as u32,
        height: video_stream.get("height").and_then(Value::as_u64).unwrap_or(0) as u32,
        frame_rate: parse_frame_rate(video_stream.get("r_frame_rate").and_then(Value::as_str)),
        codec: video_stream.get("codec_name").and_then(Value::as_str).unwrap_or_default().to_string(),
        bitrate: format.get("bit_rate").and_then(Value::as_str).and_then(|s| s.parse().ok()),
        has_audio: audio_stream.is_some(),
        audio_codec: audio_stream.and_then(|s| s.get("codec_name")).and_then(Value::as_str).map(str::to_string),
        audio_channels: audio_stream.and_then(|s| s.get("channels")).and_then(Value::as_u64).map(|v| v as u32),
        audio_sample_rate: audio_stream
            .and_then(|s| s.get("sample_rate"))
            .and_then(Value::as_str)
            .and_then(|s| s.parse().ok()),
    })
}

/// `ffprobe` reports frame rate as a rational string like `"30000/1001"`.
fn parse_frame_rate(raw: Option<&str>) -> f64 {
    let Some(raw) = raw else { return 0.0 };
    match raw.split_once('/') {
        Some((num, den)) => {
            let (num, den): (f64, f64) = (num.parse().unwrap_or(0.0), den.parse().unwrap_or(1.0));
            if den == 0.0 { 0.0 } else { num / den }
        }
        None => raw.parse().unwrap_or(0.0),
    }
}

/// Build the `ffmpeg` argument list for a convert operation. Pure
/// function so the mapping from [`ConvertOptions`] to encoder flags is
/// unit-testable without spawning a subprocess.
#[must_use]
pub(crate) fn build_convert_args(input: &Path, output: &Path, options: &ConvertOptions) -> Vec<String> {
    let mut args = vec!["-nostdin".to_string(), "-y".to_string(), "-i".to_string(), path_arg(input)];

    if let Some(codec) = &options.video_codec {
        args.extend(["-c:v".to_string(), codec.clone()]);
    }
    if let Some(codec) = &options.audio_codec {
        args.extend(["-c:a".to_string(), codec.clone()]);
    }
    if let Some(bitrate) = options.video_bitrate {
        args.extend(["-b:v".to_string(), format!("{bitrate}")]);
    }
    if let Some(bitrate) = options.audio_bitrate {
        args.extend(["-b:a".to_string(), format!("{bitrate}")]);
    }
    if options.max_width.is_some() || options.max_height.is_some() {
        let width = options.max_width.map_or("-2".to_string(), |w| w.to_string());
        let height = options.max_height.map_or("-2".to_string(), |h| h.to_string());
        args.extend(["-vf".to_string(), format!("scale='min({width},iw)':'min({height},ih)'")]);
    }
    if options.preserve_quality {
        args.extend(["-preset".to_string(), "slow".to_string()]);
    }
    args.extend(options.custom_options.iter().cloned());
    args.extend(["-progress".to_string(), "pipe:1".to_string(), "-nostats".to_string()]);
    args.push(path_arg(output));
    args
}

/// Run an already-built `ffmpeg` argument list, streaming `-progress
/// pipe:1` key/value blocks to `on_progress` as they arrive, honoring
/// `cancel`.
///
/// # Errors
///
/// Returns [`MediaError::Cancelled`] if `cancel` fires before the child
/// exits, or [`MediaError::ProcessingFailed`] if the subprocess cannot be
/// started or exits non-zero.
pub(crate) async fn run_ffmpeg(
    args: &[String],
    total_frames: Option<u64>,
    cancel: &CancellationToken,
    mut on_progress: impl FnMut(ProgressSnapshot),
) -> Result<(), MediaError> {
    let mut child = Command::new("ffmpeg")
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .kill_on_drop(true)
        .spawn()
        .map_err(|_| MediaError::ProcessingFailed)?;

    let stdout = child.stdout.take().expect("stdout was piped");
    let mut lines = BufReader::new(stdout).lines();
    let started = Instant::now();
    let mut block = ProgressBlock::default();

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => {
                kill_and_wait(&mut child).await;
                return Err(MediaError::Cancelled);
            }
            line = lines.next_line() => {
                match line {
                    Ok(Some(line)) => {
                        if let Some((key, value)) = line.split_once('=') {
                            block.apply(key, value);
                            if key == "progress" {
                                let snapshot = block.snapshot(started.elapsed().as_millis() as u64, total_frames);
                                on_progress(snapshot);
                                block = ProgressBlock::default();
                            }
                        }
                    }
                    Ok(None) => break,
                    Err(_) => break,
                }
            }
        }
    }

    let status = child.wait().await.map_err(|_| MediaError::ProcessingFailed)?;
    if status.success() {
        Ok(())
    } else {
        Err(MediaError::ProcessingFailed)
    }
}

/// Accumulated fields of one `-progress pipe:1` key/value block.
#[derive(Debug, Default)]
struct ProgressBlock {
    frame: Option<u64>,
    fps: Option<f64>,
}

impl ProgressBlock {
    fn apply(&mut self, key: &str, value: &str) {
        match key {
            "frame" => self.frame = value.trim().parse().ok(),
            "fps" => self.fps = value.trim().parse().ok(),
            _ => {}
        }
    }

    fn snapshot(&self, elapsed_ms: u64, total_frames: Option<u64>) -> ProgressSnapshot {
        let estimated_remaining_ms = match (self.frame, self.fps, total_frames) {
            (Some(frame), Some(fps), Some(total)) if fps > 0.0 && total > frame => {
                Some((((total - frame) as f64 / fps) * 1_000.0) as u64)
            }
            _ => None,
        };
        ProgressSnapshot {
            processed_frames: self.frame,
            total_frames,
            current_fps: self.fps,
            elapsed_ms,
            estimated_remaining_ms,
        }
    }
}

async fn kill_and_wait(child: &mut Child) {
    let _ = child.start_kill();
    let _ = child.wait().await;
}

/// Extract audio from `input` into `output` per `options`.
///
/// # Errors
///
/// See [`run_ffmpeg`].
pub(crate) async fn run_extract_audio(
    input: &Path,
    output: &Path,
    options: &ExtractAudioOptions,
    cancel: &CancellationToken,
) -> Result<(), MediaError> {
    let args = vec![
        "-nostdin".to_string(),
        "-y".to_string(),
        "-i".to_string(),
        path_arg(input),
        "-vn".to_string(),
        "-ac".to_string(),
        options.channels.to_string(),
        "-ar".to_string(),
        options.sample_rate.to_string(),
        "-sample_fmt".to_string(),
        bit_depth_sample_fmt(options.bit_depth).to_string(),
        "-progress".to_string(),
        "pipe:1".to_string(),
        "-nostats".to_string(),
        path_arg(output),
    ];
    run_ffmpeg(&args, None, cancel, |_| {}).await
}

const fn bit_depth_sample_fmt(bit_depth: u16) -> &'static str {
    match bit_depth {
        8 => "u8",
        24 => "s32",
        32 => "s32",
        _ => "s16",
    }
}

/// Seek to `options.time_offset_secs` and write a single frame to `output`.
///
/// # Errors
///
/// Returns [`MediaError::ProcessingFailed`] if `ffmpeg` cannot be started
/// or exits non-zero.
pub(crate) async fn run_thumbnail(input: &Path, output: &Path, options: &ThumbnailOptions) -> Result<(), MediaError> {
    let mut args = vec![
        "-nostdin".to_string(),
        "-y".to_string(),
        "-ss".to_string(),
        format!("{:.3}", options.time_offset_secs),
        "-i".to_string(),
        path_arg(input),
        "-frames:v".to_string(),
        "1".to_string(),
    ];
    if options.width.is_some() || options.height.is_some() {
        let width = options.width.map_or("-2".to_string(), |w| w.to_string());
        let height = options.height.map_or("-2".to_string(), |h| h.to_string());
        args.extend(["-vf".to_string(), format!("scale={width}:{height}")]);
    }
    args.push(path_arg(output));

    let status = Command::new("ffmpeg")
        .args(&args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await
        .map_err(|_| MediaError::ProcessingFailed)?;

    if status.success() {
        Ok(())
    } else {
        Err(MediaError::ProcessingFailed)
    }
}

fn path_arg(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_frame_rate_handles_rational_string() {
        assert!((parse_frame_rate(Some("30000/1001")) - 29.97).abs() < 0.01);
    }

    #[test]
    fn parse_frame_rate_handles_missing_value() {
        assert_eq!(parse_frame_rate(None), 0.0);
    }

    #[test]
    fn build_convert_args_includes_scale_filter_for_max_dimensions() {
        let options = ConvertOptions {
            output_format: "mp4".to_string(),
            max_width: Some(1280),
            max_height: Some(720),
            ..ConvertOptions::default()
        };
        let args = build_convert_args(Path::new("in.mov"), Path::new("out.mp4"), &options);
        assert!(args.iter().any(|a| a.contains("scale=")));
    }

    #[test]
    fn build_convert_args_appends_custom_options_before_output() {
        let options = ConvertOptions {
            output_format: "mp4".to_string(),
            custom_options: vec!["-movflags".to_string(), "+faststart".to_string()],
            ..ConvertOptions::default()
        };
        let args = build_convert_args(Path::new("in.mov"), Path::new("out.mp4"), &options);
        let custom_pos = args.iter().position(|a| a == "-movflags").unwrap();
        let output_pos = args.iter().position(|a| a == "out.mp4").unwrap();
        assert!(custom_pos < output_pos);
    }

    #[test]
    fn progress_block_estimates_remaining_from_fps_and_total() {
        let mut block = ProgressBlock::default();
        block.apply("frame", "30");
        block.apply("fps", "30.0");
        let snapshot = block.snapshot(1_000, Some(60));
        assert_eq!(snapshot.estimated_remaining_ms, Some(1_000));
    }
}
