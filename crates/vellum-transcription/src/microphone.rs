//! System default microphone capture, bridged into a realtime session's
//! `feed_audio_data`.
//!
//! `cpal::Stream` is `!Send`, so capture runs on a dedicated OS thread
//! that owns it for the session's lifetime. Captured chunks cross into
//! the async world over a `std::sync::mpsc` channel, forwarded by a
//! second blocking thread into a `tokio::sync::mpsc` channel an async
//! task drains.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use tokio::sync::mpsc::unbounded_channel;
use tracing::{error, warn};
use uuid::Uuid;

use crate::engine::TranscriptionEngine;
use crate::error::{TranscriptionError, TranscriptionResult};

/// Start capture for session `id` and return a flag the engine sets to
/// request the capture thread stop.
///
/// # Errors
///
/// Returns [`TranscriptionError::EncoderFailed`] if no default input
/// device or no supported input config is available.
pub(crate) fn spawn_capture(id: Uuid, engine: Arc<TranscriptionEngine>) -> TranscriptionResult<Arc<AtomicBool>> {
    let host = cpal::default_host();
    let device = host.default_input_device().ok_or(TranscriptionError::EncoderFailed)?;
    let supported = device.default_input_config().map_err(|_| TranscriptionError::EncoderFailed)?;
    let channels = supported.channels();
    let sample_format = supported.sample_format();
    let config: cpal::StreamConfig = supported.config();

    let stop = Arc::new(AtomicBool::new(false));
    let (std_tx, std_rx) = std::sync::mpsc::channel::<Vec<u8>>();
    let (tokio_tx, mut tokio_rx) = unbounded_channel::<Vec<u8>>();

    let stop_for_capture = Arc::clone(&stop);
    std::thread::spawn(move || {
        let error_callback = |err: cpal::StreamError| warn!(%err, "microphone input stream error");

        let stream = match sample_format {
            cpal::SampleFormat::F32 => device.build_input_stream(
                &config,
                move |data: &[f32], _: &_| {
                    let _ = std_tx.send(downmix_to_pcm16(data, channels));
                },
                error_callback,
                None,
            ),
            cpal::SampleFormat::I16 => device.build_input_stream(
                &config,
                move |data: &[i16], _: &_| {
                    let mono = downmix_i16(data, channels);
                    let bytes: Vec<u8> = mono.iter().flat_map(|sample| sample.to_le_bytes()).collect();
                    let _ = std_tx.send(bytes);
                },
                error_callback,
                None,
            ),
            _ => {
                error!("unsupported microphone sample format");
                return;
            }
        };

        let Ok(stream) = stream else {
            error!("failed to build microphone input stream");
            return;
        };
        if stream.play().is_err() {
            error!("failed to start microphone input stream");
            return;
        }

        while !stop_for_capture.load(Ordering::SeqCst) {
            std::thread::sleep(std::time::Duration::from_millis(100));
        }
        drop(stream);
    });

    // Bridges the synchronous capture channel into the async world; exits
    // once the capture thread drops `std_tx` on stop.
    std::thread::spawn(move || {
        while let Ok(chunk) = std_rx.recv() {
            if tokio_tx.send(chunk).is_err() {
                break;
            }
        }
    });

    tokio::spawn(async move {
        while let Some(chunk) = tokio_rx.recv().await {
            if engine.feed_audio_data(id, &chunk).await.is_err() {
                break;
            }
        }
    });

    Ok(stop)
}

fn downmix_to_pcm16(data: &[f32], channels: u16) -> Vec<u8> {
    let channels = usize::from(channels).max(1);
    data.chunks(channels)
        .map(|frame| {
            let mean = frame.iter().sum::<f32>() / frame.len() as f32;
            (mean.clamp(-1.0, 1.0) * 32_767.0) as i16
        })
        .flat_map(|sample| sample.to_le_bytes())
        .collect()
}

fn downmix_i16(data: &[i16], channels: u16) -> Vec<i16> {
    let channels = usize::from(channels).max(1);
    data.chunks(channels)
        .map(|frame| {
            let sum: i32 = frame.iter().map(|sample| i32::from(*sample)).sum();
            (sum / frame.len() as i32) as i16
        })
        .collect()
}

/// Decode a WAV file produced by `ffmpeg` at 16 kHz mono to `[-1, 1]`
/// f32 PCM by locating the `data` chunk and reinterpreting the rest of
/// the file as little-endian 16-bit samples.
pub(crate) async fn read_wav_as_f32(path: &std::path::Path) -> TranscriptionResult<Vec<f32>> {
    let bytes = tokio::fs::read(path).await.map_err(|_| TranscriptionError::EncoderFailed)?;
    let data_start = bytes
        .windows(4)
        .position(|window| window == b"data")
        .map(|pos| pos + 8)
        .ok_or(TranscriptionError::EncoderFailed)?;
    if data_start > bytes.len() {
        return Err(TranscriptionError::EncoderFailed);
    }
    Ok(bytes[data_start..]
        .chunks_exact(2)
        .map(|chunk| f32::from(i16::from_le_bytes([chunk[0], chunk[1]])) / 32_768.0)
        .collect())
}
