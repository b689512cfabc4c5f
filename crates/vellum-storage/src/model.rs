//! Row types for the storage layer's four tables.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

use crate::error::StorageError;

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, StorageError> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| StorageError::QueryFailed(sqlx::Error::Decode(
            format!("invalid RFC3339 timestamp: {value}").into(),
        )))
}

/// A torrent record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Torrent {
    /// 40-character hex info hash; primary key.
    pub info_hash: String,
    /// Human-readable name.
    pub name: String,
    /// Full magnet URI.
    pub magnet_uri: String,
    /// Total size in bytes.
    pub size: i64,
    /// When this torrent was added.
    pub date_added: DateTime<Utc>,
    /// Last time activity was observed.
    pub last_active: DateTime<Utc>,
    /// Destination directory on disk.
    pub save_path: String,
    /// Download progress in `[0, 1]`.
    pub progress: f64,
    /// Lifecycle status label (e.g. `downloading`, `seeding`, `completed`).
    pub status: String,
    /// Free-form metadata, stored as a JSON object.
    pub metadata: Value,
    /// File listing, stored as a JSON array.
    pub files: Value,
    /// Current seeder count.
    pub seeders: i64,
    /// Current leecher count.
    pub leechers: i64,
    /// Bytes downloaded.
    pub downloaded: i64,
    /// Bytes uploaded.
    pub uploaded: i64,
    /// Upload/download ratio.
    pub ratio: f64,
}

#[derive(Debug, FromRow)]
pub(crate) struct TorrentRow {
    pub info_hash: String,
    pub name: String,
    pub magnet_uri: String,
    pub size: i64,
    pub date_added: String,
    pub last_active: String,
    pub save_path: String,
    pub progress: f64,
    pub status: String,
    pub metadata: String,
    pub files: String,
    pub seeders: i64,
    pub leechers: i64,
    pub downloaded: i64,
    pub uploaded: i64,
    pub ratio: f64,
}

/// A media file derived from a torrent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Media {
    /// Primary key.
    pub id: Uuid,
    /// Owning torrent's info hash.
    pub torrent_hash: String,
    /// Path on disk.
    pub file_path: String,
    /// Original filename as it appeared in the torrent.
    pub original_name: String,
    /// MIME type.
    pub mime_type: String,
    /// Size in bytes.
    pub file_size: i64,
    /// Duration in seconds, when known.
    pub duration: Option<f64>,
    /// Pixel width, for video.
    pub width: Option<i64>,
    /// Pixel height, for video.
    pub height: Option<i64>,
    /// Frames per second, for video.
    pub frame_rate: Option<f64>,
    /// Video codec name.
    pub video_codec: Option<String>,
    /// Audio codec name.
    pub audio_codec: Option<String>,
    /// Whether a transcription exists for this media.
    pub has_transcription: bool,
    /// When this media record was added.
    pub date_added: DateTime<Utc>,
    /// Last time this media was played.
    pub last_played: Option<DateTime<Utc>>,
    /// Last playback position in seconds.
    pub playback_position: f64,
    /// Free-form metadata, stored as a JSON object.
    pub metadata: Value,
}

#[derive(Debug, FromRow)]
pub(crate) struct MediaRow {
    pub id: String,
    pub torrent_hash: String,
    pub file_path: String,
    pub original_name: String,
    pub mime_type: String,
    pub file_size: i64,
    pub duration: Option<f64>,
    pub width: Option<i64>,
    pub height: Option<i64>,
    pub frame_rate: Option<f64>,
    pub video_codec: Option<String>,
    pub audio_codec: Option<String>,
    pub has_transcription: i64,
    pub date_added: String,
    pub last_played: Option<String>,
    pub playback_position: f64,
    pub metadata: String,
}

/// A transcription result attached to a media row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transcription {
    /// Primary key.
    pub id: Uuid,
    /// Owning media row.
    pub media_id: Uuid,
    /// BCP-47 language code used.
    pub language: String,
    /// Identifier of the model used to produce this transcription.
    pub model_used: String,
    /// Full transcribed text.
    pub full_text: String,
    /// Segment timestamps, stored as a JSON array.
    pub timestamps: Value,
    /// Aggregate confidence in `[0, 1]`.
    pub confidence: f64,
    /// When this transcription was created.
    pub date_created: DateTime<Utc>,
    /// Wall-clock processing time in seconds.
    pub processing_time: f64,
    /// Lifecycle status (e.g. `pending`, `completed`, `failed`).
    pub status: String,
}

#[derive(Debug, FromRow)]
pub(crate) struct TranscriptionRow {
    pub id: String,
    pub media_id: String,
    pub language: String,
    pub model_used: String,
    pub full_text: String,
    pub timestamps: String,
    pub confidence: f64,
    pub date_created: String,
    pub processing_time: f64,
    pub status: String,
}

/// A playback session attached to a media row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    /// Primary key.
    pub session_id: Uuid,
    /// Owning media row.
    pub media_id: Uuid,
    /// When playback started.
    pub start_time: DateTime<Utc>,
    /// When playback ended, if it has.
    pub end_time: Option<DateTime<Utc>>,
    /// Playback position at session start, in seconds.
    pub start_position: f64,
    /// Playback position at session end, in seconds.
    pub end_position: f64,
    /// Total duration of the underlying media, in seconds.
    pub total_duration: f64,
    /// Whether playback reached the end of the media.
    pub completed: bool,
}

#[derive(Debug, FromRow)]
pub(crate) struct SessionRow {
    pub session_id: String,
    pub media_id: String,
    pub start_time: String,
    pub end_time: Option<String>,
    pub start_position: f64,
    pub end_position: f64,
    pub total_duration: f64,
    pub completed: i64,
}

impl TryFrom<TorrentRow> for Torrent {
    type Error = StorageError;

    fn try_from(row: TorrentRow) -> Result<Self, Self::Error> {
        Ok(Self {
            info_hash: row.info_hash,
            name: row.name,
            magnet_uri: row.magnet_uri,
            size: row.size,
            date_added: parse_timestamp(&row.date_added)?,
            last_active: parse_timestamp(&row.last_active)?,
            save_path: row.save_path,
            progress: row.progress,
            status: row.status,
            metadata: serde_json::from_str(&row.metadata)?,
            files: serde_json::from_str(&row.files)?,
            seeders: row.seeders,
            leechers: row.leechers,
            downloaded: row.downloaded,
            uploaded: row.uploaded,
            ratio: row.ratio,
        })
    }
}

impl TryFrom<MediaRow> for Media {
    type Error = StorageError;

    fn try_from(row: MediaRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Uuid::parse_str(&row.id).map_err(|_| StorageError::NotFound)?,
            torrent_hash: row.torrent_hash,
            file_path: row.file_path,
            original_name: row.original_name,
            mime_type: row.mime_type,
            file_size: row.file_size,
            duration: row.duration,
            width: row.width,
            height: row.height,
            frame_rate: row.frame_rate,
            video_codec: row.video_codec,
            audio_codec: row.audio_codec,
            has_transcription: row.has_transcription != 0,
            date_added: parse_timestamp(&row.date_added)?,
            last_played: row.last_played.as_deref().map(parse_timestamp).transpose()?,
            playback_position: row.playback_position,
            metadata: serde_json::from_str(&row.metadata)?,
        })
    }
}

impl TryFrom<TranscriptionRow> for Transcription {
    type Error = StorageError;

    fn try_from(row: TranscriptionRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Uuid::parse_str(&row.id).map_err(|_| StorageError::NotFound)?,
            media_id: Uuid::parse_str(&row.media_id).map_err(|_| StorageError::NotFound)?,
            language: row.language,
            model_used: row.model_used,
            full_text: row.full_text,
            timestamps: serde_json::from_str(&row.timestamps)?,
            confidence: row.confidence,
            date_created: parse_timestamp(&row.date_created)?,
            processing_time: row.processing_time,
            status: row.status,
        })
    }
}

impl TryFrom<SessionRow> for Session {
    type Error = StorageError;

    fn try_from(row: SessionRow) -> Result<Self, Self::Error> {
        Ok(Self {
            session_id: Uuid::parse_str(&row.session_id).map_err(|_| StorageError::NotFound)?,
            media_id: Uuid::parse_str(&row.media_id).map_err(|_| StorageError::NotFound)?,
            start_time: parse_timestamp(&row.start_time)?,
            end_time: row.end_time.as_deref().map(parse_timestamp).transpose()?,
            start_position: row.start_position,
            end_position: row.end_position,
            total_duration: row.total_duration,
            completed: row.completed != 0,
        })
    }
}

/// Aggregate counts returned by [`crate::Storage::statistics`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StorageStatistics {
    /// Total number of torrents tracked.
    pub torrent_count: i64,
    /// Total number of media files tracked.
    pub media_count: i64,
    /// Total number of transcriptions tracked.
    pub transcription_count: i64,
    /// Torrent counts keyed by `status`.
    pub torrents_by_status: Vec<(String, i64)>,
    /// Torrents added within the last hour.
    pub torrents_added_last_hour: i64,
}
