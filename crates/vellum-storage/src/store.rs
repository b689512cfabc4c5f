//! The storage layer itself: a single-writer/many-reader SQLite store.

use std::path::{Path, PathBuf};

use chrono::Utc;
use serde_json::{json, Value};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Row, SqlitePool};
use tokio::sync::Mutex;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::error::{is_valid_info_hash, StorageError, StorageResult};
use crate::model::{
    Media, MediaRow, Session, SessionRow, StorageStatistics, Torrent, TorrentRow, Transcription,
    TranscriptionRow,
};

/// Relational persistence layer for torrents, media, transcriptions, and
/// playback sessions.
///
/// Reads flow through the shared `sqlx` pool directly. Writes additionally
/// acquire `write_guard`, an application-level mutex that keeps
/// multi-statement transactions atomic against other callers even though
/// SQLite's own writer lock already serializes physical writes.
pub struct Storage {
    pool: SqlitePool,
    write_guard: Mutex<()>,
    db_path: Option<PathBuf>,
}

impl Storage {
    /// Open (creating if absent) the SQLite database at `path`, enable WAL
    /// journaling and foreign keys, and apply any pending migrations.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::MigrationFailed`] if a migration fails to
    /// apply, or a connection error wrapped in [`StorageError::QueryFailed`].
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub async fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        let options = SqliteConnectOptions::new()
            .filename(path.as_ref())
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            .foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(8)
            .connect_with(options)
            .await
            .map_err(StorageError::from)?;

        sqlx::migrate!("./migrations").run(&pool).await?;
        info!("storage layer migrations applied");

        Ok(Self {
            pool,
            write_guard: Mutex::new(()),
            db_path: Some(path.as_ref().to_path_buf()),
        })
    }

    /// Open an in-memory database, primarily for tests.
    ///
    /// # Errors
    ///
    /// See [`Storage::open`].
    pub async fn open_in_memory() -> StorageResult<Self> {
        let options = SqliteConnectOptions::new()
            .filename(":memory:")
            .foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .map_err(StorageError::from)?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Self {
            pool,
            write_guard: Mutex::new(()),
            db_path: None,
        })
    }

    /// The schema version currently applied, from `sqlx`'s own migration
    /// bookkeeping table.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn current_schema_version(&self) -> StorageResult<Option<i64>> {
        let row = sqlx::query("SELECT version FROM _sqlx_migrations ORDER BY version DESC LIMIT 1")
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|r| r.get::<i64, _>("version")))
    }

    // ---- Torrents -----------------------------------------------------

    /// Insert a new torrent row.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::InvalidHash`] if `torrent.info_hash` is not
    /// 40 hex characters, or a query error.
    pub async fn add_torrent(&self, torrent: &Torrent) -> StorageResult<()> {
        validate_torrent(torrent)?;
        let _guard = self.write_guard.lock().await;
        sqlx::query(
            "INSERT INTO torrents (info_hash, name, magnet_uri, size, date_added, last_active, \
             save_path, progress, status, metadata, files, seeders, leechers, downloaded, \
             uploaded, ratio) VALUES (?,?,?,?,?,?,?,?,?,?,?,?,?,?,?,?)",
        )
        .bind(&torrent.info_hash)
        .bind(&torrent.name)
        .bind(&torrent.magnet_uri)
        .bind(torrent.size)
        .bind(torrent.date_added.to_rfc3339())
        .bind(torrent.last_active.to_rfc3339())
        .bind(&torrent.save_path)
        .bind(torrent.progress)
        .bind(&torrent.status)
        .bind(torrent.metadata.to_string())
        .bind(torrent.files.to_string())
        .bind(torrent.seeders)
        .bind(torrent.leechers)
        .bind(torrent.downloaded)
        .bind(torrent.uploaded)
        .bind(torrent.ratio)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Fetch a torrent by info hash.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::NotFound`] if no such torrent exists.
    pub async fn get_torrent(&self, info_hash: &str) -> StorageResult<Torrent> {
        let row: TorrentRow = sqlx::query_as("SELECT * FROM torrents WHERE info_hash = ?")
            .bind(info_hash)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(StorageError::NotFound)?;
        row.try_into()
    }

    /// Update a torrent's full row in place.
    ///
    /// # Errors
    ///
    /// Returns a query error if the update fails; succeeds (no-op) if the
    /// row does not exist.
    pub async fn update_torrent(&self, torrent: &Torrent) -> StorageResult<()> {
        validate_torrent(torrent)?;
        let _guard = self.write_guard.lock().await;
        sqlx::query(
            "UPDATE torrents SET name=?, magnet_uri=?, size=?, last_active=?, save_path=?, \
             progress=?, status=?, metadata=?, files=?, seeders=?, leechers=?, downloaded=?, \
             uploaded=?, ratio=? WHERE info_hash=?",
        )
        .bind(&torrent.name)
        .bind(&torrent.magnet_uri)
        .bind(torrent.size)
        .bind(torrent.last_active.to_rfc3339())
        .bind(&torrent.save_path)
        .bind(torrent.progress)
        .bind(&torrent.status)
        .bind(torrent.metadata.to_string())
        .bind(torrent.files.to_string())
        .bind(torrent.seeders)
        .bind(torrent.leechers)
        .bind(torrent.downloaded)
        .bind(torrent.uploaded)
        .bind(torrent.ratio)
        .bind(&torrent.info_hash)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Update only `progress` and `status`, the fields that change on
    /// every tick of an active transfer.
    ///
    /// # Errors
    ///
    /// Returns a query error if the update fails.
    pub async fn update_torrent_progress(
        &self,
        info_hash: &str,
        progress: f64,
        status: &str,
    ) -> StorageResult<()> {
        if progress < 0.0 {
            return Err(StorageError::NegativeValue);
        }
        let _guard = self.write_guard.lock().await;
        sqlx::query("UPDATE torrents SET progress=?, status=?, last_active=? WHERE info_hash=?")
            .bind(progress)
            .bind(status)
            .bind(Utc::now().to_rfc3339())
            .bind(info_hash)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Remove a torrent and, via `ON DELETE CASCADE`, its dependent media,
    /// transcriptions, and sessions.
    ///
    /// # Errors
    ///
    /// Returns a query error if the delete fails.
    pub async fn remove_torrent(&self, info_hash: &str) -> StorageResult<()> {
        let _guard = self.write_guard.lock().await;
        sqlx::query("DELETE FROM torrents WHERE info_hash = ?")
            .bind(info_hash)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// List every torrent, most recently active first.
    ///
    /// # Errors
    ///
    /// Returns a query error if the fetch fails.
    pub async fn list_torrents(&self) -> StorageResult<Vec<Torrent>> {
        let rows: Vec<TorrentRow> =
            sqlx::query_as("SELECT * FROM torrents ORDER BY last_active DESC")
                .fetch_all(&self.pool)
                .await?;
        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// List torrents whose status is `downloading` or `seeding`.
    ///
    /// # Errors
    ///
    /// Returns a query error if the fetch fails.
    pub async fn list_active_torrents(&self) -> StorageResult<Vec<Torrent>> {
        let rows: Vec<TorrentRow> = sqlx::query_as(
            "SELECT * FROM torrents WHERE status IN ('downloading', 'seeding') \
             ORDER BY last_active DESC",
        )
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// Search torrents whose `name` contains `query` (case-insensitive).
    ///
    /// # Errors
    ///
    /// Returns a query error if the fetch fails.
    pub async fn search_torrents(&self, query: &str) -> StorageResult<Vec<Torrent>> {
        let pattern = like_pattern(query);
        let rows: Vec<TorrentRow> = sqlx::query_as(
            "SELECT * FROM torrents WHERE name LIKE ? ESCAPE '\\' ORDER BY last_active DESC",
        )
        .bind(pattern)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(TryInto::try_into).collect()
    }

    // ---- Media ----------------------------------------------------------

    /// Insert a new media row.
    ///
    /// # Errors
    ///
    /// Returns a query error if the insert fails (including a foreign key
    /// violation if `media.torrent_hash` does not exist).
    pub async fn add_media(&self, media: &Media) -> StorageResult<()> {
        let _guard = self.write_guard.lock().await;
        sqlx::query(
            "INSERT INTO media (id, torrent_hash, file_path, original_name, mime_type, \
             file_size, duration, width, height, frame_rate, video_codec, audio_codec, \
             has_transcription, date_added, last_played, playback_position, metadata) \
             VALUES (?,?,?,?,?,?,?,?,?,?,?,?,?,?,?,?,?)",
        )
        .bind(media.id.to_string())
        .bind(&media.torrent_hash)
        .bind(&media.file_path)
        .bind(&media.original_name)
        .bind(&media.mime_type)
        .bind(media.file_size)
        .bind(media.duration)
        .bind(media.width)
        .bind(media.height)
        .bind(media.frame_rate)
        .bind(&media.video_codec)
        .bind(&media.audio_codec)
        .bind(i64::from(media.has_transcription))
        .bind(media.date_added.to_rfc3339())
        .bind(media.last_played.map(|t| t.to_rfc3339()))
        .bind(media.playback_position)
        .bind(media.metadata.to_string())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Fetch a media row by id.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::NotFound`] if no such row exists.
    pub async fn get_media(&self, id: Uuid) -> StorageResult<Media> {
        let row: MediaRow = sqlx::query_as("SELECT * FROM media WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?
            .ok_or(StorageError::NotFound)?;
        row.try_into()
    }

    /// Update the playback position (and, implicitly, `last_played`) for a
    /// media row.
    ///
    /// # Errors
    ///
    /// Returns a query error if the update fails.
    pub async fn update_playback_position(&self, id: Uuid, position: f64) -> StorageResult<()> {
        if position < 0.0 {
            return Err(StorageError::NegativeValue);
        }
        let _guard = self.write_guard.lock().await;
        sqlx::query("UPDATE media SET playback_position=?, last_played=? WHERE id=?")
            .bind(position)
            .bind(Utc::now().to_rfc3339())
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Mark a media row as having (or not having) a transcription.
    ///
    /// # Errors
    ///
    /// Returns a query error if the update fails.
    pub async fn set_has_transcription(&self, id: Uuid, value: bool) -> StorageResult<()> {
        let _guard = self.write_guard.lock().await;
        sqlx::query("UPDATE media SET has_transcription=? WHERE id=?")
            .bind(i64::from(value))
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Remove a media row and, via `ON DELETE CASCADE`, its dependent
    /// transcriptions and sessions.
    ///
    /// # Errors
    ///
    /// Returns a query error if the delete fails.
    pub async fn remove_media(&self, id: Uuid) -> StorageResult<()> {
        let _guard = self.write_guard.lock().await;
        sqlx::query("DELETE FROM media WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// List media belonging to a torrent.
    ///
    /// # Errors
    ///
    /// Returns a query error if the fetch fails.
    pub async fn list_media_for_torrent(&self, torrent_hash: &str) -> StorageResult<Vec<Media>> {
        let rows: Vec<MediaRow> =
            sqlx::query_as("SELECT * FROM media WHERE torrent_hash = ? ORDER BY date_added")
                .bind(torrent_hash)
                .fetch_all(&self.pool)
                .await?;
        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// Search media whose `original_name` contains `query`
    /// (case-insensitive).
    ///
    /// # Errors
    ///
    /// Returns a query error if the fetch fails.
    pub async fn search_media(&self, query: &str) -> StorageResult<Vec<Media>> {
        let pattern = like_pattern(query);
        let rows: Vec<MediaRow> = sqlx::query_as(
            "SELECT * FROM media WHERE original_name LIKE ? ESCAPE '\\' ORDER BY date_added DESC",
        )
        .bind(pattern)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(TryInto::try_into).collect()
    }

    // ---- Transcriptions --------------------------------------------------

    /// Insert a new transcription row.
    ///
    /// # Errors
    ///
    /// Returns a query error if the insert fails.
    pub async fn add_transcription(&self, transcription: &Transcription) -> StorageResult<()> {
        let _guard = self.write_guard.lock().await;
        sqlx::query(
            "INSERT INTO transcriptions (id, media_id, language, model_used, full_text, \
             timestamps, confidence, date_created, processing_time, status) \
             VALUES (?,?,?,?,?,?,?,?,?,?)",
        )
        .bind(transcription.id.to_string())
        .bind(transcription.media_id.to_string())
        .bind(&transcription.language)
        .bind(&transcription.model_used)
        .bind(&transcription.full_text)
        .bind(transcription.timestamps.to_string())
        .bind(transcription.confidence)
        .bind(transcription.date_created.to_rfc3339())
        .bind(transcription.processing_time)
        .bind(&transcription.status)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Fetch a transcription by id.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::NotFound`] if no such row exists.
    pub async fn get_transcription(&self, id: Uuid) -> StorageResult<Transcription> {
        let row: TranscriptionRow = sqlx::query_as("SELECT * FROM transcriptions WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?
            .ok_or(StorageError::NotFound)?;
        row.try_into()
    }

    /// Fetch the transcription for a given media row, if one exists.
    ///
    /// # Errors
    ///
    /// Returns a query error if the fetch fails.
    pub async fn get_transcription_for_media(
        &self,
        media_id: Uuid,
    ) -> StorageResult<Option<Transcription>> {
        let row: Option<TranscriptionRow> = sqlx::query_as(
            "SELECT * FROM transcriptions WHERE media_id = ? ORDER BY date_created DESC LIMIT 1",
        )
        .bind(media_id.to_string())
        .fetch_optional(&self.pool)
        .await?;
        row.map(TryInto::try_into).transpose()
    }

    /// Search transcriptions whose `full_text` contains `query`
    /// (case-insensitive).
    ///
    /// # Errors
    ///
    /// Returns a query error if the fetch fails.
    pub async fn search_transcriptions(&self, query: &str) -> StorageResult<Vec<Transcription>> {
        let pattern = like_pattern(query);
        let rows: Vec<TranscriptionRow> = sqlx::query_as(
            "SELECT * FROM transcriptions WHERE full_text LIKE ? ESCAPE '\\' \
             ORDER BY date_created DESC",
        )
        .bind(pattern)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// Remove a transcription row.
    ///
    /// # Errors
    ///
    /// Returns a query error if the delete fails.
    pub async fn remove_transcription(&self, id: Uuid) -> StorageResult<()> {
        let _guard = self.write_guard.lock().await;
        sqlx::query("DELETE FROM transcriptions WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    // ---- Sessions ---------------------------------------------------------

    /// Insert a new playback session row.
    ///
    /// # Errors
    ///
    /// Returns a query error if the insert fails.
    pub async fn add_session(&self, session: &Session) -> StorageResult<()> {
        let _guard = self.write_guard.lock().await;
        sqlx::query(
            "INSERT INTO sessions (session_id, media_id, start_time, end_time, start_position, \
             end_position, total_duration, completed) VALUES (?,?,?,?,?,?,?,?)",
        )
        .bind(session.session_id.to_string())
        .bind(session.media_id.to_string())
        .bind(session.start_time.to_rfc3339())
        .bind(session.end_time.map(|t| t.to_rfc3339()))
        .bind(session.start_position)
        .bind(session.end_position)
        .bind(session.total_duration)
        .bind(i64::from(session.completed))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Close out a playback session, recording its end position and time.
    ///
    /// # Errors
    ///
    /// Returns a query error if the update fails.
    pub async fn end_session(
        &self,
        session_id: Uuid,
        end_position: f64,
        completed: bool,
    ) -> StorageResult<()> {
        let _guard = self.write_guard.lock().await;
        sqlx::query(
            "UPDATE sessions SET end_time=?, end_position=?, completed=? WHERE session_id=?",
        )
        .bind(Utc::now().to_rfc3339())
        .bind(end_position)
        .bind(i64::from(completed))
        .bind(session_id.to_string())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// List sessions for a media row, most recent first.
    ///
    /// # Errors
    ///
    /// Returns a query error if the fetch fails.
    pub async fn list_sessions_for_media(&self, media_id: Uuid) -> StorageResult<Vec<Session>> {
        let rows: Vec<SessionRow> =
            sqlx::query_as("SELECT * FROM sessions WHERE media_id = ? ORDER BY start_time DESC")
                .bind(media_id.to_string())
                .fetch_all(&self.pool)
                .await?;
        rows.into_iter().map(TryInto::try_into).collect()
    }

    // ---- Transactions -------------------------------------------------

    /// Run `body` inside an explicit transaction, committing on `Ok` and
    /// rolling back on `Err`. Operations outside this call auto-commit
    /// individually.
    ///
    /// `body` must not call other `Storage` methods that themselves
    /// acquire `write_guard` — transactions here are not re-entrant.
    ///
    /// # Errors
    ///
    /// Propagates any error from `body`, or a query error from
    /// begin/commit/rollback.
    pub async fn transaction<F, T>(&self, body: F) -> StorageResult<T>
    where
        F: for<'c> FnOnce(
            &'c mut sqlx::Transaction<'_, sqlx::Sqlite>,
        ) -> futures_util::future::BoxFuture<'c, StorageResult<T>>,
    {
        let _guard = self.write_guard.lock().await;
        let mut tx = self.pool.begin().await?;
        match body(&mut tx).await {
            Ok(value) => {
                tx.commit().await?;
                Ok(value)
            }
            Err(err) => {
                let _ = tx.rollback().await;
                Err(err)
            }
        }
    }

    // ---- Statistics -----------------------------------------------------

    /// Aggregate counts across all tables.
    ///
    /// # Errors
    ///
    /// Returns a query error if any underlying count query fails.
    pub async fn statistics(&self) -> StorageResult<StorageStatistics> {
        let torrent_count: i64 = sqlx::query("SELECT COUNT(*) AS c FROM torrents")
            .fetch_one(&self.pool)
            .await?
            .get("c");
        let media_count: i64 = sqlx::query("SELECT COUNT(*) AS c FROM media")
            .fetch_one(&self.pool)
            .await?
            .get("c");
        let transcription_count: i64 = sqlx::query("SELECT COUNT(*) AS c FROM transcriptions")
            .fetch_one(&self.pool)
            .await?
            .get("c");

        let status_rows = sqlx::query("SELECT status, COUNT(*) AS c FROM torrents GROUP BY status")
            .fetch_all(&self.pool)
            .await?;
        let torrents_by_status = status_rows
            .iter()
            .map(|row| (row.get::<String, _>("status"), row.get::<i64, _>("c")))
            .collect();

        let hour_ago = (Utc::now() - chrono::Duration::hours(1)).to_rfc3339();
        let torrents_added_last_hour: i64 =
            sqlx::query("SELECT COUNT(*) AS c FROM torrents WHERE date_added >= ?")
                .bind(hour_ago)
                .fetch_one(&self.pool)
                .await?
                .get("c");

        Ok(StorageStatistics {
            torrent_count,
            media_count,
            transcription_count,
            torrents_by_status,
            torrents_added_last_hour,
        })
    }

    // ---- Maintenance ----------------------------------------------------

    /// Reclaim free pages via `VACUUM`.
    ///
    /// # Errors
    ///
    /// Returns a query error if the statement fails.
    pub async fn vacuum(&self) -> StorageResult<()> {
        let _guard = self.write_guard.lock().await;
        sqlx::query("VACUUM").execute(&self.pool).await?;
        Ok(())
    }

    /// Rebuild indexes via `REINDEX`.
    ///
    /// # Errors
    ///
    /// Returns a query error if the statement fails.
    pub async fn reindex(&self) -> StorageResult<()> {
        let _guard = self.write_guard.lock().await;
        sqlx::query("REINDEX").execute(&self.pool).await?;
        Ok(())
    }

    /// Delete `media` rows (and their cascading children) whose
    /// `torrent_hash` no longer references an existing torrent.
    ///
    /// # Errors
    ///
    /// Returns a query error if the delete fails. Returns the number of
    /// orphaned media rows removed.
    pub async fn cleanup_orphans(&self) -> StorageResult<u64> {
        let _guard = self.write_guard.lock().await;
        let result = sqlx::query(
            "DELETE FROM media WHERE torrent_hash NOT IN (SELECT info_hash FROM torrents)",
        )
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    /// Checkpoint the WAL and copy the database file to `destination`.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::IoFailed`] if the copy fails, or a query
    /// error if the checkpoint fails.
    pub async fn backup(&self, destination: impl AsRef<Path>) -> StorageResult<()> {
        let _guard = self.write_guard.lock().await;
        sqlx::query("PRAGMA wal_checkpoint(TRUNCATE)")
            .execute(&self.pool)
            .await?;
        let Some(source) = &self.db_path else {
            return Err(StorageError::IoFailed(std::io::Error::other(
                "backup is unavailable for an in-memory database",
            )));
        };
        tokio::fs::copy(source, destination.as_ref()).await?;
        Ok(())
    }

    /// Restore the database file from a prior [`Storage::backup`] snapshot.
    /// The caller must reopen a fresh [`Storage`] afterward; the restored
    /// file is not re-read into the live connection pool.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::IoFailed`] if the copy fails, or if this
    /// instance has no on-disk path (in-memory database).
    pub async fn restore(&self, source: impl AsRef<Path>) -> StorageResult<()> {
        let _guard = self.write_guard.lock().await;
        let Some(destination) = &self.db_path else {
            return Err(StorageError::IoFailed(std::io::Error::other(
                "restore is unavailable for an in-memory database",
            )));
        };
        tokio::fs::copy(source.as_ref(), destination).await?;
        Ok(())
    }

    /// Access the underlying pool, for advanced callers (migrations,
    /// diagnostics).
    #[must_use]
    pub const fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

fn validate_torrent(torrent: &Torrent) -> StorageResult<()> {
    if !is_valid_info_hash(&torrent.info_hash) {
        return Err(StorageError::InvalidHash);
    }
    if torrent.size < 0
        || torrent.seeders < 0
        || torrent.leechers < 0
        || torrent.downloaded < 0
        || torrent.uploaded < 0
    {
        return Err(StorageError::NegativeValue);
    }
    Ok(())
}

/// Escape SQLite's `LIKE` metacharacters (`%`, `_`, `\`) in `query`, then
/// wrap it for a substring match.
fn like_pattern(query: &str) -> String {
    let escaped = query.replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_");
    format!("%{escaped}%")
}

/// Convenience constructor for an empty-metadata JSON object, used by
/// callers assembling a fresh [`Torrent`]/[`Media`] row.
#[must_use]
pub fn empty_metadata() -> Value {
    json!({})
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Media, Torrent};

    fn sample_torrent(hash: &str) -> Torrent {
        let now = Utc::now();
        Torrent {
            info_hash: hash.to_string(),
            name: "Sample Torrent".to_string(),
            magnet_uri: format!("magnet:?xt=urn:btih:{hash}"),
            size: 1024,
            date_added: now,
            last_active: now,
            save_path: "/downloads/sample".to_string(),
            progress: 0.0,
            status: "downloading".to_string(),
            metadata: empty_metadata(),
            files: json!([]),
            seeders: 1,
            leechers: 0,
            downloaded: 0,
            uploaded: 0,
            ratio: 0.0,
        }
    }

    #[tokio::test]
    async fn add_and_get_torrent_round_trips() {
        let storage = Storage::open_in_memory().await.unwrap();
        let hash = "a".repeat(40);
        let torrent = sample_torrent(&hash);
        storage.add_torrent(&torrent).await.unwrap();

        let fetched = storage.get_torrent(&hash).await.unwrap();
        assert_eq!(fetched.name, "Sample Torrent");
        assert_eq!(fetched.info_hash, hash);
    }

    #[tokio::test]
    async fn rejects_invalid_info_hash() {
        let storage = Storage::open_in_memory().await.unwrap();
        let torrent = sample_torrent("not-a-valid-hash");
        let result = storage.add_torrent(&torrent).await;
        assert!(matches!(result, Err(StorageError::InvalidHash)));
    }

    #[tokio::test]
    async fn cascading_delete_removes_media() {
        let storage = Storage::open_in_memory().await.unwrap();
        let hash = "b".repeat(40);
        storage.add_torrent(&sample_torrent(&hash)).await.unwrap();

        let media_id = Uuid::new_v4();
        let now = Utc::now();
        let media = Media {
            id: media_id,
            torrent_hash: hash.clone(),
            file_path: "/downloads/sample/video.mp4".to_string(),
            original_name: "video.mp4".to_string(),
            mime_type: "video/mp4".to_string(),
            file_size: 2048,
            duration: Some(120.0),
            width: Some(1920),
            height: Some(1080),
            frame_rate: Some(30.0),
            video_codec: Some("h264".to_string()),
            audio_codec: Some("aac".to_string()),
            has_transcription: false,
            date_added: now,
            last_played: None,
            playback_position: 0.0,
            metadata: empty_metadata(),
        };
        storage.add_media(&media).await.unwrap();
        assert!(storage.get_media(media_id).await.is_ok());

        storage.remove_torrent(&hash).await.unwrap();
        assert!(matches!(storage.get_media(media_id).await, Err(StorageError::NotFound)));
    }

    #[tokio::test]
    async fn search_torrents_matches_substring_case_insensitively() {
        let storage = Storage::open_in_memory().await.unwrap();
        storage.add_torrent(&sample_torrent(&"c".repeat(40))).await.unwrap();

        let results = storage.search_torrents("sample").await.unwrap();
        assert_eq!(results.len(), 1);

        let no_results = storage.search_torrents("nonexistent").await.unwrap();
        assert!(no_results.is_empty());
    }

    #[tokio::test]
    async fn statistics_counts_rows_and_groups_by_status() {
        let storage = Storage::open_in_memory().await.unwrap();
        storage.add_torrent(&sample_torrent(&"d".repeat(40))).await.unwrap();
        let mut second = sample_torrent(&"e".repeat(40));
        second.status = "seeding".to_string();
        storage.add_torrent(&second).await.unwrap();

        let stats = storage.statistics().await.unwrap();
        assert_eq!(stats.torrent_count, 2);
        assert_eq!(stats.torrents_by_status.len(), 2);
    }

    #[tokio::test]
    async fn cleanup_orphans_removes_dangling_media_rows_only() {
        let storage = Storage::open_in_memory().await.unwrap();
        let hash = "f".repeat(40);
        storage.add_torrent(&sample_torrent(&hash)).await.unwrap();
        let removed = storage.cleanup_orphans().await.unwrap();
        assert_eq!(removed, 0);
    }

    #[tokio::test]
    async fn negative_progress_is_rejected() {
        let storage = Storage::open_in_memory().await.unwrap();
        let hash = "1".repeat(40);
        storage.add_torrent(&sample_torrent(&hash)).await.unwrap();
        let result = storage.update_torrent_progress(&hash, -1.0, "downloading").await;
        assert!(matches!(result, Err(StorageError::NegativeValue)));
    }
}
