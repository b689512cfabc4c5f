//! The download manager itself: resumable HTTP transfers with checksum
//! verification, bounded concurrency, and exponential retry of transient
//! transport failures.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use futures_util::StreamExt;
use reqwest::{Client, StatusCode};
use sha2::{Digest, Sha256};
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tokio::sync::{Mutex, Semaphore};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use uuid::Uuid;
use vellum_events::Channel;
use vellum_retry::{RetryConfig, RetryEngine, RetryError, RetryPolicy};

use crate::config::DownloadManagerConfig;
use crate::error::{DownloadError, DownloadResult};
use crate::events::DownloadEvent;
use crate::model::{DownloadInfo, DownloadStatus};

struct TrackedDownload {
    cancel: CancellationToken,
    info: Mutex<DownloadInfo>,
    last_error: Mutex<Option<DownloadError>>,
}

/// Resumable HTTP download manager with bounded concurrency.
pub struct DownloadManager {
    config: DownloadManagerConfig,
    client: Client,
    semaphore: Arc<Semaphore>,
    active: Mutex<HashMap<Uuid, Arc<TrackedDownload>>>,
    events: Channel<DownloadEvent>,
}

impl DownloadManager {
    /// Construct a manager from `config`.
    ///
    /// # Panics
    ///
    /// Panics if the underlying HTTP client fails to build (invalid TLS
    /// configuration), which should never happen with this crate's fixed
    /// `rustls` feature set.
    #[must_use]
    pub fn new(config: DownloadManagerConfig) -> Self {
        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(config.timeout)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects as usize))
            .build()
            .expect("failed to build reqwest client");

        Self {
            semaphore: Arc::new(Semaphore::new(config.max_concurrent_downloads)),
            config,
            client,
            active: Mutex::new(HashMap::new()),
            events: Channel::new(),
        }
    }

    /// Subscribe to download lifecycle events.
    #[must_use]
    pub fn subscribe(&self) -> vellum_events::Subscription<DownloadEvent> {
        self.events.subscribe()
    }

    /// Download `url` to `local_path`, resuming a partial `.tmp` file when
    /// `resume` is true and verifying `expected_checksum` (SHA-256,
    /// case-insensitive) when supplied.
    ///
    /// # Errors
    ///
    /// Returns a [`DownloadError`] classifying why the transfer did not
    /// complete; on any failure path the final file at `local_path` is
    /// guaranteed absent (the temp file may remain for diagnostics).
    pub async fn download_file(
        &self,
        url: &str,
        local_path: impl AsRef<Path>,
        expected_checksum: Option<&str>,
        resume: bool,
    ) -> DownloadResult<PathBuf> {
        let local_path = local_path.as_ref().to_path_buf();
        validate_url(url)?;
        ensure_parent_dir(&local_path).await?;

        let mut info = DownloadInfo::new(url, local_path.to_string_lossy(), self.config.max_retries);
        info.expected_checksum = expected_checksum.map(str::to_lowercase);
        let id = info.id;
        let tracked = Arc::new(TrackedDownload {
            cancel: CancellationToken::new(),
            info: Mutex::new(info),
            last_error: Mutex::new(None),
        });
        self.active.lock().await.insert(id, tracked.clone());

        let _permit = self.semaphore.acquire().await.expect("semaphore closed");
        let _ = self.events.publish(DownloadEvent::Started { id });

        let retry_config = RetryConfig {
            policy: RetryPolicy::Exponential,
            max_attempts: self.config.max_retries.max(1),
            initial_delay: self.config.retry_delay,
            max_delay: Duration::from_secs(300),
            overall_timeout: None,
            backoff_multiplier: 2.0,
            jitter_factor: 0.25,
            enable_jitter: true,
            should_retry: Some(Arc::new(|_attempt, message: &str| is_retryable_message(message))),
            calculate_delay: None,
        };
        let engine = RetryEngine::new(retry_config);

        let result = engine
            .execute(|_attempt| {
                let tracked = tracked.clone();
                let url = url.to_string();
                let local_path = local_path.clone();
                async move {
                    let outcome = self.attempt_download(id, &tracked, &url, &local_path, resume).await;
                    if let Err(ref error) = outcome {
                        *tracked.last_error.lock().await = Some(error.clone());
                    }
                    outcome
                }
            })
            .await;

        self.active.lock().await.remove(&id);
        let last_error = tracked.last_error.lock().await.clone();

        match result {
            Ok(()) => {
                let _ = self.events.publish(DownloadEvent::Completed {
                    id,
                    local_path: local_path.to_string_lossy().into_owned(),
                });
                Ok(local_path)
            }
            Err(retry_error) => {
                let error = last_error.unwrap_or_else(|| match retry_error {
                    RetryError::UserCancelled => DownloadError::CancellationRequested,
                    RetryError::TimeoutExceeded => DownloadError::TimeoutError,
                    RetryError::NonRetryableError | RetryError::MaxAttemptsExceeded => {
                        DownloadError::UnknownError
                    }
                });
                if error == DownloadError::CancellationRequested {
                    let _ = self.events.publish(DownloadEvent::Cancelled { id });
                } else {
                    let _ = self
                        .events
                        .publish(DownloadEvent::Failed { id, error: error.clone() });
                }
                Err(error)
            }
        }
    }

    /// Cancel an in-flight download by id. No-op if the download is not
    /// currently tracked (already finished or unknown id).
    pub async fn cancel_download(&self, id: Uuid) {
        if let Some(tracked) = self.active.lock().await.get(&id) {
            tracked.cancel.cancel();
        }
    }

    /// Cancel every currently tracked download.
    pub async fn cancel_all(&self) {
        for tracked in self.active.lock().await.values() {
            tracked.cancel.cancel();
        }
    }

    /// Snapshot of all currently tracked downloads.
    pub async fn active_downloads(&self) -> Vec<DownloadInfo> {
        let active = self.active.lock().await;
        let mut infos = Vec::with_capacity(active.len());
        for tracked in active.values() {
            infos.push(tracked.info.lock().await.clone());
        }
        infos
    }

    async fn attempt_download(
        &self,
        id: Uuid,
        tracked: &TrackedDownload,
        url: &str,
        local_path: &Path,
        resume: bool,
    ) -> Result<(), DownloadError> {
        let temp_path = temp_path_for(local_path);

        let (total_size, supports_resume) = self.probe(url).await?;
        {
            let mut info = tracked.info.lock().await;
            info.total_size = total_size;
            info.supports_resume = supports_resume;
            info.status = DownloadStatus::Downloading;
        }

        if let Some(total_size) = total_size {
            check_disk_space(local_path, total_size)?;
        }

        let existing_len = if resume && supports_resume {
            tokio::fs::metadata(&temp_path).await.map(|m| m.len()).unwrap_or(0)
        } else {
            0
        };

        if existing_len > 0 {
            tracked.info.lock().await.resume_position = existing_len;
            let _ = self.events.publish(DownloadEvent::Resumed { id, from_offset: existing_len });
        }

        let mut request = self.client.get(url);
        if existing_len > 0 {
            request = request.header("Range", format!("bytes={existing_len}-"));
        }

        let response = request.send().await.map_err(classify_transport_error)?;
        let status = response.status();
        if !status.is_success() && status != StatusCode::PARTIAL_CONTENT {
            let error = if status.is_server_error() {
                DownloadError::ServerError
            } else {
                DownloadError::NetworkError
            };
            tracked.info.lock().await.status = DownloadStatus::Failed;
            return Err(error);
        }

        let mut file = if existing_len > 0 && status == StatusCode::PARTIAL_CONTENT {
            tokio::fs::OpenOptions::new()
                .append(true)
                .open(&temp_path)
                .await
                .map_err(|_| DownloadError::FileSystemError)?
        } else {
            File::create(&temp_path).await.map_err(map_io_error)?
        };

        let mut received = existing_len;
        let started = std::time::Instant::now();
        let mut stream = response.bytes_stream();

        while let Some(chunk) = stream.next().await {
            if tracked.cancel.is_cancelled() {
                drop(file);
                let _ = tokio::fs::remove_file(&temp_path).await;
                return Err(DownloadError::CancellationRequested);
            }
            let chunk = chunk.map_err(classify_transport_error)?;
            file.write_all(&chunk).await.map_err(map_io_error)?;
            received += chunk.len() as u64;

            let elapsed = started.elapsed().as_secs_f64().max(0.001);
            let speed_bps = (received.saturating_sub(existing_len)) as f64 / elapsed;
            {
                let mut info = tracked.info.lock().await;
                info.downloaded_size = received;
                info.speed_bps = speed_bps;
            }
            let _ = self.events.publish(DownloadEvent::Progress {
                id,
                received,
                total: total_size,
                speed_bps,
            });
        }
        file.flush().await.map_err(map_io_error)?;
        drop(file);

        let expected_checksum = tracked.info.lock().await.expected_checksum.clone();
        if let Some(expected) = expected_checksum {
            let actual = sha256_file(&temp_path).await?;
            if !actual.eq_ignore_ascii_case(&expected) {
                warn!(%url, "checksum mismatch; leaving temp file for diagnostics");
                tracked.info.lock().await.status = DownloadStatus::Failed;
                return Err(DownloadError::ChecksumMismatch);
            }
        }

        atomic_rename(&temp_path, local_path).await?;
        tracked.info.lock().await.status = DownloadStatus::Completed;
        info!(%url, path = %local_path.display(), "download completed");
        Ok(())
    }

    /// HEAD-probe the remote URL for `Content-Length`/`Accept-Ranges`.
    /// Falls back to a ranged `GET bytes=0-0` when the server rejects
    /// `HEAD` (some static hosts do).
    async fn probe(&self, url: &str) -> Result<(Option<u64>, bool), DownloadError> {
        if let Ok(response) = self.client.head(url).send().await {
            if response.status().is_success() || response.status() == StatusCode::PARTIAL_CONTENT {
                return Ok(extract_probe_info(&response));
            }
        }

        let response = self
            .client
            .get(url)
            .header("Range", "bytes=0-0")
            .send()
            .await
            .map_err(classify_transport_error)?;
        if response.status().is_server_error() {
            return Err(DownloadError::ServerError);
        }
        Ok(extract_probe_info(&response))
    }
}

fn extract_probe_info(response: &reqwest::Response) -> (Option<u64>, bool) {
    let supports_resume = response
        .headers()
        .get("accept-ranges")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.eq_ignore_ascii_case("bytes"))
        || response.status() == StatusCode::PARTIAL_CONTENT;

    let total = if response.status() == StatusCode::PARTIAL_CONTENT {
        response
            .headers()
            .get("content-range")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.rsplit('/').next())
            .and_then(|v| v.parse::<u64>().ok())
    } else {
        response.content_length()
    };

    (total, supports_resume)
}

fn temp_path_for(local_path: &Path) -> PathBuf {
    let mut name = local_path.as_os_str().to_owned();
    name.push(".tmp");
    PathBuf::from(name)
}

fn validate_url(url: &str) -> DownloadResult<()> {
    let parsed = reqwest::Url::parse(url).map_err(|_| DownloadError::InvalidUrl)?;
    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        return Err(DownloadError::InvalidUrl);
    }
    Ok(())
}

async fn ensure_parent_dir(local_path: &Path) -> DownloadResult<()> {
    let Some(parent) = local_path.parent() else {
        return Ok(());
    };
    if parent.as_os_str().is_empty() {
        return Ok(());
    }
    match tokio::fs::create_dir_all(parent).await {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == std::io::ErrorKind::PermissionDenied => Err(DownloadError::PermissionDenied),
        Err(_) => Err(DownloadError::FileSystemError),
    }
}

/// Reject the download before any bytes are written if the filesystem
/// backing `local_path` does not have at least `required_bytes` free. When
/// the disk cannot be identified (e.g. the target isn't mounted yet), the
/// check is skipped with a warning rather than failing the download.
fn check_disk_space(local_path: &Path, required_bytes: u64) -> DownloadResult<()> {
    let Some(available) = available_space_for(local_path) else {
        warn!(path = %local_path.display(), "could not determine free disk space; skipping preflight check");
        return Ok(());
    };
    if available < required_bytes {
        warn!(available, required_bytes, "insufficient disk space for download");
        return Err(DownloadError::InsufficientDiskSpace);
    }
    Ok(())
}

fn available_space_for(local_path: &Path) -> Option<u64> {
    let target = local_path.parent().filter(|p| !p.as_os_str().is_empty())?;
    let target = std::fs::canonicalize(target).unwrap_or_else(|_| target.to_path_buf());

    let disks = sysinfo::Disks::new_with_refreshed_list();
    disks
        .list()
        .iter()
        .filter(|disk| target.starts_with(disk.mount_point()))
        .max_by_key(|disk| disk.mount_point().as_os_str().len())
        .map(sysinfo::Disk::available_space)
}

async fn atomic_rename(temp_path: &Path, local_path: &Path) -> DownloadResult<()> {
    if tokio::fs::metadata(local_path).await.is_ok() {
        let _ = tokio::fs::remove_file(local_path).await;
    }
    match tokio::fs::rename(temp_path, local_path).await {
        Ok(()) => Ok(()),
        Err(_) => {
            // Cross-filesystem rename: fall back to copy + unlink.
            tokio::fs::copy(temp_path, local_path).await.map_err(map_io_error)?;
            let _ = tokio::fs::remove_file(temp_path).await;
            Ok(())
        }
    }
}

async fn sha256_file(path: &Path) -> DownloadResult<String> {
    let bytes = tokio::fs::read(path).await.map_err(map_io_error)?;
    let digest = Sha256::digest(&bytes);
    Ok(digest.iter().map(|byte| format!("{byte:02x}")).collect())
}

fn map_io_error(err: std::io::Error) -> DownloadError {
    match err.kind() {
        std::io::ErrorKind::PermissionDenied => DownloadError::PermissionDenied,
        _ if err.raw_os_error() == Some(28) => DownloadError::InsufficientDiskSpace,
        _ => DownloadError::FileSystemError,
    }
}

fn classify_transport_error(err: reqwest::Error) -> DownloadError {
    if err.is_timeout() {
        DownloadError::TimeoutError
    } else if err.is_status() || err.is_redirect() {
        DownloadError::NetworkError
    } else {
        DownloadError::NetworkError
    }
}

/// Whether a retry-engine message string corresponds to one of the
/// transient [`DownloadError`] variants eligible for retry: network/timeout/server errors. Checksum mismatch, disk
/// space, permissions, invalid URL, and cancellation are all terminal.
fn is_retryable_message(message: &str) -> bool {
    message == DownloadError::NetworkError.to_string()
        || message == DownloadError::TimeoutError.to_string()
        || message == DownloadError::ServerError.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use vellum_test_support::{sha256_hex, stub_server, temp_dir};

    #[test]
    fn validate_url_rejects_non_http_schemes() {
        assert!(validate_url("ftp://example.test/file").is_err());
        assert!(validate_url("not a url").is_err());
        assert!(validate_url("https://example.test/file").is_ok());
    }

    #[test]
    fn temp_path_appends_suffix() {
        assert_eq!(temp_path_for(Path::new("/tmp/model.bin")), PathBuf::from("/tmp/model.bin.tmp"));
    }

    #[test]
    fn disk_space_check_passes_for_small_requirement() {
        let dir = temp_dir();
        let target = dir.path().join("model.bin");
        assert!(check_disk_space(&target, 1).is_ok());
    }

    #[test]
    fn disk_space_check_fails_when_requirement_exceeds_available() {
        let dir = temp_dir();
        let target = dir.path().join("model.bin");
        assert_eq!(check_disk_space(&target, u64::MAX), Err(DownloadError::InsufficientDiskSpace));
    }

    #[tokio::test]
    async fn downloads_full_body_and_verifies_checksum() {
        let body = b"hello vellum download manager".to_vec();
        let server = stub_server::serve_full_body("/model.bin", body.clone()).await;
        let dir = temp_dir();
        let target = dir.path().join("model.bin");

        let manager = DownloadManager::new(DownloadManagerConfig::default());
        let url = format!("{}/model.bin", server.uri());
        let checksum = sha256_hex(&body);

        let result = manager.download_file(&url, &target, Some(&checksum), true).await;
        assert!(result.is_ok());
        assert_eq!(tokio::fs::read(&target).await.unwrap(), body);
    }

    #[tokio::test]
    async fn checksum_mismatch_leaves_no_final_file() {
        let body = b"payload A".to_vec();
        let server = stub_server::serve_full_body("/model.bin", body).await;
        let dir = temp_dir();
        let target = dir.path().join("model.bin");

        let manager = DownloadManager::new(DownloadManagerConfig {
            max_retries: 1,
            ..DownloadManagerConfig::default()
        });
        let url = format!("{}/model.bin", server.uri());
        let wrong_checksum = sha256_hex(b"payload B");

        let result = manager.download_file(&url, &target, Some(&wrong_checksum), true).await;
        assert_eq!(result, Err(DownloadError::ChecksumMismatch));
        assert!(tokio::fs::metadata(&target).await.is_err());
    }

    #[tokio::test]
    async fn resumes_from_partial_temp_file() {
        let body = b"0123456789abcdefghij".to_vec();
        let server = stub_server::serve_range_resume("/model.bin", body.clone(), 10).await;
        let dir = temp_dir();
        let target = dir.path().join("model.bin");
        tokio::fs::write(format!("{}.tmp", target.display()), &body[..10]).await.unwrap();

        let manager = DownloadManager::new(DownloadManagerConfig::default());
        let url = format!("{}/model.bin", server.uri());
        let result = manager.download_file(&url, &target, None, true).await;
        assert!(result.is_ok(), "{result:?}");
        assert_eq!(tokio::fs::read(&target).await.unwrap(), body);
    }

    #[tokio::test]
    async fn retries_transient_failures_then_succeeds() {
        let body = b"flaky payload".to_vec();
        let server = stub_server::serve_flaky("/model.bin", body.clone(), 2).await;
        let dir = temp_dir();
        let target = dir.path().join("model.bin");

        let manager = DownloadManager::new(DownloadManagerConfig {
            max_retries: 5,
            retry_delay: Duration::from_millis(1),
            ..DownloadManagerConfig::default()
        });
        let url = format!("{}/model.bin", server.uri());
        let result = manager.download_file(&url, &target, None, false).await;
        assert!(result.is_ok(), "{result:?}");
    }

    #[tokio::test]
    async fn cancel_during_transfer_is_reported() {
        let body = vec![0_u8; 1024 * 1024];
        let server = stub_server::serve_full_body("/model.bin", body).await;
        let dir = temp_dir();
        let target = dir.path().join("model.bin");

        let manager = Arc::new(DownloadManager::new(DownloadManagerConfig::default()));
        let url = format!("{}/model.bin", server.uri());
        let mut events = manager.subscribe();

        let manager_clone = manager.clone();
        let url_clone = url.clone();
        let target_clone = target.clone();
        let handle = tokio::spawn(async move {
            manager_clone.download_file(&url_clone, &target_clone, None, false).await
        });

        if let Some(DownloadEvent::Started { id }) = events.recv().await {
            manager.cancel_download(id).await;
        }

        let result = handle.await.unwrap();
        assert_eq!(result, Err(DownloadError::CancellationRequested));
    }
}
