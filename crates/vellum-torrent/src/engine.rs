//! The `TorrentEngine` contract and a stub adapter for local development.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::{TorrentError, TorrentResult};
use crate::model::{AddTorrent, RemoveTorrent};

/// Capability contract the rest of the system depends on from a torrent
/// engine. We persist `TorrentRecord` rows and accept `EngineEvent`-shaped
/// updates from an implementation of this trait; peer wire protocol, DHT,
/// and piece selection live entirely behind it.
#[async_trait]
pub trait TorrentEngine: Send + Sync {
    /// Admit a new torrent into the underlying engine.
    async fn add_torrent(&self, request: AddTorrent) -> TorrentResult<()>;

    /// Remove a torrent, optionally deleting its on-disk data.
    async fn remove_torrent(&self, id: Uuid, options: RemoveTorrent) -> TorrentResult<()>;

    /// Pause a torrent; default implementation reports lack of support.
    async fn pause_torrent(&self, _id: Uuid) -> TorrentResult<()> {
        Err(TorrentError::Unsupported {
            operation: "pause_torrent",
        })
    }

    /// Resume a torrent; default implementation reports lack of support.
    async fn resume_torrent(&self, _id: Uuid) -> TorrentResult<()> {
        Err(TorrentError::Unsupported {
            operation: "resume_torrent",
        })
    }
}

/// No-op adapter used for local development and testing in the absence of
/// a real torrent engine. Every admitted torrent is immediately forgotten;
/// callers observe neither progress nor completion events from it.
#[derive(Debug, Default)]
pub struct NoopTorrentEngine;

#[async_trait]
impl TorrentEngine for NoopTorrentEngine {
    async fn add_torrent(&self, request: AddTorrent) -> TorrentResult<()> {
        tracing::debug!(torrent_id = %request.id, "noop engine: ignoring add_torrent");
        Ok(())
    }

    async fn remove_torrent(&self, id: Uuid, _options: RemoveTorrent) -> TorrentResult<()> {
        tracing::debug!(torrent_id = %id, "noop engine: ignoring remove_torrent");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TorrentSource;

    #[tokio::test]
    async fn noop_engine_accepts_add_and_remove() {
        let engine = NoopTorrentEngine;
        let id = Uuid::new_v4();
        let request = AddTorrent {
            id,
            source: TorrentSource::Magnet {
                uri: "magnet:?xt=urn:btih:demo".to_string(),
            },
            download_dir: None,
        };
        assert!(engine.add_torrent(request).await.is_ok());
        assert!(
            engine
                .remove_torrent(id, RemoveTorrent::default())
                .await
                .is_ok()
        );
    }

    #[tokio::test]
    async fn noop_engine_does_not_support_pause_resume() {
        let engine = NoopTorrentEngine;
        let id = Uuid::new_v4();
        assert!(matches!(
            engine.pause_torrent(id).await,
            Err(TorrentError::Unsupported { operation: "pause_torrent" })
        ));
        assert!(matches!(
            engine.resume_torrent(id).await,
            Err(TorrentError::Unsupported { operation: "resume_torrent" })
        ));
    }
}
