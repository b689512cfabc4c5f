#![forbid(unsafe_code)]
#![deny(
    warnings,
    dead_code,
    unused,
    unused_imports,
    unused_must_use,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]
#![allow(clippy::module_name_repetitions)]

//! The narrow external-collaborator contract this workspace needs from a
//! BitTorrent engine: a `TorrentEngine` trait, its DTOs, and a no-op
//! adapter for local development. Peer wire protocol, DHT, and piece
//! selection are out of scope; a real adapter lives outside this crate.

pub mod engine;
pub mod error;
pub mod model;

pub use engine::{NoopTorrentEngine, TorrentEngine};
pub use error::{TorrentError, TorrentResult};
pub use model::{AddTorrent, EngineEvent, RemoveTorrent, TorrentProgress, TorrentSource, TorrentState};

/// Event channel type for an engine's observable surface.
pub type EventChannel = vellum_events::Channel<EngineEvent>;
