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

//! Layered configuration for the workspace: a typed [`AppConfig`] loaded
//! from an optional TOML file and overridden by environment variables,
//! covering every knob the retry, download, model, transcription,
//! media, and recovery engines recognize.

mod error;
mod loader;
mod model;

pub use error::{ConfigError, ConfigResult};
pub use loader::{ENV_PREFIX, apply_env_overrides, load};
pub use model::{
    AppConfig, BreakerConfig, DownloadConfig, HealthCheckConfig, MediaConfig,
    ModelManagerConfig, RecoveryConfig, RetryDefaultsConfig, StorageConfig, TranscriptionConfig,
};
