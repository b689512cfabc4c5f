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

//! Catalogue, download queue, and load/unload orchestration for Whisper
//! models.
//!
//! [`ModelManager`] is the component's only entry point: construct one
//! with [`ModelManager::initialize`], discover entries through
//! [`ModelManager::available_models`]/[`ModelManager::find_best_model`],
//! and move a model through its lifecycle with
//! [`ModelManager::download_model`]/[`ModelManager::load_model`]/
//! [`ModelManager::unload_model`]. At most one model is ever loaded into
//! the underlying STT wrapper at a time; loading a second one unloads the
//! first.

mod catalogue;
mod config;
mod error;
mod events;
mod manager;
mod model;

pub use catalogue::{local_path_for, ModelCatalogue};
pub use config::ModelManagerConfig;
pub use error::{ModelError, ModelResult};
pub use events::ModelEvent;
pub use manager::{ModelManager, MIN_MODEL_SIZE_BYTES};
pub use model::{ModelInfo, ModelStatus, ModelType};
