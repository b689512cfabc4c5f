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

//! Logging and metrics for the workspace's engines.
//!
//! Every component logs through `tracing` at the severity its
//! [`vellum_errors::ErrorSeverity`] maps to, and records outcomes on a
//! shared [`metrics::Metrics`] registry. Both are constructed once by the
//! host application (`vellum-cli`) and handed to each engine as an owned
//! or shared value, per this workspace's preference for explicit context
//! objects over global state.

mod init;
pub mod metrics;

pub use init::{DEFAULT_LOG_LEVEL, LogFormat, LoggingConfig, init_logging};
pub use metrics::Metrics;
