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

//! Shared test fixtures: temp directories, byte/checksum helpers, and a
//! stub HTTP server for download-manager integration tests.

mod fixtures;
pub mod stub_server;

pub use fixtures::{random_bytes, sha256_hex, temp_dir};
