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

//! A thin command-line host that wires the transcription core, media
//! pipeline, storage layer, and download manager together and exposes
//! them as a handful of subcommands. This is scaffolding to exercise the
//! engines end to end, not a component in its own right.
//!
//! Layout: `cli.rs` (argument parsing, dispatch, command handlers) with a
//! thin `main.rs` that delegates to [`run`].

mod context;
mod error;
mod output;

pub mod cli;

pub use cli::run;
