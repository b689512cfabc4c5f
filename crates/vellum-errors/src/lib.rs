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

//! Shared error taxonomy primitives used across every component crate.
//!
//! Component crates keep their own `thiserror`-derived error enums; this
//! crate supplies the common currency they convert into at the boundary
//! the Recovery Coordinator operates on: [`ErrorContext`] and
//! [`ErrorSeverity`]. No component error type lives here, since each
//! component's failure modes are disjoint (`MediaError`, `WhisperError`,
//! `DownloadError`, ...); only the shared envelope does.

mod classify;
mod context;
mod severity;

pub use classify::{ErrorClass, classify_code};
pub use context::{ErrorContext, ErrorContextBuilder};
pub use severity::ErrorSeverity;

/// Implemented by every component error enum so it can be funneled into the
/// Recovery Coordinator's uniform [`ErrorContext`] representation.
pub trait IntoErrorContext {
    /// Component name used to key circuit breakers, strategies, and history.
    fn component(&self) -> &'static str;

    /// Stable error code used for classification and statistics.
    fn code(&self) -> &'static str;

    /// Severity this error should be reported at.
    fn severity(&self) -> ErrorSeverity;

    /// Build the full [`ErrorContext`] for a given operation name.
    fn into_context(self, operation: &'static str) -> ErrorContext
    where
        Self: std::error::Error + Sized,
    {
        ErrorContextBuilder::new(self.component(), operation, self.code())
            .message(self.to_string())
            .severity(self.severity())
            .build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, thiserror::Error)]
    #[error("demo failure")]
    struct DemoError;

    impl IntoErrorContext for DemoError {
        fn component(&self) -> &'static str {
            "Demo"
        }

        fn code(&self) -> &'static str {
            "demo_failure"
        }

        fn severity(&self) -> ErrorSeverity {
            ErrorSeverity::Error
        }
    }

    #[test]
    fn into_context_populates_fields() {
        let ctx = DemoError.into_context("run");
        assert_eq!(ctx.component, "Demo");
        assert_eq!(ctx.operation, "run");
        assert_eq!(ctx.code, "demo_failure");
        assert_eq!(ctx.severity, ErrorSeverity::Error);
        assert_eq!(ctx.message, "demo failure");
    }
}
