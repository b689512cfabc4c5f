//! The CLI's own error type: a thin wrapper distinguishing user-input
//! mistakes (exit code 2) from everything else (exit code 3), matching
//! the convention of every other host-facing binary in this workspace.

use std::fmt;

/// Top-level CLI error.
#[derive(Debug)]
pub(crate) enum CliError {
    /// The user supplied invalid arguments or input; not worth a
    /// backtrace, just a message.
    Validation(String),
    /// Anything else: config load failure, engine initialization
    /// failure, I/O error, etc.
    Failure(anyhow::Error),
}

/// Convenience alias for CLI command results.
pub(crate) type CliResult<T> = Result<T, CliError>;

impl CliError {
    /// Build a [`CliError::Validation`] from any displayable message.
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Build a [`CliError::Failure`] from any error convertible to
    /// [`anyhow::Error`].
    pub(crate) fn failure(error: impl Into<anyhow::Error>) -> Self {
        Self::Failure(error.into())
    }

    /// Process exit code this error should produce.
    pub(crate) const fn exit_code(&self) -> i32 {
        match self {
            Self::Validation(_) => 2,
            Self::Failure(_) => 3,
        }
    }

    /// User-facing message, without a backtrace.
    pub(crate) fn display_message(&self) -> String {
        match self {
            Self::Validation(message) => message.clone(),
            Self::Failure(error) => format!("{error:#}"),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display_message())
    }
}

impl std::error::Error for CliError {}
