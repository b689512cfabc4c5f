//! Error type returned by the retry engine.

use thiserror::Error;

/// Result alias for retry engine operations.
pub type RetryResult<T> = Result<T, RetryError>;

/// Errors the retry engine itself can return (distinct from the operation's
/// own error type, which is consumed by `is_retryable` and never threaded
/// through this enum).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RetryError {
    /// The operation was attempted `max_attempts` times without succeeding.
    #[error("maximum retry attempts exceeded")]
    MaxAttemptsExceeded,
    /// The overall timeout elapsed before another attempt could be made.
    #[error("overall retry timeout exceeded")]
    TimeoutExceeded,
    /// `is_retryable` returned `false` for the most recent failure.
    #[error("error was not retryable")]
    NonRetryableError,
    /// `cancel()` was called while an attempt was in flight or pending.
    #[error("operation was cancelled")]
    UserCancelled,
}
