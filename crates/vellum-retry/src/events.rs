//! Lifecycle events broadcast by a [`crate::engine::RetryEngine`].

use std::time::Duration;

/// Events emitted over the course of a single `execute` call. Consumers that
/// only care about the final outcome can ignore everything but
/// `OperationCompleted`/`OperationCancelled`; the Recovery Coordinator
/// subscribes to all of them to maintain its error history.
#[derive(Debug, Clone, PartialEq)]
pub enum RetryEvent {
    /// `execute` was called and the first attempt is about to run.
    OperationStarted,
    /// An attempt is about to run.
    AttemptStarted {
        /// 1-based attempt number.
        attempt: u32,
    },
    /// An attempt returned an error.
    AttemptFailed {
        /// 1-based attempt number that failed.
        attempt: u32,
        /// Stringified error from the failed attempt.
        message: String,
    },
    /// Another attempt has been scheduled after a delay.
    RetryScheduled {
        /// 1-based attempt number that will run next.
        attempt: u32,
        /// Delay before that attempt runs, jitter included.
        delay: Duration,
    },
    /// `execute` returned `Ok`.
    OperationCompleted {
        /// Total attempts made, including the successful one.
        attempts: u32,
        /// Wall-clock time from `execute` start to completion.
        elapsed: Duration,
    },
    /// `execute` returned `Err(RetryError::UserCancelled)`.
    OperationCancelled {
        /// Attempts made before cancellation took effect.
        attempts: u32,
    },
}
