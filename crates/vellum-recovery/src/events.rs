//! Events broadcast by the [`crate::coordinator::RecoveryCoordinator`].

use vellum_errors::ErrorContext;

/// Lifecycle events a UI or log sink can subscribe to.
#[derive(Debug, Clone)]
pub enum RecoveryEvent {
    /// A new error was reported and recorded in the history.
    ErrorReported(ErrorContext),
    /// A recovery attempt finished, successfully or not.
    RecoveryAttempted {
        /// Component the recovery was attempted for.
        component: String,
        /// Operation the recovery was attempted for.
        operation: String,
        /// Whether the attempt succeeded.
        success: bool,
    },
    /// A component's circuit breaker tripped open.
    CircuitBreakerTripped {
        /// Component whose breaker tripped.
        component: String,
    },
    /// A component's circuit breaker was reset (manually or after cooldown).
    CircuitBreakerReset {
        /// Component whose breaker was reset.
        component: String,
    },
    /// A health check observed a change in component health.
    ComponentHealthChanged {
        /// Component whose health changed.
        component: String,
        /// New health state.
        healthy: bool,
    },
    /// A component restart was requested.
    ComponentRestartRequested {
        /// Component to restart.
        component: String,
        /// Restart action identifier (see [`crate::restart::restart_action_for`]).
        action: &'static str,
    },
    /// A default (no custom closure) retry was requested; the owning
    /// component must perform the retry itself and report the outcome via
    /// [`crate::coordinator::RecoveryCoordinator::complete_retry`].
    RetryRequested {
        /// Component asked to retry.
        component: String,
        /// Operation asked to retry.
        operation: String,
        /// Original error message that triggered the retry.
        message: String,
    },
    /// A recovery strategy requires user guidance before proceeding.
    UserPromptRequested {
        /// Component awaiting guidance.
        component: String,
        /// Operation awaiting guidance.
        operation: String,
        /// Strategy description shown to the user.
        description: String,
        /// Original error message.
        error_message: String,
    },
}
