//! Recovery actions a [`crate::strategy::RecoveryStrategy`] can request.

/// What the coordinator should do in response to a reported failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RecoveryAction {
    /// No recovery action; the error is recorded and nothing else happens.
    #[default]
    None,
    /// Retry the failed operation via the strategy's retry configuration.
    Retry,
    /// Fall back to an alternate code path.
    Fallback,
    /// Reset the component's in-memory state without a full restart.
    Reset,
    /// Restart the owning component (see [`crate::restart::restart_action_for`]).
    Restart,
    /// Surface the failure to a human and wait for their decision.
    UserPrompt,
    /// Abandon the operation entirely.
    Terminate,
}
