//! Recovery strategies: what to do when a component reports a failure.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use vellum_retry::RetryConfig;

use crate::action::RecoveryAction;

/// A boxed, clonable async closure returning whether recovery succeeded.
pub type RecoveryFn = Arc<dyn Fn() -> Pin<Box<dyn Future<Output = bool> + Send>> + Send + Sync>;

/// A strategy bound either to a specific `(component, operation)` pair or to
/// a severity level, describing how the coordinator should respond.
#[derive(Clone)]
pub struct RecoveryStrategy {
    /// Action attempted first.
    pub primary_action: RecoveryAction,
    /// Action attempted if the primary action fails.
    pub fallback_action: RecoveryAction,
    /// Custom recovery routine for [`RecoveryAction::Retry`]/[`RecoveryAction::Reset`].
    pub recovery: Option<RecoveryFn>,
    /// Custom fallback routine for [`RecoveryAction::Fallback`].
    pub fallback: Option<RecoveryFn>,
    /// Retry configuration used when no custom `recovery` closure is set.
    pub retry_config: RetryConfig,
    /// Human-readable description surfaced in logs and user prompts.
    pub description: String,
    /// Maximum number of recovery attempts before giving up.
    pub max_recovery_attempts: u32,
    /// Minimum time between successive recovery attempts for this strategy.
    pub cooldown_period: Duration,
}

impl std::fmt::Debug for RecoveryStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecoveryStrategy")
            .field("primary_action", &self.primary_action)
            .field("fallback_action", &self.fallback_action)
            .field("has_recovery", &self.recovery.is_some())
            .field("has_fallback", &self.fallback.is_some())
            .field("description", &self.description)
            .field("max_recovery_attempts", &self.max_recovery_attempts)
            .field("cooldown_period", &self.cooldown_period)
            .finish()
    }
}

impl Default for RecoveryStrategy {
    fn default() -> Self {
        Self {
            primary_action: RecoveryAction::None,
            fallback_action: RecoveryAction::None,
            recovery: None,
            fallback: None,
            retry_config: RetryConfig::default(),
            description: String::new(),
            max_recovery_attempts: 3,
            cooldown_period: Duration::from_millis(5000),
        }
    }
}

/// Convenience constructors for common strategy shapes.
pub mod strategies {
    use super::{RecoveryAction, RecoveryFn, RecoveryStrategy};
    use vellum_retry::retry_presets;

    /// Retry the operation with the network exponential-backoff preset.
    #[must_use]
    pub fn retry_with_exponential_backoff(max_attempts: u32) -> RecoveryStrategy {
        let mut retry_config = retry_presets::network();
        retry_config.max_attempts = max_attempts;
        RecoveryStrategy {
            primary_action: RecoveryAction::Retry,
            retry_config,
            description: format!("Retry with exponential backoff ({max_attempts} attempts)"),
            ..RecoveryStrategy::default()
        }
    }

    /// Retry first, then fall back to `fallback_fn` if retries are exhausted.
    #[must_use]
    pub fn fallback_with_retry(fallback_fn: RecoveryFn, max_attempts: u32) -> RecoveryStrategy {
        let mut retry_config = retry_presets::network();
        retry_config.max_attempts = max_attempts;
        RecoveryStrategy {
            primary_action: RecoveryAction::Retry,
            fallback_action: RecoveryAction::Fallback,
            fallback: Some(fallback_fn),
            retry_config,
            description: "Retry then fallback".to_string(),
            ..RecoveryStrategy::default()
        }
    }

    /// Reset the component's in-memory state via `reset_fn`.
    #[must_use]
    pub fn reset_component(reset_fn: RecoveryFn) -> RecoveryStrategy {
        RecoveryStrategy {
            primary_action: RecoveryAction::Reset,
            recovery: Some(reset_fn),
            description: "Reset component state".to_string(),
            ..RecoveryStrategy::default()
        }
    }

    /// Restart the owning component.
    #[must_use]
    pub fn restart_component() -> RecoveryStrategy {
        RecoveryStrategy {
            primary_action: RecoveryAction::Restart,
            description: "Restart component".to_string(),
            ..RecoveryStrategy::default()
        }
    }

    /// Ask the user for guidance before proceeding.
    #[must_use]
    pub fn user_prompt(description: impl Into<String>) -> RecoveryStrategy {
        RecoveryStrategy {
            primary_action: RecoveryAction::UserPrompt,
            description: description.into(),
            ..RecoveryStrategy::default()
        }
    }

    /// Abandon the operation.
    #[must_use]
    pub fn terminate(reason: impl Into<String>) -> RecoveryStrategy {
        RecoveryStrategy {
            primary_action: RecoveryAction::Terminate,
            description: reason.into(),
            ..RecoveryStrategy::default()
        }
    }
}
