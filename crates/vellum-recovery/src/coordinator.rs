//! The recovery coordinator: central point for reporting errors, registering
//! recovery strategies, and driving circuit breakers and health checks.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::broadcast;
use tracing::{info, warn};
use vellum_errors::{ErrorContext, ErrorSeverity};
use vellum_retry::RetryConfig;

use crate::action::RecoveryAction;
use crate::breaker::CircuitBreakerState;
use crate::events::RecoveryEvent;
use crate::health::{HealthCheckFn, HealthMonitor};
use crate::history::{ErrorHistory, ErrorStatistics, DEFAULT_MAX_HISTORY};
use crate::policy::{default_retry_config, default_should_retry};
use crate::restart::restart_action_for;
use crate::strategy::RecoveryStrategy;

const EVENT_CHANNEL_CAPACITY: usize = 256;

type ComponentStrategies = HashMap<String, HashMap<String, RecoveryStrategy>>;

/// Central coordinator for error reporting and automated recovery.
///
/// A process holds one coordinator; components report failures into it, and
/// it dispatches recovery strategies, tracks circuit breakers, and runs
/// health checks on their behalf.
pub struct RecoveryCoordinator {
    component_strategies: Mutex<ComponentStrategies>,
    global_strategies: Mutex<HashMap<SeverityKey, RecoveryStrategy>>,
    circuit_breakers: Mutex<HashMap<String, CircuitBreakerState>>,
    health_monitors: Mutex<HashMap<String, HealthMonitor>>,
    history: Mutex<ErrorHistory>,
    pending_prompts: Mutex<HashMap<String, ErrorContext>>,
    pending_retries: Mutex<HashMap<String, ErrorContext>>,
    error_reporting_enabled: AtomicBool,
    auto_recovery_enabled: AtomicBool,
    max_error_history: AtomicUsize,
    events: broadcast::Sender<RecoveryEvent>,
}

/// `ErrorSeverity` is `Copy`/`Eq`/`Hash` already; this alias documents intent
/// at the map-key use sites.
type SeverityKey = ErrorSeverity;

impl Default for RecoveryCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

impl RecoveryCoordinator {
    /// Construct a coordinator with the default global strategies: retry
    /// with exponential backoff for `Error`, user prompt for `Critical`, and
    /// terminate for `Fatal`.
    #[must_use]
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let coordinator = Self {
            component_strategies: Mutex::new(HashMap::new()),
            global_strategies: Mutex::new(HashMap::new()),
            circuit_breakers: Mutex::new(HashMap::new()),
            health_monitors: Mutex::new(HashMap::new()),
            history: Mutex::new(ErrorHistory::new(DEFAULT_MAX_HISTORY)),
            pending_prompts: Mutex::new(HashMap::new()),
            pending_retries: Mutex::new(HashMap::new()),
            error_reporting_enabled: AtomicBool::new(true),
            auto_recovery_enabled: AtomicBool::new(true),
            max_error_history: AtomicUsize::new(DEFAULT_MAX_HISTORY),
            events,
        };

        coordinator.register_global_strategy(
            ErrorSeverity::Error,
            crate::strategy::strategies::retry_with_exponential_backoff(3),
        );
        coordinator.register_global_strategy(
            ErrorSeverity::Critical,
            crate::strategy::strategies::user_prompt("Critical error occurred"),
        );
        coordinator.register_global_strategy(
            ErrorSeverity::Fatal,
            crate::strategy::strategies::terminate("Fatal error - application must terminate"),
        );

        info!("recovery coordinator initialized");
        coordinator
    }

    /// Subscribe to lifecycle events.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<RecoveryEvent> {
        self.events.subscribe()
    }

    /// Register a strategy for a specific `(component, operation)` pair,
    /// taking priority over any global, severity-based strategy.
    pub fn register_recovery_strategy(
        &self,
        component: impl Into<String>,
        operation: impl Into<String>,
        strategy: RecoveryStrategy,
    ) {
        let component = component.into();
        let operation = operation.into();
        info!(%component, %operation, description = %strategy.description, "registered recovery strategy");
        self.component_strategies
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .entry(component)
            .or_default()
            .insert(operation, strategy);
    }

    /// Register a default strategy applied to any error of the given
    /// severity that has no component-specific strategy.
    pub fn register_global_strategy(&self, severity: ErrorSeverity, strategy: RecoveryStrategy) {
        info!(?severity, description = %strategy.description, "registered global recovery strategy");
        self.global_strategies
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .insert(severity, strategy);
    }

    /// Record a failure, log it, update the relevant circuit breaker, and,
    /// if auto-recovery is enabled and the severity is `Error` or higher,
    /// attempt recovery.
    pub async fn report_error(&self, context: ErrorContext) {
        if !self.error_reporting_enabled.load(Ordering::SeqCst) {
            return;
        }

        self.history
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push(context.clone());

        self.update_circuit_breaker(&context.component, false);

        match context.severity {
            ErrorSeverity::Info => info!(%context, "recovery: informational"),
            ErrorSeverity::Warning => warn!(%context, "recovery: warning"),
            _ => warn!(%context, "recovery: error reported"),
        }

        let _ = self.events.send(RecoveryEvent::ErrorReported(context.clone()));

        if self.auto_recovery_enabled.load(Ordering::SeqCst) && context.severity >= ErrorSeverity::Error {
            let _ = self.attempt_recovery(&context).await;
        }
    }

    /// Attempt recovery for `context`, returning `Ok(true)` on success and
    /// `Err(message)` if no strategy was found, the circuit breaker is open,
    /// or every action failed.
    ///
    /// # Errors
    ///
    /// Returns an error describing why recovery could not proceed.
    pub async fn attempt_recovery(&self, context: &ErrorContext) -> Result<bool, String> {
        if self.is_circuit_open(&context.component) {
            return Err(format!(
                "circuit breaker is open for component: {}",
                context.component
            ));
        }

        let strategy = self.find_recovery_strategy(context);
        if strategy.primary_action == RecoveryAction::None {
            return Err("no recovery strategy found".to_string());
        }

        info!(
            component = %context.component,
            operation = %context.operation,
            description = %strategy.description,
            "attempting recovery"
        );

        let mut success = self.execute_recovery_action(strategy.primary_action, context, &strategy).await;

        if !success && strategy.fallback_action != RecoveryAction::None {
            info!("primary recovery failed, attempting fallback");
            success = self
                .execute_recovery_action(strategy.fallback_action, context, &strategy)
                .await;
        }

        self.update_circuit_breaker(&context.component, success);

        let _ = self.events.send(RecoveryEvent::RecoveryAttempted {
            component: context.component.to_string(),
            operation: context.operation.to_string(),
            success,
        });

        if success {
            Ok(true)
        } else {
            Err("recovery attempts failed".to_string())
        }
    }

    /// Resolve a pending user prompt, acting on their decision.
    pub fn handle_user_response(&self, component: &str, operation: &str, should_retry: bool) {
        let key = format!("{component}::{operation}");
        let context = self
            .pending_prompts
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .remove(&key);

        if let Some(context) = context {
            if should_retry {
                info!(%component, %operation, "user approved retry after prompt");
            } else {
                info!(%component, %operation, "user declined retry after prompt");
            }
            let _ = context;
        }
    }

    /// Enable a circuit breaker for `component` with the given threshold and
    /// reset timeout.
    pub fn enable_circuit_breaker(&self, component: impl Into<String>, failure_threshold: u32, reset_timeout: Duration) {
        let component = component.into();
        info!(%component, failure_threshold, ?reset_timeout, "circuit breaker enabled");
        self.circuit_breakers
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .insert(component, CircuitBreakerState::new(failure_threshold, reset_timeout));
    }

    /// Whether `component`'s breaker is currently open.
    #[must_use]
    pub fn is_circuit_open(&self, component: &str) -> bool {
        let mut breakers = self
            .circuit_breakers
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        breakers.get_mut(component).is_some_and(CircuitBreakerState::is_open)
    }

    /// Manually reset `component`'s breaker.
    pub fn reset_circuit(&self, component: &str) {
        let mut breakers = self
            .circuit_breakers
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        if let Some(breaker) = breakers.get_mut(component) {
            breaker.reset();
            let _ = self.events.send(RecoveryEvent::CircuitBreakerReset {
                component: component.to_string(),
            });
        }
    }

    /// Start polling `check` every `interval`, emitting
    /// `ComponentHealthChanged` and resetting the circuit breaker whenever
    /// health is restored.
    pub fn start_health_check(&self, component: impl Into<String>, check: HealthCheckFn, interval: Duration) {
        let component = component.into();
        let events = self.events.clone();
        let component_for_task = component.clone();

        let monitor = HealthMonitor::spawn(
            interval,
            move || check(),
            move |healthy| {
                let _ = events.send(RecoveryEvent::ComponentHealthChanged {
                    component: component_for_task.clone(),
                    healthy,
                });
            },
        );

        self.health_monitors
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .insert(component.clone(), monitor);
        info!(%component, ?interval, "health check started");
    }

    /// Stop polling `component`'s health check, if one is running.
    pub fn stop_health_check(&self, component: &str) {
        self.health_monitors
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .remove(component);
    }

    /// Whether `component` is healthy; components with no health check
    /// configured are assumed healthy.
    #[must_use]
    pub fn is_component_healthy(&self, component: &str) -> bool {
        self.health_monitors
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .get(component)
            .is_none_or(HealthMonitor::last_result)
    }

    /// Change the retained error history cap, trimming immediately.
    pub fn set_max_error_history(&self, max_errors: usize) {
        self.max_error_history.store(max_errors, Ordering::SeqCst);
        self.history
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .set_max_entries(max_errors);
    }

    /// Enable or disable recording of reported errors.
    pub fn set_error_reporting_enabled(&self, enabled: bool) {
        self.error_reporting_enabled.store(enabled, Ordering::SeqCst);
    }

    /// Enable or disable automatic recovery on `report_error`.
    pub fn set_auto_recovery_enabled(&self, enabled: bool) {
        self.auto_recovery_enabled.store(enabled, Ordering::SeqCst);
    }

    /// Retrieve retained error history, optionally scoped to `component`.
    #[must_use]
    pub fn error_history(&self, component: Option<&str>) -> Vec<ErrorContext> {
        self.history
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .entries(component)
    }

    /// Compute aggregate error statistics, optionally scoped to `component`.
    #[must_use]
    pub fn error_statistics(&self, component: Option<&str>) -> ErrorStatistics {
        self.history
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .statistics(component)
    }

    /// Clear retained error history, optionally scoped to `component`.
    pub fn clear_error_history(&self, component: Option<&str>) {
        self.history
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clear(component);
    }

    fn find_recovery_strategy(&self, context: &ErrorContext) -> RecoveryStrategy {
        if let Some(strategy) = self
            .component_strategies
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .get(context.component)
            .and_then(|operations| operations.get(context.operation))
        {
            return strategy.clone();
        }

        self.global_strategies
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .get(&context.severity)
            .cloned()
            .unwrap_or_default()
    }

    async fn execute_recovery_action(
        &self,
        action: RecoveryAction,
        context: &ErrorContext,
        strategy: &RecoveryStrategy,
    ) -> bool {
        match action {
            RecoveryAction::None => true,
            RecoveryAction::Retry => {
                if let Some(recovery) = &strategy.recovery {
                    recovery().await
                } else {
                    self.request_retry(context)
                }
            }
            RecoveryAction::Fallback => match &strategy.fallback {
                Some(fallback) => fallback().await,
                None => false,
            },
            RecoveryAction::Reset => match &strategy.recovery {
                Some(recovery) => recovery().await,
                None => false,
            },
            RecoveryAction::Restart => {
                let action = restart_action_for(context.component);
                let _ = self.events.send(RecoveryEvent::ComponentRestartRequested {
                    component: context.component.to_string(),
                    action,
                });
                true
            }
            RecoveryAction::UserPrompt => {
                info!(
                    component = %context.component,
                    operation = %context.operation,
                    description = %strategy.description,
                    "user intervention required"
                );
                let _ = self.events.send(RecoveryEvent::UserPromptRequested {
                    component: context.component.to_string(),
                    operation: context.operation.to_string(),
                    description: strategy.description.clone(),
                    error_message: context.message.clone(),
                });
                self.pending_prompts
                    .lock()
                    .unwrap_or_else(std::sync::PoisonError::into_inner)
                    .insert(format!("{}::{}", context.component, context.operation), context.clone());
                false
            }
            RecoveryAction::Terminate => {
                warn!(component = %context.component, description = %strategy.description, "terminate requested");
                false
            }
        }
    }

    /// No custom recovery closure was supplied for a `Retry` action: ask the
    /// owning component to perform the retry itself (it knows how to redo
    /// its own operation; the coordinator does not), recording the request
    /// so [`Self::complete_retry`] can finalize bookkeeping once the
    /// component reports back. Returns `false` synchronously since recovery
    /// has not actually happened yet; [`RecoveryEvent::RecoveryAttempted`]
    /// fires again once `complete_retry` runs.
    fn request_retry(&self, context: &ErrorContext) -> bool {
        if !default_should_retry(context.severity == ErrorSeverity::Fatal, &context.message) {
            return false;
        }

        let key = format!("{}::{}", context.component, context.operation);
        self.pending_retries
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .insert(key, context.clone());

        let _ = self.events.send(RecoveryEvent::RetryRequested {
            component: context.component.to_string(),
            operation: context.operation.to_string(),
            message: context.message.clone(),
        });

        false
    }

    /// Retry configuration a component should use when performing a
    /// default (no custom closure) retry for itself, chosen by component
    /// name the same way the built-in global strategies are chosen.
    #[must_use]
    pub fn default_retry_config_for(component: &str) -> RetryConfig {
        default_retry_config(component)
    }

    /// Report the outcome of a retry a component performed in response to
    /// [`RecoveryEvent::RetryRequested`], finalizing the circuit breaker and
    /// emitting [`RecoveryEvent::RecoveryAttempted`].
    pub fn complete_retry(&self, component: &str, operation: &str, succeeded: bool) {
        let key = format!("{component}::{operation}");
        let existed = self
            .pending_retries
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .remove(&key)
            .is_some();
        if !existed {
            warn!(%component, %operation, "completed retry with no matching pending request");
        }

        self.update_circuit_breaker(component, succeeded);
        let _ = self.events.send(RecoveryEvent::RecoveryAttempted {
            component: component.to_string(),
            operation: operation.to_string(),
            success: succeeded,
        });
    }

    fn update_circuit_breaker(&self, component: &str, success: bool) {
        let mut breakers = self
            .circuit_breakers
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let Some(breaker) = breakers.get_mut(component) else {
            return;
        };
        let tripped = breaker.record(success);
        if tripped {
            let _ = self.events.send(RecoveryEvent::CircuitBreakerTripped {
                component: component.to_string(),
            });
        } else if success {
            let _ = self.events.send(RecoveryEvent::CircuitBreakerReset {
                component: component.to_string(),
            });
        }
    }

    /// Pull a reference to this coordinator wrapped for shared ownership
    /// across components (downloader, model manager, media pipeline, ...).
    #[must_use]
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }
}
