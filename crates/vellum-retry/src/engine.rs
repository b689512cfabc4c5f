//! The retry engine itself.

use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use rand::Rng;
use tokio::sync::broadcast;
use tracing::{debug, warn};

use crate::config::{default_is_retryable, RetryConfig, RetryPolicy};
use crate::error::{RetryError, RetryResult};
use crate::events::RetryEvent;

const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Drives a single operation through its configured retry policy.
///
/// One `RetryEngine` is meant to be constructed per logical operation (it
/// tracks attempt count and cancellation state for that operation only); the
/// `RetryConfig` it holds is cheap to clone, so callers that retry many
/// operations with the same policy typically keep one `RetryConfig` around
/// and build a fresh `RetryEngine` per call.
pub struct RetryEngine {
    config: RetryConfig,
    attempt: AtomicU32,
    cancelled: AtomicBool,
    running: AtomicBool,
    events: broadcast::Sender<RetryEvent>,
}

impl RetryEngine {
    /// Build an engine from a retry configuration.
    #[must_use]
    pub fn new(config: RetryConfig) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            config,
            attempt: AtomicU32::new(0),
            cancelled: AtomicBool::new(false),
            running: AtomicBool::new(false),
            events,
        }
    }

    /// Subscribe to this engine's lifecycle events.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<RetryEvent> {
        self.events.subscribe()
    }

    /// Request cancellation. Takes effect before the next attempt or delay;
    /// an attempt already in flight runs to completion.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// Whether `cancel()` has been called.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Whether an `execute` call is currently in progress.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// 1-based index of the attempt currently running or about to run.
    #[must_use]
    pub fn current_attempt(&self) -> u32 {
        self.attempt.load(Ordering::SeqCst)
    }

    /// Delay that would be used before the given 1-based attempt number,
    /// ignoring jitter and the overall timeout. Attempt `1` always yields
    /// zero delay since no wait precedes the first try.
    #[must_use]
    pub fn next_delay(&self, attempt: u32) -> Duration {
        base_delay(&self.config, attempt)
    }

    /// Run `operation`, retrying according to this engine's configuration.
    ///
    /// `operation` is invoked once per attempt and must be retried from
    /// scratch (no partial-progress resumption is performed by the engine).
    /// `is_retryable` receives the stringified error from the most recent
    /// attempt and decides whether another attempt should be made; when the
    /// config provides no override this defaults to
    /// [`default_is_retryable`].
    pub async fn execute<F, Fut, T, E>(&self, mut operation: F) -> RetryResult<T>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: std::fmt::Display,
    {
        self.running.store(true, Ordering::SeqCst);
        self.attempt.store(0, Ordering::SeqCst);
        let started = Instant::now();
        let _ = self.events.send(RetryEvent::OperationStarted);

        let result = self.run_loop(&mut operation, started).await;

        self.running.store(false, Ordering::SeqCst);
        match &result {
            Ok(_) => {
                let _ = self.events.send(RetryEvent::OperationCompleted {
                    attempts: self.attempt.load(Ordering::SeqCst),
                    elapsed: started.elapsed(),
                });
            }
            Err(RetryError::UserCancelled) => {
                let _ = self.events.send(RetryEvent::OperationCancelled {
                    attempts: self.attempt.load(Ordering::SeqCst),
                });
            }
            Err(_) => {}
        }
        result
    }

    async fn run_loop<F, Fut, T, E>(&self, operation: &mut F, started: Instant) -> RetryResult<T>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: std::fmt::Display,
    {
        if self.config.max_attempts == 0 {
            warn!("max_attempts is zero, failing without invoking the operation");
            return Err(RetryError::MaxAttemptsExceeded);
        }

        loop {
            if self.is_cancelled() {
                return Err(RetryError::UserCancelled);
            }

            let attempt = self.attempt.fetch_add(1, Ordering::SeqCst) + 1;
            let _ = self.events.send(RetryEvent::AttemptStarted { attempt });
            debug!(attempt, max_attempts = self.config.max_attempts, "retry attempt starting");

            match operation(attempt).await {
                Ok(value) => return Ok(value),
                Err(err) => {
                    let message = err.to_string();
                    let _ = self.events.send(RetryEvent::AttemptFailed {
                        attempt,
                        message: message.clone(),
                    });

                    if !self.should_retry(attempt, &message) {
                        warn!(attempt, %message, "attempt failed, not retryable");
                        return Err(RetryError::NonRetryableError);
                    }

                    if attempt >= self.config.max_attempts {
                        warn!(attempt, "max retry attempts exceeded");
                        return Err(RetryError::MaxAttemptsExceeded);
                    }

                    let delay = self.delay_for(attempt + 1);
                    if let Some(timeout) = self.config.overall_timeout {
                        if started.elapsed() + delay >= timeout {
                            return Err(RetryError::TimeoutExceeded);
                        }
                    }

                    let _ = self.events.send(RetryEvent::RetryScheduled {
                        attempt: attempt + 1,
                        delay,
                    });

                    if self.is_cancelled() {
                        return Err(RetryError::UserCancelled);
                    }
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    /// Fire-and-forget variant of [`Self::execute`]: returns immediately and
    /// invokes exactly one of `on_success`/`on_failure` on a spawned task
    /// once the retry loop settles. Requires the engine be held behind an
    /// `Arc` since the spawned task outlives this call.
    pub fn execute_async<F, Fut, T, E, S, Fl>(
        self: Arc<Self>,
        mut operation: F,
        on_success: S,
        on_failure: Fl,
    ) where
        F: FnMut(u32) -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, E>> + Send,
        E: std::fmt::Display + Send,
        T: Send + 'static,
        S: FnOnce(T) + Send + 'static,
        Fl: FnOnce(RetryError) + Send + 'static,
    {
        tokio::spawn(async move {
            match self.execute(|attempt| operation(attempt)).await {
                Ok(value) => on_success(value),
                Err(err) => on_failure(err),
            }
        });
    }

    fn should_retry(&self, attempt: u32, message: &str) -> bool {
        self.config
            .should_retry
            .as_ref()
            .map_or_else(|| default_is_retryable(message), |f| f(attempt, message))
    }

    fn delay_for(&self, next_attempt: u32) -> Duration {
        if let Some(calc) = &self.config.calculate_delay {
            return apply_jitter(&self.config, calc(next_attempt));
        }
        apply_jitter(&self.config, base_delay(&self.config, next_attempt))
    }
}

/// Compute the backoff delay for `attempt` (1-based) under `config`'s
/// policy, before jitter and before clamping to `max_delay`. Attempt `1`
/// always returns zero.
fn base_delay(config: &RetryConfig, attempt: u32) -> Duration {
    if attempt <= 1 {
        return Duration::ZERO;
    }
    let n = attempt - 1;
    let raw = match config.policy {
        RetryPolicy::None => Duration::ZERO,
        RetryPolicy::Linear => config.initial_delay,
        RetryPolicy::Exponential => {
            let factor = config.backoff_multiplier.powi(i32::try_from(n - 1).unwrap_or(i32::MAX));
            scale_duration(config.initial_delay, factor)
        }
        RetryPolicy::Fibonacci => scale_duration(config.initial_delay, fibonacci(n) as f64),
        RetryPolicy::Custom => config.initial_delay,
    };
    raw.min(config.max_delay)
}

fn scale_duration(base: Duration, factor: f64) -> Duration {
    if factor <= 0.0 {
        return Duration::ZERO;
    }
    Duration::from_secs_f64((base.as_secs_f64() * factor).max(0.0))
}

/// 1-indexed Fibonacci sequence starting `fib(1) = 1, fib(2) = 1, fib(3) = 2, ...`.
fn fibonacci(n: u32) -> u64 {
    if n == 0 {
        return 0;
    }
    let (mut a, mut b) = (0u64, 1u64);
    for _ in 0..n {
        let next = a.saturating_add(b);
        a = b;
        b = next;
    }
    a
}

fn apply_jitter(config: &RetryConfig, delay: Duration) -> Duration {
    if !config.enable_jitter || config.jitter_factor <= 0.0 || delay.is_zero() {
        return delay.min(config.max_delay);
    }
    let jitter_factor = config.jitter_factor.clamp(0.0, 1.0);
    let mut rng = rand::rng();
    let spread: f64 = rng.random_range(-jitter_factor..=jitter_factor);
    let jittered = delay.as_secs_f64() * (1.0 + spread);
    Duration::from_secs_f64(jittered.max(0.0)).min(config.max_delay)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::presets;
    use std::sync::atomic::AtomicU32 as Counter;

    #[test]
    fn fibonacci_matches_expected_sequence() {
        let values: Vec<u64> = (1..=8).map(fibonacci).collect();
        assert_eq!(values, vec![1, 1, 2, 3, 5, 8, 13, 21]);
    }

    #[test]
    fn exponential_delay_doubles_and_clamps() {
        let config = RetryConfig {
            enable_jitter: false,
            ..presets::network()
        };
        assert_eq!(base_delay(&config, 1), Duration::ZERO);
        assert_eq!(base_delay(&config, 2), Duration::from_millis(1000));
        assert_eq!(base_delay(&config, 3), Duration::from_millis(2000));
        assert_eq!(base_delay(&config, 4), Duration::from_millis(4000));
    }

    #[tokio::test(start_paused = true)]
    async fn succeeds_on_third_attempt() {
        let config = RetryConfig {
            enable_jitter: false,
            max_attempts: 5,
            initial_delay: Duration::from_millis(10),
            max_delay: Duration::from_millis(100),
            policy: RetryPolicy::Exponential,
            backoff_multiplier: 2.0,
            overall_timeout: None,
            ..RetryConfig::default()
        };
        let engine = RetryEngine::new(config);
        let calls = Arc::new(Counter::new(0));
        let calls_clone = calls.clone();

        let result = engine
            .execute(move |attempt| {
                let calls = calls_clone.clone();
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    if attempt < 3 {
                        Err("connection reset".to_string())
                    } else {
                        Ok(42)
                    }
                }
            })
            .await;

        assert_eq!(result, Ok(42));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(engine.current_attempt(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn non_retryable_error_stops_immediately() {
        let engine = RetryEngine::new(RetryConfig::default());
        let result: RetryResult<()> = engine
            .execute(|_attempt| async { Err::<(), _>("404 not found".to_string()) })
            .await;
        assert_eq!(result, Err(RetryError::NonRetryableError));
        assert_eq!(engine.current_attempt(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn exhausts_max_attempts() {
        let config = RetryConfig {
            max_attempts: 2,
            enable_jitter: false,
            initial_delay: Duration::from_millis(1),
            ..RetryConfig::default()
        };
        let engine = RetryEngine::new(config);
        let result: RetryResult<()> = engine
            .execute(|_attempt| async { Err::<(), _>("timeout".to_string()) })
            .await;
        assert_eq!(result, Err(RetryError::MaxAttemptsExceeded));
        assert_eq!(engine.current_attempt(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn zero_max_attempts_never_invokes_operation() {
        let config = RetryConfig {
            max_attempts: 0,
            ..RetryConfig::default()
        };
        let engine = RetryEngine::new(config);
        let calls = Arc::new(Counter::new(0));
        let calls_clone = calls.clone();
        let result: RetryResult<()> = engine
            .execute(move |_attempt| {
                let calls = calls_clone.clone();
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, String>(())
                }
            })
            .await;
        assert_eq!(result, Err(RetryError::MaxAttemptsExceeded));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn execute_async_invokes_on_success() {
        let engine = Arc::new(RetryEngine::new(RetryConfig {
            enable_jitter: false,
            ..RetryConfig::default()
        }));
        let (tx, rx) = tokio::sync::oneshot::channel();
        engine.execute_async(
            |_attempt| async { Ok::<_, String>(7) },
            move |value| {
                let _ = tx.send(value);
            },
            |_err| panic!("unexpected failure callback"),
        );
        let value = rx.await.expect("on_success callback should fire");
        assert_eq!(value, 7);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_before_start_short_circuits() {
        let engine = RetryEngine::new(RetryConfig::default());
        engine.cancel();
        let result: RetryResult<()> = engine.execute(|_attempt| async { Ok::<_, String>(()) }).await;
        assert_eq!(result, Err(RetryError::UserCancelled));
    }
}
