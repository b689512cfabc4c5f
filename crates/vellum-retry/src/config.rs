//! Retry policy configuration.

use std::sync::Arc;
use std::time::Duration;

/// Backoff policy controlling how the delay between attempts grows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RetryPolicy {
    /// No delay between attempts.
    None,
    /// Fixed delay equal to `initial_delay`.
    Linear,
    /// Delay grows as `initial_delay * multiplier^(attempt - 1)`.
    #[default]
    Exponential,
    /// Delay grows as `initial_delay * fib(attempt)`.
    Fibonacci,
    /// Delay is computed by `RetryConfig::calculate_delay`.
    Custom,
}

type ShouldRetryFn = dyn Fn(u32, &str) -> bool + Send + Sync;
type CalculateDelayFn = dyn Fn(u32) -> Duration + Send + Sync;

/// Immutable snapshot of retry behaviour for a single operation.
///
/// Cloning is cheap: the callback fields are `Arc`-wrapped trait objects
/// rather than bare function pointers, since they may carry captured state.
#[derive(Clone)]
pub struct RetryConfig {
    /// Backoff policy.
    pub policy: RetryPolicy,
    /// Maximum number of attempts (including the first).
    pub max_attempts: u32,
    /// Base delay used by `Linear`/`Exponential`/`Fibonacci`.
    pub initial_delay: Duration,
    /// Upper bound applied to every computed delay.
    pub max_delay: Duration,
    /// Overall wall-clock budget; `None` means unbounded.
    pub overall_timeout: Option<Duration>,
    /// Multiplier used by the `Exponential` policy.
    pub backoff_multiplier: f64,
    /// Fractional jitter applied to the computed delay, in `[0, 1]`.
    pub jitter_factor: f64,
    /// Whether jitter is applied at all.
    pub enable_jitter: bool,
    /// Optional override deciding whether a given failure should retry.
    pub should_retry: Option<Arc<ShouldRetryFn>>,
    /// Optional override computing the delay for a given attempt.
    pub calculate_delay: Option<Arc<CalculateDelayFn>>,
}

impl std::fmt::Debug for RetryConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetryConfig")
            .field("policy", &self.policy)
            .field("max_attempts", &self.max_attempts)
            .field("initial_delay", &self.initial_delay)
            .field("max_delay", &self.max_delay)
            .field("overall_timeout", &self.overall_timeout)
            .field("backoff_multiplier", &self.backoff_multiplier)
            .field("jitter_factor", &self.jitter_factor)
            .field("enable_jitter", &self.enable_jitter)
            .field("should_retry", &self.should_retry.is_some())
            .field("calculate_delay", &self.calculate_delay.is_some())
            .finish()
    }
}

impl PartialEq for RetryConfig {
    fn eq(&self, other: &Self) -> bool {
        self.policy == other.policy
            && self.max_attempts == other.max_attempts
            && self.initial_delay == other.initial_delay
            && self.max_delay == other.max_delay
            && self.overall_timeout == other.overall_timeout
            && (self.backoff_multiplier - other.backoff_multiplier).abs() < f64::EPSILON
            && (self.jitter_factor - other.jitter_factor).abs() < f64::EPSILON
            && self.enable_jitter == other.enable_jitter
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            policy: RetryPolicy::Exponential,
            max_attempts: 3,
            initial_delay: Duration::from_millis(1000),
            max_delay: Duration::from_millis(30_000),
            overall_timeout: None,
            backoff_multiplier: 2.0,
            jitter_factor: 0.1,
            enable_jitter: true,
            should_retry: None,
            calculate_delay: None,
        }
    }
}

impl RetryConfig {
    /// Clamp a negative-looking (pre-validated) delay to zero: a negative
    /// initial delay is treated as zero. Since `Duration` cannot itself be
    /// negative, this is applied by callers that build a `RetryConfig` from
    /// signed external input before constructing the `Duration`.
    #[must_use]
    pub fn non_negative_millis(value: i64) -> Duration {
        Duration::from_millis(value.max(0).unsigned_abs())
    }
}

/// Non-retryable substrings checked against an error's `Display` text when
/// the caller supplies no explicit `is_retryable` predicate.
pub const DEFAULT_NON_RETRYABLE_SUBSTRINGS: &[&str] = &[
    "authentication failed",
    "unauthorized",
    "forbidden",
    "not found",
    "method not allowed",
    "invalid request",
    "malformed",
    "syntax error",
    "parse error",
    "invalid format",
    "unsupported",
    "cancelled",
    "aborted",
];

/// Default retryability check: retry unless the error text contains one of
/// [`DEFAULT_NON_RETRYABLE_SUBSTRINGS`] (case-insensitive).
#[must_use]
pub fn default_is_retryable(error_text: &str) -> bool {
    let lower = error_text.to_lowercase();
    !DEFAULT_NON_RETRYABLE_SUBSTRINGS
        .iter()
        .any(|needle| lower.contains(needle))
}

/// Convenience constructors for common retry-policy shapes.
pub mod presets {
    use super::{RetryConfig, RetryPolicy};
    use std::time::Duration;

    /// Network-class operations: exponential 1s→30s, 5 attempts, 5 min cap.
    #[must_use]
    pub fn network() -> RetryConfig {
        RetryConfig {
            policy: RetryPolicy::Exponential,
            max_attempts: 5,
            initial_delay: Duration::from_millis(1000),
            max_delay: Duration::from_millis(30_000),
            overall_timeout: Some(Duration::from_millis(300_000)),
            backoff_multiplier: 2.0,
            enable_jitter: true,
            ..RetryConfig::default()
        }
    }

    /// File I/O-class operations: linear 500ms, 3 attempts, 30s cap.
    #[must_use]
    pub fn file_io() -> RetryConfig {
        RetryConfig {
            policy: RetryPolicy::Linear,
            max_attempts: 3,
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_millis(2000),
            overall_timeout: Some(Duration::from_millis(30_000)),
            enable_jitter: false,
            ..RetryConfig::default()
        }
    }

    /// Hardware-class operations: fibonacci 250ms, 4 attempts, 60s cap.
    #[must_use]
    pub fn hardware() -> RetryConfig {
        RetryConfig {
            policy: RetryPolicy::Fibonacci,
            max_attempts: 4,
            initial_delay: Duration::from_millis(250),
            max_delay: Duration::from_millis(5000),
            overall_timeout: Some(Duration::from_millis(60_000)),
            enable_jitter: true,
            ..RetryConfig::default()
        }
    }

    /// Database-class operations: exponential 100ms (x1.5), 3 attempts, 10s cap.
    #[must_use]
    pub fn database() -> RetryConfig {
        RetryConfig {
            policy: RetryPolicy::Exponential,
            max_attempts: 3,
            initial_delay: Duration::from_millis(100),
            max_delay: Duration::from_millis(1000),
            overall_timeout: Some(Duration::from_millis(10_000)),
            backoff_multiplier: 1.5,
            enable_jitter: false,
            ..RetryConfig::default()
        }
    }

    /// Media/FFmpeg-class operations: fibonacci 2s→15s.
    #[must_use]
    pub fn media() -> RetryConfig {
        RetryConfig {
            policy: RetryPolicy::Fibonacci,
            max_attempts: 4,
            initial_delay: Duration::from_millis(2000),
            max_delay: Duration::from_millis(15_000),
            overall_timeout: Some(Duration::from_millis(120_000)),
            enable_jitter: true,
            ..RetryConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_retry_predicate_blocks_known_substrings() {
        assert!(!default_is_retryable("Unauthorized access"));
        assert!(!default_is_retryable("parse error near token"));
        assert!(default_is_retryable("connection reset by peer"));
    }

    #[test]
    fn presets_have_expected_shape() {
        let net = presets::network();
        assert_eq!(net.max_attempts, 5);
        assert_eq!(net.policy, RetryPolicy::Exponential);

        let db = presets::database();
        assert!((db.backoff_multiplier - 1.5).abs() < f64::EPSILON);
        assert!(!db.enable_jitter);
    }
}
