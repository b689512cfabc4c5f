//! Default retry configuration chosen by component name when a strategy
//! supplies no explicit [`vellum_retry::RetryConfig`].

use vellum_retry::{RetryConfig, RetryPolicy};

/// Pick a retry shape from the component name: `Network`/`Download` get
/// exponential backoff, `Storage`/`Database` get linear backoff,
/// `FFmpeg`/`Media` get fibonacci backoff, anything else gets a gentler
/// exponential default.
#[must_use]
pub fn default_retry_config(component: &str) -> RetryConfig {
    use std::time::Duration;

    let mut config = if contains_ignore_case(component, "Network") || contains_ignore_case(component, "Download") {
        RetryConfig {
            policy: RetryPolicy::Exponential,
            initial_delay: Duration::from_millis(1000),
            max_delay: Duration::from_millis(30_000),
            backoff_multiplier: 2.0,
            ..RetryConfig::default()
        }
    } else if contains_ignore_case(component, "Storage") || contains_ignore_case(component, "Database") {
        RetryConfig {
            policy: RetryPolicy::Linear,
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_millis(5000),
            ..RetryConfig::default()
        }
    } else if contains_ignore_case(component, "FFmpeg")
        || contains_ignore_case(component, "Media")
        || contains_ignore_case(component, "Whisper")
    {
        RetryConfig {
            policy: RetryPolicy::Fibonacci,
            initial_delay: Duration::from_millis(2000),
            max_delay: Duration::from_millis(15_000),
            ..RetryConfig::default()
        }
    } else {
        RetryConfig {
            policy: RetryPolicy::Exponential,
            initial_delay: Duration::from_millis(1000),
            max_delay: Duration::from_millis(10_000),
            ..RetryConfig::default()
        }
    };

    config.enable_jitter = true;
    config.jitter_factor = 0.1;
    config
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// Default retryability check used when a `Retry` action has no custom
/// `should_retry` override: never retry `Fatal`-severity errors or messages
/// that look like permission/authorization failures.
#[must_use]
pub fn default_should_retry(is_fatal: bool, message: &str) -> bool {
    if is_fatal {
        return false;
    }
    let lower = message.to_lowercase();
    !["permission", "access denied", "unauthorized", "invalid credentials"]
        .iter()
        .any(|needle| lower.contains(needle))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn picks_policy_by_component_name() {
        assert_eq!(default_retry_config("NetworkDownloader").policy, RetryPolicy::Exponential);
        assert_eq!(default_retry_config("StorageLayer").policy, RetryPolicy::Linear);
        assert_eq!(default_retry_config("MediaPipeline").policy, RetryPolicy::Fibonacci);
        assert_eq!(default_retry_config("WhisperEngine").policy, RetryPolicy::Fibonacci);
    }

    #[test]
    fn blocks_fatal_and_permission_errors() {
        assert!(!default_should_retry(true, "anything"));
        assert!(!default_should_retry(false, "Access Denied"));
        assert!(default_should_retry(false, "connection reset"));
    }
}
