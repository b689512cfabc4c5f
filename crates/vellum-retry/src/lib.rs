//! Retry engine: configurable backoff policies for transient failures
//! across the download, media, transcription, and storage components.
#![forbid(unsafe_code)]
#![deny(
    warnings,
    dead_code,
    unused,
    missing_docs,
    clippy::all,
    clippy::pedantic,
    clippy::nursery
)]
#![allow(clippy::module_name_repetitions)]

mod config;
mod engine;
mod error;
mod events;

pub use config::{
    default_is_retryable, presets as retry_presets, RetryConfig, RetryPolicy,
    DEFAULT_NON_RETRYABLE_SUBSTRINGS,
};
pub use engine::RetryEngine;
pub use error::{RetryError, RetryResult};
pub use events::RetryEvent;

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test(start_paused = true)]
    async fn exponential_preset_retries_to_success() {
        let engine = RetryEngine::new(RetryConfig {
            enable_jitter: false,
            max_delay: Duration::from_millis(50),
            ..retry_presets::network()
        });
        let mut events = engine.subscribe();

        let attempts = std::sync::Arc::new(std::sync::atomic::AtomicU32::new(0));
        let attempts_clone = attempts.clone();
        let result = engine
            .execute(move |_n| {
                let attempts = attempts_clone.clone();
                async move {
                    let count = attempts.fetch_add(1, std::sync::atomic::Ordering::SeqCst) + 1;
                    if count < 3 {
                        Err("service unavailable".to_string())
                    } else {
                        Ok("done")
                    }
                }
            })
            .await;

        assert_eq!(result, Ok("done"));
        assert_eq!(attempts.load(std::sync::atomic::Ordering::SeqCst), 3);

        let mut saw_completed = false;
        while let Ok(event) = events.try_recv() {
            if matches!(event, RetryEvent::OperationCompleted { attempts, .. } if attempts == 3) {
                saw_completed = true;
            }
        }
        assert!(saw_completed);
    }
}
