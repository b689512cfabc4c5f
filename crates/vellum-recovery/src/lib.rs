//! Recovery coordinator: circuit breakers, health checks, component restart
//! dispatch, and automated recovery-strategy execution layered on top of
//! `vellum-retry` and the shared `vellum-errors` error context types.
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

mod action;
mod breaker;
mod coordinator;
mod events;
mod health;
mod history;
mod policy;
mod restart;
mod strategy;

pub use action::RecoveryAction;
pub use coordinator::RecoveryCoordinator;
pub use events::RecoveryEvent;
pub use health::HealthCheckFn;
pub use history::{ErrorHistory, ErrorStatistics, DEFAULT_MAX_HISTORY};
pub use policy::{default_retry_config, default_should_retry};
pub use restart::restart_action_for;
pub use strategy::{strategies as recovery_strategies, RecoveryFn, RecoveryStrategy};

#[cfg(test)]
mod tests {
    use super::*;
    use vellum_errors::{ErrorContextBuilder, ErrorSeverity};

    #[tokio::test]
    async fn circuit_breaker_trips_after_repeated_failures() {
        let coordinator = RecoveryCoordinator::new();
        coordinator.enable_circuit_breaker("StorageLayer", 2, std::time::Duration::from_secs(60));

        for _ in 0..2 {
            let context = ErrorContextBuilder::new("StorageLayer", "query", "disk_error")
                .message("disk read failed")
                .severity(ErrorSeverity::Error)
                .build();
            coordinator.report_error(context).await;
        }

        assert!(coordinator.is_circuit_open("StorageLayer"));
    }

    #[tokio::test]
    async fn critical_error_triggers_user_prompt() {
        let coordinator = RecoveryCoordinator::new();
        let mut events = coordinator.subscribe();

        let context = ErrorContextBuilder::new("WhisperEngine", "transcribe", "inference_failed")
            .message("model crashed")
            .severity(ErrorSeverity::Critical)
            .build();
        coordinator.report_error(context).await;

        let mut saw_prompt = false;
        while let Ok(event) = events.try_recv() {
            if matches!(event, RecoveryEvent::UserPromptRequested { component, .. } if component == "WhisperEngine") {
                saw_prompt = true;
            }
        }
        assert!(saw_prompt);
    }

    #[tokio::test]
    async fn restart_action_emitted_for_registered_strategy() {
        let coordinator = RecoveryCoordinator::new();
        coordinator.register_recovery_strategy(
            "MediaPipeline",
            "convert",
            recovery_strategies::restart_component(),
        );
        let mut events = coordinator.subscribe();

        let context = ErrorContextBuilder::new("MediaPipeline", "convert", "audio_processing_failed")
            .message("ffmpeg exited with code 1")
            .severity(ErrorSeverity::Error)
            .build();
        coordinator.report_error(context).await;

        let mut saw_restart = false;
        while let Ok(event) = events.try_recv() {
            if let RecoveryEvent::ComponentRestartRequested { component, action } = event {
                assert_eq!(component, "MediaPipeline");
                assert_eq!(action, "reinitialize_libraries");
                saw_restart = true;
            }
        }
        assert!(saw_restart);
    }

    #[test]
    fn error_history_respects_configured_cap() {
        let coordinator = RecoveryCoordinator::new();
        coordinator.set_max_error_history(1);
        let runtime = tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap();
        runtime.block_on(async {
            for i in 0..3 {
                let context = ErrorContextBuilder::new("Downloader", "fetch", "network_error")
                    .message(format!("attempt {i}"))
                    .severity(ErrorSeverity::Warning)
                    .build();
                coordinator.report_error(context).await;
            }
        });
        assert_eq!(coordinator.error_history(None).len(), 1);
    }
}
