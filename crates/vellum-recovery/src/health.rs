//! Background health checks for registered components.

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;

/// A boxed async health probe returning `true` when the component is healthy.
pub type HealthCheckFn = Arc<dyn Fn() -> Pin<Box<dyn Future<Output = bool> + Send>> + Send + Sync>;

/// A running health-check loop for one component.
pub struct HealthMonitor {
    last_result: Arc<AtomicBool>,
    handle: JoinHandle<()>,
}

impl HealthMonitor {
    /// Spawn a loop that polls `check` every `interval`, invoking
    /// `on_change` whenever the result differs from the previous poll.
    pub fn spawn<F, Fut>(
        interval: Duration,
        mut check: F,
        on_change: impl Fn(bool) + Send + 'static,
    ) -> Self
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = bool> + Send,
    {
        let last_result = Arc::new(AtomicBool::new(true));
        let last_result_task = last_result.clone();

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let healthy = check().await;
                let previous = last_result_task.swap(healthy, Ordering::SeqCst);
                if previous != healthy {
                    on_change(healthy);
                }
            }
        });

        Self {
            last_result,
            handle,
        }
    }

    /// Most recently observed health state; `true` before the first poll.
    #[must_use]
    pub fn last_result(&self) -> bool {
        self.last_result.load(Ordering::SeqCst)
    }
}

impl Drop for HealthMonitor {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
