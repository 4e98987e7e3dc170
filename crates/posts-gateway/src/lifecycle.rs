use std::future::Future;

use tokio::task::JoinHandle;
use tokio_util::task::TaskTracker;
use tracing::info;

/// Lifecycle extension for work that must outlive the response that started it.
///
/// Handlers hand futures to [`Lifecycle::wait_until`]; the entry point calls
/// [`Lifecycle::drain`] on shutdown so every tracked task runs to completion.
#[derive(Clone, Default)]
pub struct Lifecycle {
    tracker: TaskTracker,
}

impl Lifecycle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawn `fut` as a tracked background task and return its handle.
    pub fn wait_until<F>(&self, fut: F) -> JoinHandle<F::Output>
    where
        F: Future + Send + 'static,
        F::Output: Send + 'static,
    {
        self.tracker.spawn(fut)
    }

    /// Number of tracked tasks still running.
    pub fn pending(&self) -> usize {
        self.tracker.len()
    }

    /// Stop accepting new work and wait for every tracked task to finish.
    pub async fn drain(&self) {
        self.tracker.close();
        if !self.tracker.is_empty() {
            info!(pending = self.tracker.len(), "waiting for background tasks");
        }
        self.tracker.wait().await;
    }
}
