//! Owner of detached job runs and their shutdown signal.

use std::future::Future;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::info;

/// Spawns detached job runs and drains them on shutdown.
///
/// Runs receive the executor's cancellation token; cancelling it releases
/// jobs still waiting at the admission gate while runs already executing
/// finish normally.
#[derive(Debug, Clone, Default)]
pub struct JobExecutor {
    tracker: TaskTracker,
    shutdown: CancellationToken,
}

impl JobExecutor {
    /// Creates an executor with no runs in flight.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawns a run built from the shutdown token.
    pub fn spawn<F, Fut>(&self, run: F)
    where
        F: FnOnce(CancellationToken) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.tracker.spawn(run(self.shutdown.clone()));
    }

    /// Returns the number of runs still in flight.
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.tracker.len()
    }

    /// Waits until every spawned run has finished, without cancelling any.
    ///
    /// The tracker stays closed when shutdown began while waiting.
    pub async fn wait_idle(&self) {
        self.tracker.close();
        self.tracker.wait().await;
        if self.shutdown.is_cancelled() {
            return;
        }
        self.tracker.reopen();
        if self.shutdown.is_cancelled() {
            self.tracker.close();
        }
    }

    /// Returns whether the executor currently refuses to track new runs.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.tracker.is_closed()
    }

    /// Cancels queued runs, stops accepting new ones, and waits for the
    /// remaining runs to finish.
    pub async fn shutdown(&self) {
        info!(in_flight = self.in_flight(), "shutting down job executor");
        self.shutdown.cancel();
        self.tracker.close();
        self.tracker.wait().await;
    }

    /// Returns whether shutdown has begun.
    #[must_use]
    pub fn is_shutting_down(&self) -> bool {
        self.shutdown.is_cancelled()
    }
}
