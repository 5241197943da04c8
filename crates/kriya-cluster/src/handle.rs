//! Handle for cancellable background tasks.

use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Handle to a spawned background loop (heartbeat, rebalance, redundancy).
///
/// Dropping the handle does not stop the task; call [`TaskHandle::stop`]
/// for a cooperative shutdown (the in-flight tick completes).
pub struct TaskHandle {
    shutdown_tx: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl TaskHandle {
    pub(crate) fn new(shutdown_tx: watch::Sender<bool>, task: JoinHandle<()>) -> Self {
        Self { shutdown_tx, task }
    }

    /// Signal the loop to stop scheduling further ticks.
    pub fn stop(&self) {
        let _ = self.shutdown_tx.send(true);
    }

    /// Whether the background task is still running.
    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }
}
