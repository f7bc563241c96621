use std::time::Duration;
use tokio::sync::watch;

use crate::run::ConversionResult;

use super::types::{ProgressSnapshot, RunState};

/// Owner of the aggregate counters for a run.
///
/// There is exactly one writer: the runner's result consumer calls
/// [`on_result`](Self::on_result). Any number of [`ProgressWatcher`]s read
/// snapshots concurrently; publishing a snapshot never waits for them.
#[derive(Debug)]
pub struct ProgressReporter {
    current: ProgressSnapshot,
    tx: watch::Sender<ProgressSnapshot>,
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressReporter {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(ProgressSnapshot::default());
        Self {
            current: ProgressSnapshot::default(),
            tx,
        }
    }

    /// Returns a read-only handle on the latest snapshot.
    pub fn watcher(&self) -> ProgressWatcher {
        ProgressWatcher {
            rx: self.tx.subscribe(),
        }
    }

    /// Resets the counters for a new run of `total` jobs.
    ///
    /// An empty run has nothing to wait for and is completed immediately.
    pub fn start(&mut self, total: usize) {
        self.current = ProgressSnapshot {
            state: if total == 0 {
                RunState::Completed
            } else {
                RunState::NotStarted
            },
            total,
            ..ProgressSnapshot::default()
        };
        self.publish();
    }

    /// Folds one result into the counters.
    pub fn on_result(&mut self, result: &ConversionResult) {
        if self.current.state == RunState::Completed {
            tracing::warn!(
                input = %result.input_path.display(),
                "Result reported after run completed; ignoring"
            );
            return;
        }

        if result.is_not_run() {
            self.current.not_run += 1;
        } else {
            self.current.completed += 1;
            if result.is_success() {
                self.current.succeeded += 1;
            } else {
                self.current.failed += 1;
            }
            self.current.elapsed += result.elapsed;
        }

        self.current.state = if self.current.reported() >= self.current.total {
            RunState::Completed
        } else {
            RunState::Running
        };
        self.publish();
    }

    pub fn snapshot(&self) -> ProgressSnapshot {
        self.current.clone()
    }

    fn publish(&self) {
        // send_replace succeeds even when nobody is watching
        self.tx.send_replace(self.current.clone());
    }
}

/// Read side of a [`ProgressReporter`]. Cheap to clone.
#[derive(Debug, Clone)]
pub struct ProgressWatcher {
    rx: watch::Receiver<ProgressSnapshot>,
}

impl ProgressWatcher {
    /// Latest published snapshot. Never blocks the writer.
    pub fn snapshot(&self) -> ProgressSnapshot {
        self.rx.borrow().clone()
    }

    /// Waits until a newer snapshot is published. Returns `None` once the
    /// reporter is gone.
    pub async fn changed(&mut self) -> Option<ProgressSnapshot> {
        self.rx.changed().await.ok()?;
        Some(self.rx.borrow_and_update().clone())
    }

    /// Waits for the current run to complete, or `timeout` to elapse.
    pub async fn wait_for_completion(&mut self, timeout: Duration) -> Option<ProgressSnapshot> {
        let wait = self.rx.wait_for(|s| s.state == RunState::Completed);
        match tokio::time::timeout(timeout, wait).await {
            Ok(Ok(snapshot)) => Some(snapshot.clone()),
            _ => None,
        }
    }
}
