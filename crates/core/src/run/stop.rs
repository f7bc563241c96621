use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Cooperative stop request shared between a runner and its callers.
///
/// Stopping never interrupts a conversion already in progress; it only
/// prevents further jobs from being dispatched.
#[derive(Debug, Clone, Default)]
pub struct StopHandle {
    stopped: Arc<AtomicBool>,
}

impl StopHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests a stop. Idempotent.
    pub fn stop(&self) {
        if !self.stopped.swap(true, Ordering::SeqCst) {
            tracing::info!("Stop requested; no further jobs will be dispatched");
        }
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }

    /// Clears a previous stop request. `BatchConverter` does this when each
    /// run starts.
    pub fn reset(&self) {
        self.stopped.store(false, Ordering::SeqCst);
    }
}
