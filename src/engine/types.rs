//! Engine type definitions

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Default bounded worker pool capacity per job
pub const DEFAULT_WORKER_CAPACITY: usize = 8;

/// Shared, checkable stop flag for one job
///
/// Cancellation is cooperative: setting the flag requests a stop but never
/// interrupts a plugin mid-call. Plugin tasks observe the flag between
/// produced findings.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation; idempotent
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}
