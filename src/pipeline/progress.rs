//! Progress reporting
//!
//! The pipeline only emits counters; how they are shown is up to the
//! observer it was built with.

/// Counters reported after each primary page event
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProgressSnapshot {
    pub pages_crawled: u64,
    pub buffer_depth: usize,
}

/// Receives progress updates from concurrent pipeline tasks
pub trait ProgressObserver: Send + Sync {
    fn on_progress(&self, snapshot: ProgressSnapshot);
}

/// Logs progress through `tracing`
///
/// Every update is logged at debug level; every `every`th page is also
/// logged at info level.
#[derive(Debug, Clone)]
pub struct TracingProgress {
    every: u64,
}

impl TracingProgress {
    pub fn new(every: u64) -> Self {
        Self {
            every: every.max(1),
        }
    }
}

impl Default for TracingProgress {
    fn default() -> Self {
        Self::new(25)
    }
}

impl ProgressObserver for TracingProgress {
    fn on_progress(&self, snapshot: ProgressSnapshot) {
        if snapshot.pages_crawled % self.every == 0 {
            tracing::info!(
                "Progress: {} pages crawled, {} records buffered",
                snapshot.pages_crawled,
                snapshot.buffer_depth
            );
        } else {
            tracing::debug!(
                "Progress: {} pages crawled, {} records buffered",
                snapshot.pages_crawled,
                snapshot.buffer_depth
            );
        }
    }
}

/// Discards progress updates
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressObserver for NoProgress {
    fn on_progress(&self, _snapshot: ProgressSnapshot) {}
}
