//! Sink trait and error types
//!
//! This module defines the boundary between the result buffer and durable
//! storage.

use crate::pipeline::ResultRecord;
use thiserror::Error;

/// Errors that can occur while persisting a batch
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Sink unavailable: {0}")]
    Unavailable(String),
}

/// Result type for sink operations
pub type SinkResult<T> = Result<T, SinkError>;

/// Trait for result sinks
///
/// A sink receives ordered batches and appends them to durable storage. The
/// result buffer calls it while holding its own lock, so implementations need
/// no internal synchronization, and it never submits the same batch twice.
pub trait PersistenceSink: Send {
    /// Appends a batch of records, preserving their order
    ///
    /// # Arguments
    ///
    /// * `records` - The batch; may be empty
    fn append_batch(&mut self, records: &[ResultRecord]) -> SinkResult<()>;

    /// Finalizes the output after the last batch
    fn finish(&mut self) -> SinkResult<()> {
        Ok(())
    }
}
