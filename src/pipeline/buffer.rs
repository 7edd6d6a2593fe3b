//! Thread-shared result buffer with threshold flush
//!
//! Records queue in FIFO order. Whenever the queue reaches the flush
//! threshold, the task that added the record moves exactly `threshold` of the
//! oldest records into the sink before `add` returns. The queue and the sink
//! share one lock, so an add and the flush it triggers are a single step for
//! every other producer.

use crate::pipeline::record::ResultRecord;
use crate::sink::{PersistenceSink, SinkError, SinkResult};
use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};

/// Counters kept by the buffer
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BufferStats {
    pub records_added: u64,
    pub records_written: u64,
    pub batches_flushed: u64,
}

struct BufferState {
    queue: VecDeque<ResultRecord>,
    sink: Box<dyn PersistenceSink>,
    stats: BufferStats,
    drained: bool,
}

impl BufferState {
    /// Moves the `count` oldest records into the sink
    ///
    /// On failure the batch goes back to the front of the queue, so nothing is
    /// lost and nothing is written twice.
    fn flush(&mut self, count: usize) -> SinkResult<()> {
        let batch: Vec<ResultRecord> = self.queue.drain(..count).collect();

        if let Err(e) = self.sink.append_batch(&batch) {
            for record in batch.into_iter().rev() {
                self.queue.push_front(record);
            }
            return Err(e);
        }

        self.stats.records_written += batch.len() as u64;
        self.stats.batches_flushed += 1;
        tracing::debug!(
            "Flushed batch of {} records ({} queued)",
            batch.len(),
            self.queue.len()
        );
        Ok(())
    }
}

/// Bounded queue of records awaiting persistence
pub struct ResultBuffer {
    threshold: usize,
    state: Mutex<BufferState>,
}

impl ResultBuffer {
    /// Creates a buffer in front of a sink
    ///
    /// # Arguments
    ///
    /// * `sink` - Destination of flushed batches
    /// * `threshold` - Queue length that triggers a flush; at least 1
    pub fn new(sink: Box<dyn PersistenceSink>, threshold: usize) -> Self {
        Self {
            threshold: threshold.max(1),
            state: Mutex::new(BufferState {
                queue: VecDeque::new(),
                sink,
                stats: BufferStats::default(),
                drained: false,
            }),
        }
    }

    /// Queues a record, flushing a batch if the threshold is reached
    ///
    /// Line breaks in the record's text fields are replaced before it is
    /// queued.
    ///
    /// # Returns
    ///
    /// * `Ok(())` - The record is queued or already written
    /// * `Err(SinkError)` - A triggered flush failed; the run should stop
    pub fn add(&self, mut record: ResultRecord) -> SinkResult<()> {
        record.normalize_text();

        let mut state = self.lock()?;
        if state.drained {
            return Err(SinkError::Unavailable(
                "record added after the buffer was drained".to_string(),
            ));
        }

        state.queue.push_back(record);
        state.stats.records_added += 1;

        if state.queue.len() >= self.threshold {
            state.flush(self.threshold)?;
        }

        Ok(())
    }

    /// Flushes whatever remains and finalizes the sink
    ///
    /// Only the first call does anything; an empty remainder writes no batch.
    pub fn drain(&self) -> SinkResult<()> {
        let mut state = self.lock()?;
        if state.drained {
            tracing::warn!("Result buffer drained more than once");
            return Ok(());
        }

        let remaining = state.queue.len();
        if remaining > 0 {
            state.flush(remaining)?;
        }

        state.sink.finish()?;
        state.drained = true;
        Ok(())
    }

    /// Number of records waiting for a flush
    pub fn depth(&self) -> usize {
        self.lock().map(|state| state.queue.len()).unwrap_or(0)
    }

    /// Returns the buffer counters
    pub fn stats(&self) -> BufferStats {
        self.lock().map(|state| state.stats).unwrap_or_default()
    }

    fn lock(&self) -> SinkResult<MutexGuard<'_, BufferState>> {
        self.state
            .lock()
            .map_err(|_| SinkError::Unavailable("result buffer lock poisoned".to_string()))
    }
}
