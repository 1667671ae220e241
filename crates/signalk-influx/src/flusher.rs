//! Threshold-triggered, fire-and-forget batch writes.
//!
//! The flusher owns the pending points. Once per processed delta
//! [`BatchFlusher::after_delta`] checks the batch; when it holds more than
//! the threshold the batch is swapped for an empty one and written on a
//! separate task. The caller never waits for the write, and a failed write
//! is logged and its points discarded.
//!
//! Writes run concurrently up to a semaphore limit and are bounded by a
//! timeout.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, error};

use crate::config::WriterConfig;
use crate::point::Point;
use crate::sink::{PointSink, SinkError};

/// Write counters, shared with the write tasks.
#[derive(Debug, Default)]
pub struct FlushStats {
    batches_dispatched: AtomicU64,
    points_written: AtomicU64,
    points_failed: AtomicU64,
    inflight_writes: AtomicU64,
}

impl FlushStats {
    pub fn batches_dispatched(&self) -> u64 {
        self.batches_dispatched.load(Ordering::Relaxed)
    }

    pub fn points_written(&self) -> u64 {
        self.points_written.load(Ordering::Relaxed)
    }

    /// Points lost to failed or timed out writes.
    pub fn points_failed(&self) -> u64 {
        self.points_failed.load(Ordering::Relaxed)
    }

    pub fn inflight_writes(&self) -> u64 {
        self.inflight_writes.load(Ordering::Relaxed)
    }
}

/// Pending batch plus the machinery to write it out.
pub struct BatchFlusher<S> {
    sink: Arc<S>,
    pending: Vec<Point>,
    threshold: usize,
    write_timeout: Duration,
    permits: Arc<Semaphore>,
    tasks: JoinSet<()>,
    stats: Arc<FlushStats>,
}

impl<S: PointSink> BatchFlusher<S> {
    /// Create a flusher.
    ///
    /// A write is dispatched when the batch holds more than `threshold`
    /// points; at most `max_inflight` writes reach the sink at once.
    pub fn new(sink: Arc<S>, threshold: usize, max_inflight: usize, write_timeout: Duration) -> Self {
        Self {
            sink,
            pending: Vec::new(),
            threshold,
            write_timeout,
            permits: Arc::new(Semaphore::new(max_inflight.max(1))),
            tasks: JoinSet::new(),
            stats: Arc::new(FlushStats::default()),
        }
    }

    /// Create a flusher from writer configuration.
    pub fn from_config(config: &WriterConfig, sink: Arc<S>) -> Self {
        Self::new(
            sink,
            config.batch_size,
            config.max_inflight_writes,
            config.write_timeout(),
        )
    }

    /// Append points to the pending batch.
    pub fn push(&mut self, points: impl IntoIterator<Item = Point>) {
        self.pending.extend(points);
    }

    /// Dispatch the batch if it has grown past the threshold.
    ///
    /// Returns whether a write was dispatched. Never waits for the write.
    pub fn after_delta(&mut self) -> bool {
        self.reap();
        if self.pending.len() > self.threshold {
            self.dispatch();
            true
        } else {
            false
        }
    }

    /// Dispatch whatever is pending, regardless of size.
    pub fn flush_now(&mut self) -> bool {
        if self.pending.is_empty() {
            return false;
        }
        self.dispatch();
        true
    }

    /// Wait for every dispatched write to finish.
    pub async fn drain(&mut self) {
        while let Some(result) = self.tasks.join_next().await {
            log_join_error(result);
        }
    }

    /// Number of points waiting for the next flush.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Points waiting for the next flush.
    pub fn pending(&self) -> &[Point] {
        &self.pending
    }

    pub fn stats(&self) -> Arc<FlushStats> {
        self.stats.clone()
    }

    fn dispatch(&mut self) {
        let batch = std::mem::take(&mut self.pending);
        let len = batch.len();
        let sink = self.sink.clone();
        let permits = self.permits.clone();
        let stats = self.stats.clone();
        let write_timeout = self.write_timeout;

        stats.batches_dispatched.fetch_add(1, Ordering::Relaxed);
        debug!("Dispatching batch of {} points", len);

        self.tasks.spawn(async move {
            let Ok(_permit) = permits.acquire_owned().await else {
                return;
            };
            stats.inflight_writes.fetch_add(1, Ordering::Relaxed);

            let result = match tokio::time::timeout(write_timeout, sink.write_batch(batch)).await {
                Ok(result) => result,
                Err(_) => Err(SinkError::Timeout(write_timeout.as_millis() as u64)),
            };

            stats.inflight_writes.fetch_sub(1, Ordering::Relaxed);
            match result {
                Ok(()) => {
                    stats.points_written.fetch_add(len as u64, Ordering::Relaxed);
                    debug!("Wrote {} points", len);
                }
                Err(e) => {
                    stats.points_failed.fetch_add(len as u64, Ordering::Relaxed);
                    error!("InfluxDB error, dropped {} points: {}", len, e);
                }
            }
        });
    }

    /// Collect finished write tasks.
    fn reap(&mut self) {
        while let Some(result) = self.tasks.try_join_next() {
            log_join_error(result);
        }
    }
}

fn log_join_error(result: Result<(), tokio::task::JoinError>) {
    if let Err(e) = result {
        error!("Write task failed: {}", e);
    }
}
