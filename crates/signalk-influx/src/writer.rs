//! The delta-to-InfluxDB pipeline.

use std::sync::Arc;

use signalk_core::Delta;
use tracing::info;

use crate::config::WriterConfig;
use crate::flusher::{BatchFlusher, FlushStats};
use crate::point::Point;
use crate::router::DeltaRouter;
use crate::sink::PointSink;

/// Routes deltas into points and batches them into the sink.
///
/// Owned by a single consumer task; `process` never waits for a write.
pub struct InfluxWriter<S> {
    router: DeltaRouter,
    flusher: BatchFlusher<S>,
}

impl<S: PointSink> InfluxWriter<S> {
    /// Create a writer for the configured vessel.
    pub fn new(config: &WriterConfig, sink: Arc<S>) -> Self {
        Self {
            router: DeltaRouter::new(&config.self_id),
            flusher: BatchFlusher::from_config(config, sink),
        }
    }

    /// Process one delta.
    ///
    /// Points are appended to the pending batch in routing order, then the
    /// batch is written out if it has grown past the threshold. Returns the
    /// number of points the delta produced.
    pub fn process(&mut self, delta: &Delta) -> usize {
        let points = self.router.route(delta);
        let produced = points.len();
        self.flusher.push(points);
        self.flusher.after_delta();
        produced
    }

    /// Write out the partial batch and wait for every in-flight write.
    pub async fn shutdown(&mut self) {
        let pending = self.flusher.pending_len();
        if self.flusher.flush_now() {
            info!("Flushing {} pending points", pending);
        }
        self.flusher.drain().await;

        let stats = self.flusher.stats();
        info!(
            "Writer stopped: {} points written, {} dropped",
            stats.points_written(),
            stats.points_failed()
        );
    }

    /// The context this writer accepts.
    pub fn self_context(&self) -> &str {
        self.router.self_context()
    }

    pub fn pending_len(&self) -> usize {
        self.flusher.pending_len()
    }

    pub fn pending(&self) -> &[Point] {
        self.flusher.pending()
    }

    pub fn stats(&self) -> Arc<FlushStats> {
        self.flusher.stats()
    }
}
