//! # signalk-influx
//!
//! Writes SignalK deltas to InfluxDB.
//!
//! ```text
//! Delta --> DeltaRouter --+--> extract_fields --+--> BatchFlusher --> PointSink
//!                         +--> TrueWindEngine --+
//! ```
//!
//! - [`router::DeltaRouter`] keeps deltas for the configured vessel and
//!   turns each path/value into at most one [`Point`].
//! - [`true_wind::TrueWindEngine`] combines the latest apparent wind,
//!   speed over ground and course over ground into a true wind point.
//! - [`flusher::BatchFlusher`] hands the batch to the sink on a separate
//!   task once it grows past the threshold; failed writes are logged and
//!   dropped.
//! - [`InfluxWriter`] ties these together behind `process(delta)`.
//!
//! Deltas arrive from a SignalK WebSocket stream or from newline-delimited
//! JSON, see [`source`].

pub mod config;
pub mod fields;
pub mod flusher;
pub mod line_protocol;
pub mod point;
pub mod router;
pub mod sink;
pub mod source;
pub mod true_wind;
pub mod writer;

pub use config::{ConfigError, InfluxConfig, WriterConfig};
pub use point::{FieldValue, Fields, Point, MEASUREMENT};
pub use sink::{InfluxSink, PointSink, SinkError};
pub use writer::InfluxWriter;
