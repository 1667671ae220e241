//! # signalk-core
//!
//! Core SignalK data model and helpers shared by the writer crates.
//!
//! This crate provides:
//! - Data model types (Delta, Update, PathValue, Position)
//! - Path naming (dot-separated SignalK paths to camelCase field names)
//! - Geohash encoding and decoding for positions
//!
//! This crate is intentionally runtime-agnostic and contains no async code.

pub mod geohash;
pub mod model;
pub mod path;

pub use model::*;
pub use path::camel_case;
