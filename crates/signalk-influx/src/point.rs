//! Time-series points produced from deltas.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};

/// Measurement name every point is written under.
pub const MEASUREMENT: &str = "signalk";

/// A value that can be stored in an InfluxDB field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// 64-bit floating point.
    Float(f64),
    /// UTF-8 string (geohashes).
    String(String),
}

impl FieldValue {
    /// The numeric value, if this is a float field.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Float(v) => Some(*v),
            FieldValue::String(_) => None,
        }
    }

    /// The string value, if this is a string field.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::Float(_) => None,
            FieldValue::String(s) => Some(s),
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Float(v) => write!(f, "{}", v),
            FieldValue::String(s) => write!(f, "{}", s),
        }
    }
}

/// Field name to value. Ordered so encoded lines are deterministic.
pub type Fields = BTreeMap<String, FieldValue>;

/// One time-series record destined for the sink.
#[derive(Debug, Clone, PartialEq)]
pub struct Point {
    pub measurement: &'static str,
    pub fields: Fields,
    pub timestamp: DateTime<Utc>,
}

impl Point {
    /// Create a point under the [`MEASUREMENT`] measurement.
    pub fn new(fields: Fields, timestamp: DateTime<Utc>) -> Self {
        Self {
            measurement: MEASUREMENT,
            fields,
            timestamp,
        }
    }

    /// Look up a field by name.
    pub fn field(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }
}
