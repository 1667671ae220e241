//! InfluxDB Line Protocol encoding.
//!
//! Line Protocol format:
//! ```text
//! measurement field1=val1,field2=val2 timestamp
//! ```
//!
//! Points carry no tags. Timestamps are written in milliseconds, so the
//! write request must use `precision=ms`.
//!
//! See: <https://docs.influxdata.com/influxdb/v2/reference/syntax/line-protocol/>

use crate::point::{FieldValue, Point};

/// Precision of the timestamps produced by [`encode_point`].
pub const PRECISION: &str = "ms";

/// Format a field value for Line Protocol.
///
/// - Float: written as-is (e.g., `3.14`, `5`)
/// - String: quoted with double quotes, inner quotes and backslashes escaped
pub fn encode_value(value: &FieldValue) -> String {
    match value {
        FieldValue::Float(v) => format!("{}", v),
        FieldValue::String(v) => {
            let escaped = v.replace('\\', "\\\\").replace('"', "\\\"");
            format!("\"{}\"", escaped)
        }
    }
}

/// Encode a single point as one line.
pub fn encode_point(point: &Point) -> String {
    let mut line = escape_measurement(point.measurement);
    line.push(' ');

    for (i, (key, value)) in point.fields.iter().enumerate() {
        if i > 0 {
            line.push(',');
        }
        line.push_str(&escape_key(key));
        line.push('=');
        line.push_str(&encode_value(value));
    }

    line.push(' ');
    line.push_str(&point.timestamp.timestamp_millis().to_string());
    line
}

/// Encode a batch as a newline-separated request body.
pub fn encode_batch(points: &[Point]) -> String {
    points
        .iter()
        .map(encode_point)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Spaces and commas must be escaped with backslash.
fn escape_measurement(s: &str) -> String {
    s.replace(',', "\\,").replace(' ', "\\ ")
}

/// Commas, equals signs, and spaces must be escaped.
fn escape_key(s: &str) -> String {
    s.replace(',', "\\,")
        .replace('=', "\\=")
        .replace(' ', "\\ ")
}
