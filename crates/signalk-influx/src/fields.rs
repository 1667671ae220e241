//! Extraction of flat fields from delta values.

use signalk_core::{camel_case, geohash, PathValue, Position};
use tracing::debug;

use crate::point::{FieldValue, Fields};

/// Path whose value is a `{latitude, longitude}` object.
pub const POSITION_PATH: &str = "navigation.position";

/// Turn a path/value pair into at most one field.
///
/// - `navigation.position` becomes a geohash string field.
/// - Finite numbers are kept as-is.
/// - Everything else (strings, objects, null) is not a recordable metric.
///
/// The field key is the camelCased path. Malformed positions are dropped.
pub fn extract_fields(pv: &PathValue) -> Option<Fields> {
    if pv.path == POSITION_PATH {
        return extract_position(pv);
    }

    let value = pv.value.as_f64().filter(|v| v.is_finite())?;
    Some(single(&pv.path, FieldValue::Float(value)))
}

fn extract_position(pv: &PathValue) -> Option<Fields> {
    let Some(position) = Position::from_value(&pv.value) else {
        debug!("Dropping malformed position: {}", pv.value);
        return None;
    };

    match geohash::encode(position.latitude, position.longitude) {
        Ok(hash) => Some(single(&pv.path, FieldValue::String(hash))),
        Err(e) => {
            debug!("Dropping position {}: {}", pv.value, e);
            None
        }
    }
}

fn single(path: &str, value: FieldValue) -> Fields {
    let mut fields = Fields::new();
    fields.insert(camel_case(path), value);
    fields
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_numeric_value() {
        let pv = PathValue::new("navigation.speedOverGround", json!(3.85));
        let fields = extract_fields(&pv).unwrap();

        assert_eq!(fields.len(), 1);
        assert_eq!(
            fields.get("navigationSpeedOverGround"),
            Some(&FieldValue::Float(3.85))
        );
    }

    #[test]
    fn test_integer_value() {
        let pv = PathValue::new("propulsion.0.revolutions", json!(42));
        let fields = extract_fields(&pv).unwrap();

        assert_eq!(fields.get("propulsion0Revolutions"), Some(&FieldValue::Float(42.0)));
    }

    #[test]
    fn test_position_geohash() {
        let pv = PathValue::new(
            POSITION_PATH,
            json!({"latitude": 60.0, "longitude": 24.9}),
        );
        let fields = extract_fields(&pv).unwrap();

        assert_eq!(fields.len(), 1);
        assert_eq!(
            fields.get("navigationPosition"),
            Some(&FieldValue::String(geohash::encode(60.0, 24.9).unwrap()))
        );
        assert_eq!(
            fields["navigationPosition"].as_str(),
            Some("ud9tqdetk49t")
        );
    }

    #[test]
    fn test_malformed_position_dropped() {
        let missing = PathValue::new(POSITION_PATH, json!({"latitude": 60.0}));
        assert!(extract_fields(&missing).is_none());

        let scalar = PathValue::new(POSITION_PATH, json!(60.0));
        assert!(extract_fields(&scalar).is_none());

        let out_of_range = PathValue::new(
            POSITION_PATH,
            json!({"latitude": 60.0, "longitude": 250.0}),
        );
        assert!(extract_fields(&out_of_range).is_none());
    }

    #[test]
    fn test_non_numeric_values_dropped() {
        assert!(extract_fields(&PathValue::new("name", json!("Aurora"))).is_none());
        assert!(extract_fields(&PathValue::new("notifications.mob", json!(null))).is_none());
        assert!(extract_fields(&PathValue::new("steering.autopilot.state", json!(true))).is_none());
        assert!(extract_fields(&PathValue::new(
            "navigation.attitude",
            json!({"roll": 0.1, "pitch": 0.0, "yaw": 1.2})
        ))
        .is_none());
    }
}
