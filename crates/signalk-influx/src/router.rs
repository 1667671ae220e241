//! Delta routing: context filter, timestamps and point construction.

use chrono::{DateTime, NaiveDateTime, Utc};
use signalk_core::{Delta, Update};
use tracing::debug;

use crate::fields::extract_fields;
use crate::point::Point;
use crate::true_wind::{TrueWindChannel, TrueWindEngine};

/// Turns deltas about one vessel into points.
#[derive(Debug)]
pub struct DeltaRouter {
    /// "vessels." + self id
    self_context: String,
    true_wind: TrueWindEngine,
}

impl DeltaRouter {
    /// Create a router for the vessel identified by `self_id`.
    ///
    /// `self_id` is the bare identifier ("urn:mrn:signalk:uuid:..."); a
    /// leading "vessels." is tolerated.
    pub fn new(self_id: &str) -> Self {
        let id = self_id.strip_prefix("vessels.").unwrap_or(self_id);
        Self {
            self_context: format!("vessels.{}", id),
            true_wind: TrueWindEngine::new(),
        }
    }

    /// The context deltas must carry (or omit) to be routed.
    pub fn self_context(&self) -> &str {
        &self.self_context
    }

    /// Whether a delta is about this vessel.
    pub fn accepts(&self, delta: &Delta) -> bool {
        match &delta.context {
            None => true,
            Some(context) => context == &self.self_context,
        }
    }

    /// The true wind state.
    pub fn true_wind(&self) -> &TrueWindEngine {
        &self.true_wind
    }

    /// Route one delta, returning the points it produced in order.
    ///
    /// A true wind point triggered by a value comes before that value's own
    /// point. Deltas for other vessels produce nothing and leave the true
    /// wind state untouched.
    pub fn route(&mut self, delta: &Delta) -> Vec<Point> {
        let mut points = Vec::new();
        if !self.accepts(delta) {
            return points;
        }

        for update in delta.updates.iter().filter(|u| !u.values.is_empty()) {
            let timestamp = resolve_timestamp(update);

            for pv in &update.values {
                if let Some(channel) = TrueWindChannel::from_path(&pv.path) {
                    match pv.value.as_f64().filter(|v| v.is_finite()) {
                        Some(value) => {
                            points.extend(self.true_wind.observe(channel, value, timestamp));
                        }
                        None => debug!("Ignoring non-numeric {}: {}", pv.path, pv.value),
                    }
                }

                if let Some(fields) = extract_fields(pv) {
                    points.push(Point::new(fields, timestamp));
                }
            }
        }

        points
    }
}

/// The instant an update was taken, or now if it has none or it does not parse.
pub fn resolve_timestamp(update: &Update) -> DateTime<Utc> {
    let Some(raw) = update.timestamp.as_deref() else {
        debug!(
            "Update from {} has no timestamp, using current time",
            update.source_ref.as_deref().unwrap_or("unknown source")
        );
        return Utc::now();
    };

    parse_timestamp(raw).unwrap_or_else(|| {
        debug!(
            "Invalid timestamp {:?} from {}, using current time",
            raw,
            update.source_ref.as_deref().unwrap_or("unknown source")
        );
        Utc::now()
    })
}

/// Parse an ISO 8601 timestamp. Values without an offset are taken as UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(t) = DateTime::parse_from_rfc3339(raw) {
        return Some(t.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|t| t.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::point::FieldValue;
    use crate::true_wind::{DIRECTION_FIELD, SPEED_FIELD};
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use signalk_core::PathValue;

    const SELF_ID: &str = "urn:mrn:signalk:uuid:c0d79334-4e25-4245-8892-54e8ccc8021d";
    const TS: &str = "2024-01-17T10:30:00.000Z";

    fn delta(context: Option<&str>, timestamp: Option<&str>, values: Vec<PathValue>) -> Delta {
        Delta {
            context: context.map(String::from),
            updates: vec![Update {
                source_ref: Some("test.source".to_string()),
                timestamp: timestamp.map(String::from),
                values,
            }],
        }
    }

    fn wind_values(awa: f64, aws: f64, sog: f64, cog: f64) -> Vec<PathValue> {
        vec![
            PathValue::new("environment.wind.angleApparent", json!(awa)),
            PathValue::new("environment.wind.speedApparent", json!(aws)),
            PathValue::new("navigation.speedOverGround", json!(sog)),
            PathValue::new("navigation.courseOverGroundTrue", json!(cog)),
        ]
    }

    #[test]
    fn test_self_context_filter() {
        let mut router = DeltaRouter::new(SELF_ID);
        let sog = || vec![PathValue::new("navigation.speedOverGround", json!(3.5))];

        let own = format!("vessels.{}", SELF_ID);
        assert_eq!(router.route(&delta(Some(own.as_str()), Some(TS), sog())).len(), 1);
        assert_eq!(router.route(&delta(None, Some(TS), sog())).len(), 1);

        let other = delta(Some("vessels.urn:mrn:imo:mmsi:230099999"), Some(TS), wind_values(0.0, 10.0, 5.0, 0.0));
        assert!(router.route(&other).is_empty());
        assert_eq!(router.true_wind().value(TrueWindChannel::SpeedApparent), None);
    }

    #[test]
    fn test_prefixed_self_id() {
        let router = DeltaRouter::new(&format!("vessels.{}", SELF_ID));
        assert_eq!(router.self_context(), format!("vessels.{}", SELF_ID));
    }

    #[test]
    fn test_points_carry_update_timestamp() {
        let mut router = DeltaRouter::new(SELF_ID);
        let points = router.route(&delta(
            None,
            Some(TS),
            vec![
                PathValue::new("navigation.speedOverGround", json!(3.5)),
                PathValue::new("name", json!("Aurora")),
                PathValue::new("navigation.position", json!({"latitude": 60.0, "longitude": 24.9})),
            ],
        ));

        assert_eq!(points.len(), 2);
        let expected: DateTime<Utc> = TS.parse().unwrap();
        assert!(points.iter().all(|p| p.timestamp == expected));
        assert_eq!(
            points[0].field("navigationSpeedOverGround"),
            Some(&FieldValue::Float(3.5))
        );
        assert_eq!(
            points[1].field("navigationPosition"),
            Some(&FieldValue::String("ud9tqdetk49t".to_string()))
        );
    }

    #[test]
    fn test_true_wind_point_precedes_trigger() {
        let mut router = DeltaRouter::new(SELF_ID);
        let points = router.route(&delta(None, Some(TS), wind_values(0.0, 10.0, 5.0, 0.0)));

        // four scalar points plus one true wind point before the last scalar
        assert_eq!(points.len(), 5);
        assert!(points[3].field(SPEED_FIELD).is_some());
        assert!(points[3].field(DIRECTION_FIELD).is_some());
        assert!(points[4].field("navigationCourseOverGroundTrue").is_some());

        let speed = points[3].field(SPEED_FIELD).and_then(FieldValue::as_f64).unwrap();
        assert!((speed - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_repeated_inputs_emit_once() {
        let mut router = DeltaRouter::new(SELF_ID);
        let first = router.route(&delta(None, Some(TS), wind_values(0.0, 10.0, 5.0, 0.0)));
        let second = router.route(&delta(None, Some(TS), wind_values(0.0, 10.0, 5.0, 0.0)));

        let wind_count = first
            .iter()
            .chain(second.iter())
            .filter(|p| p.field(SPEED_FIELD).is_some())
            .count();
        assert_eq!(wind_count, 1);
        assert_eq!(second.len(), 4);
    }

    #[test]
    fn test_empty_updates_ignored() {
        let mut router = DeltaRouter::new(SELF_ID);
        assert!(router.route(&delta(None, Some(TS), vec![])).is_empty());
        assert!(router
            .route(&Delta {
                context: None,
                updates: vec![]
            })
            .is_empty());
    }

    #[test]
    fn test_non_numeric_wind_input_ignored() {
        let mut router = DeltaRouter::new(SELF_ID);
        router.route(&delta(
            None,
            Some(TS),
            vec![PathValue::new("environment.wind.speedApparent", json!("fresh"))],
        ));
        assert_eq!(router.true_wind().value(TrueWindChannel::SpeedApparent), None);
    }

    #[test]
    fn test_invalid_timestamp_falls_back_to_now() {
        let before = Utc::now();
        let mut router = DeltaRouter::new(SELF_ID);
        let sog = vec![PathValue::new("navigation.speedOverGround", json!(3.5))];

        let points = router.route(&delta(None, Some("not a date"), sog.clone()));
        assert!(points[0].timestamp >= before);

        let points = router.route(&delta(None, None, sog));
        assert!(points[0].timestamp >= before);
    }

    #[test]
    fn test_parse_timestamp() {
        let expected: DateTime<Utc> = "2024-01-17T10:30:00Z".parse().unwrap();
        assert_eq!(parse_timestamp("2024-01-17T10:30:00.000Z"), Some(expected));
        assert_eq!(parse_timestamp("2024-01-17T12:30:00+02:00"), Some(expected));
        assert_eq!(parse_timestamp("2024-01-17T10:30:00"), Some(expected));
        assert_eq!(parse_timestamp("2024-13-45T99:00:00Z"), None);
        assert_eq!(parse_timestamp(""), None);
    }
}
