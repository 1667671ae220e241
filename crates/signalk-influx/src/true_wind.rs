//! True wind derived from apparent wind and vessel motion.
//!
//! Four channels feed the calculation: apparent wind angle and speed, speed
//! over ground and course over ground. [`TrueWindEngine`] holds the latest
//! value of each and recomputes whenever one of them is observed, the way a
//! combine-latest over four streams would. Recomputation with an unchanged
//! set of inputs is suppressed.
//!
//! Angles are in radians with 0 at the bow.

use std::f64::consts::PI;

use chrono::{DateTime, Utc};

use crate::point::{FieldValue, Fields, Point};

/// Field name of the derived true wind direction.
pub const DIRECTION_FIELD: &str = "environmentWindDirectionTrue";

/// Field name of the derived true wind speed.
pub const SPEED_FIELD: &str = "environmentWindSpeedTrue";

/// A SignalK path feeding the true wind calculation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrueWindChannel {
    AngleApparent,
    SpeedApparent,
    SpeedOverGround,
    CourseOverGroundTrue,
}

impl TrueWindChannel {
    pub const ALL: [TrueWindChannel; 4] = [
        TrueWindChannel::AngleApparent,
        TrueWindChannel::SpeedApparent,
        TrueWindChannel::SpeedOverGround,
        TrueWindChannel::CourseOverGroundTrue,
    ];

    /// The SignalK path of this channel.
    pub fn path(self) -> &'static str {
        match self {
            TrueWindChannel::AngleApparent => "environment.wind.angleApparent",
            TrueWindChannel::SpeedApparent => "environment.wind.speedApparent",
            TrueWindChannel::SpeedOverGround => "navigation.speedOverGround",
            TrueWindChannel::CourseOverGroundTrue => "navigation.courseOverGroundTrue",
        }
    }

    /// Map a SignalK path to its channel.
    pub fn from_path(path: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|channel| channel.path() == path)
    }
}

/// True wind speed from apparent wind angle, apparent wind speed and speed over ground.
pub fn true_wind_speed(awa: f64, aws: f64, sog: f64) -> f64 {
    (aws.powi(2) + sog.powi(2) - 2.0 * aws * sog * awa.cos()).sqrt()
}

/// True wind angle relative to the bow. Returns 0 when `tws` is 0.
pub fn true_wind_angle(awa: f64, aws: f64, sog: f64, tws: f64) -> f64 {
    if tws == 0.0 {
        return 0.0;
    }

    // `%` keeps the sign of awa, so port angles may arrive as negatives.
    let normalized = awa % (2.0 * PI);
    let sign = if (normalized < 0.0 && -normalized < PI) || normalized > PI {
        -1.0
    } else {
        1.0
    };

    let cos_angle = ((aws * awa.cos() - sog) / tws).clamp(-1.0, 1.0);
    sign * cos_angle.acos()
}

/// Derived true wind.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrueWind {
    /// Direction relative to true north, radians.
    pub direction: f64,
    /// Speed, same unit as the inputs.
    pub speed: f64,
}

impl TrueWind {
    /// Compute true wind from vessel motion and apparent wind.
    pub fn from_apparent(sog: f64, aws: f64, awa: f64, cog: f64) -> Self {
        let tws = true_wind_speed(awa, aws, sog);
        let twa = true_wind_angle(awa, aws, sog, tws);
        Self {
            direction: (twa + cog) % (2.0 * PI),
            speed: tws,
        }
    }

    /// The derived values as point fields.
    pub fn to_fields(self) -> Fields {
        let mut fields = Fields::new();
        fields.insert(DIRECTION_FIELD.to_string(), FieldValue::Float(self.direction));
        fields.insert(SPEED_FIELD.to_string(), FieldValue::Float(self.speed));
        fields
    }
}

/// The four inputs of one true wind calculation.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Inputs {
    awa: f64,
    aws: f64,
    sog: f64,
    cog: f64,
}

/// Latest value of each channel plus the inputs of the last emission.
#[derive(Debug, Default)]
pub struct TrueWindEngine {
    awa: Option<f64>,
    aws: Option<f64>,
    sog: Option<f64>,
    cog: Option<f64>,
    last_emitted: Option<Inputs>,
}

impl TrueWindEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a channel value and recompute.
    ///
    /// Returns a point stamped with `timestamp` once every channel has a
    /// value and the combination differs from the one last emitted.
    pub fn observe(
        &mut self,
        channel: TrueWindChannel,
        value: f64,
        timestamp: DateTime<Utc>,
    ) -> Option<Point> {
        *self.slot_mut(channel) = Some(value);

        let inputs = self.inputs()?;
        if self.last_emitted == Some(inputs) {
            return None;
        }
        self.last_emitted = Some(inputs);

        let wind = TrueWind::from_apparent(inputs.sog, inputs.aws, inputs.awa, inputs.cog);
        Some(Point::new(wind.to_fields(), timestamp))
    }

    /// Current value of a channel.
    pub fn value(&self, channel: TrueWindChannel) -> Option<f64> {
        match channel {
            TrueWindChannel::AngleApparent => self.awa,
            TrueWindChannel::SpeedApparent => self.aws,
            TrueWindChannel::SpeedOverGround => self.sog,
            TrueWindChannel::CourseOverGroundTrue => self.cog,
        }
    }

    /// True once every channel has been observed.
    pub fn is_primed(&self) -> bool {
        self.inputs().is_some()
    }

    fn slot_mut(&mut self, channel: TrueWindChannel) -> &mut Option<f64> {
        match channel {
            TrueWindChannel::AngleApparent => &mut self.awa,
            TrueWindChannel::SpeedApparent => &mut self.aws,
            TrueWindChannel::SpeedOverGround => &mut self.sog,
            TrueWindChannel::CourseOverGroundTrue => &mut self.cog,
        }
    }

    fn inputs(&self) -> Option<Inputs> {
        Some(Inputs {
            awa: self.awa?,
            aws: self.aws?,
            sog: self.sog?,
            cog: self.cog?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::FRAC_PI_2;

    const EPSILON: f64 = 1e-9;

    fn ts() -> DateTime<Utc> {
        "2024-01-17T10:30:00Z".parse().unwrap()
    }

    fn float(point: &Point, name: &str) -> f64 {
        point.field(name).and_then(FieldValue::as_f64).unwrap()
    }

    #[test]
    fn test_channel_paths() {
        for channel in TrueWindChannel::ALL {
            assert_eq!(TrueWindChannel::from_path(channel.path()), Some(channel));
        }
        assert_eq!(TrueWindChannel::from_path("navigation.headingTrue"), None);
    }

    #[test]
    fn test_head_to_wind() {
        let wind = TrueWind::from_apparent(5.0, 10.0, 0.0, 0.0);
        assert!((wind.speed - 5.0).abs() < EPSILON);
        assert!(wind.direction.abs() < EPSILON);
    }

    #[test]
    fn test_zero_true_wind_speed() {
        assert_eq!(true_wind_angle(0.3, 5.0, 5.0, 0.0), 0.0);

        let wind = TrueWind::from_apparent(5.0, 5.0, 0.0, 1.0);
        assert_eq!(wind.speed, 0.0);
        assert_eq!(wind.direction, 1.0);
    }

    #[test]
    fn test_stationary_vessel_keeps_apparent_angle() {
        let starboard = TrueWind::from_apparent(0.0, 10.0, FRAC_PI_2, 0.0);
        assert!((starboard.direction - FRAC_PI_2).abs() < EPSILON);
        assert!((starboard.speed - 10.0).abs() < EPSILON);

        let port = TrueWind::from_apparent(0.0, 10.0, -FRAC_PI_2, 0.0);
        assert!((port.direction + FRAC_PI_2).abs() < EPSILON);

        let port_positive = TrueWind::from_apparent(0.0, 10.0, 3.0 * FRAC_PI_2, 0.0);
        assert!((port_positive.direction + FRAC_PI_2).abs() < EPSILON);
    }

    #[test]
    fn test_course_is_added() {
        let wind = TrueWind::from_apparent(0.0, 10.0, FRAC_PI_2, 1.0);
        assert!((wind.direction - (FRAC_PI_2 + 1.0)).abs() < EPSILON);

        let wrapped = TrueWind::from_apparent(0.0, 10.0, FRAC_PI_2, 2.0 * PI - 0.5);
        assert!((wrapped.direction - (FRAC_PI_2 - 0.5)).abs() < EPSILON);
    }

    #[test]
    fn test_engine_waits_for_all_channels() {
        let mut engine = TrueWindEngine::new();

        assert!(engine.observe(TrueWindChannel::AngleApparent, 0.0, ts()).is_none());
        assert!(engine.observe(TrueWindChannel::SpeedApparent, 10.0, ts()).is_none());
        assert!(engine.observe(TrueWindChannel::SpeedOverGround, 5.0, ts()).is_none());
        assert!(!engine.is_primed());

        let point = engine
            .observe(TrueWindChannel::CourseOverGroundTrue, 0.0, ts())
            .unwrap();
        assert!(engine.is_primed());
        assert_eq!(point.timestamp, ts());
        assert_eq!(point.fields.len(), 2);
        assert!((float(&point, SPEED_FIELD) - 5.0).abs() < EPSILON);
        assert!(float(&point, DIRECTION_FIELD).abs() < EPSILON);
    }

    #[test]
    fn test_engine_skips_duplicate_inputs() {
        let mut engine = TrueWindEngine::new();
        engine.observe(TrueWindChannel::AngleApparent, 0.5, ts());
        engine.observe(TrueWindChannel::SpeedApparent, 10.0, ts());
        engine.observe(TrueWindChannel::SpeedOverGround, 5.0, ts());
        assert!(engine
            .observe(TrueWindChannel::CourseOverGroundTrue, 0.0, ts())
            .is_some());

        // Same value again: nothing changed.
        assert!(engine.observe(TrueWindChannel::SpeedApparent, 10.0, ts()).is_none());

        // A change emits, returning to an earlier tuple emits again.
        assert!(engine.observe(TrueWindChannel::SpeedApparent, 11.0, ts()).is_some());
        assert!(engine.observe(TrueWindChannel::SpeedApparent, 10.0, ts()).is_some());
        assert_eq!(engine.value(TrueWindChannel::SpeedApparent), Some(10.0));
    }
}
