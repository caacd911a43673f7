//! Core types for device position tracking.

use std::fmt;
use std::time::Duration;

use tokio::time::Instant;

use crate::geo::GeoPoint;

/// Fallback coordinate used before any fix was ever obtained.
///
/// Seoul Station — the original app's home market default when location
/// permission is missing or the sensor is unavailable at first run.
pub const DEFAULT_POSITION: GeoPoint = GeoPoint::new(37.5665, 126.9780);

/// Requested sensor accuracy.
///
/// Continuous high-accuracy polling drains battery faster than the added
/// precision is worth at pedestrian-scale (>= 10 m) arrival thresholds,
/// so `Low` is the default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Accuracy {
    High,
    #[default]
    Low,
}

/// Options for a continuous position watch.
#[derive(Debug, Clone, Copy)]
pub struct WatchOptions {
    /// Requested sensor accuracy.
    pub accuracy: Accuracy,

    /// How long the sensor may take before reporting a timeout.
    pub timeout: Duration,

    /// Maximum age of a cached fix the sensor may serve.
    pub max_cache_age: Duration,
}

impl Default for WatchOptions {
    fn default() -> Self {
        Self {
            accuracy: Accuracy::Low,
            timeout: Duration::from_secs(15),
            max_cache_age: Duration::from_secs(60),
        }
    }
}

/// Classification of sensor failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PositionErrorKind {
    /// The user denied location access.
    PermissionDenied,
    /// The platform cannot determine a position.
    Unavailable,
    /// No fix within the configured timeout. Expected indoors or under
    /// weak signal; never surfaced while a session is active.
    Timeout,
    /// Anything the platform did not classify.
    Unknown,
}

impl fmt::Display for PositionErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PermissionDenied => write!(f, "permission denied"),
            Self::Unavailable => write!(f, "unavailable"),
            Self::Timeout => write!(f, "timeout"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

/// A raw reading pushed by the platform location sensor.
#[derive(Debug, Clone)]
pub enum SensorReading {
    /// A successful fix.
    Fix {
        latitude: f64,
        longitude: f64,
        /// Device heading in degrees, when the sensor provides one.
        heading: Option<f64>,
    },
    /// A sensor failure.
    Failure {
        kind: PositionErrorKind,
        message: String,
    },
}

/// A normalized position fix as emitted by the tracker.
#[derive(Debug, Clone, Copy)]
pub struct PositionFix {
    /// Where the device is.
    pub point: GeoPoint,

    /// Heading in degrees `[0, 360)`. Sensor-supplied when available,
    /// otherwise derived from the previous fix; `None` only until a
    /// second fix makes derivation possible.
    pub heading_degrees: Option<f64>,

    /// When the tracker processed this fix.
    pub timestamp: Instant,
}

/// An update delivered to tracker consumers.
#[derive(Debug, Clone)]
pub enum TrackerUpdate {
    /// A normalized fix.
    Fix(PositionFix),

    /// A surfaced sensor failure, with a recoverable retry affordance.
    /// `fallback` is the last-known-good point, or [`DEFAULT_POSITION`]
    /// when no fix was ever obtained. Timeouts are absorbed and never
    /// delivered as this variant.
    SensorError {
        kind: PositionErrorKind,
        message: String,
        fallback: GeoPoint,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_watch_options_defaults_favor_battery() {
        let options = WatchOptions::default();
        assert_eq!(options.accuracy, Accuracy::Low);
        assert_eq!(options.timeout, Duration::from_secs(15));
        assert_eq!(options.max_cache_age, Duration::from_secs(60));
    }

    #[test]
    fn test_error_kind_display() {
        assert_eq!(
            PositionErrorKind::PermissionDenied.to_string(),
            "permission denied"
        );
        assert_eq!(PositionErrorKind::Timeout.to_string(), "timeout");
    }
}
