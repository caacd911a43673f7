//! Navigation session configuration.

use std::time::Duration;

/// Tunable thresholds and windows for a guidance session.
///
/// The defaults were tuned on real pedestrian GPS traces in the field;
/// treat them as configuration, not physical constants.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Distance to the destination that counts as arrived.
    pub arrival_threshold_meters: f64,

    /// Minimum session age before arrival may be signaled. The first
    /// fixes after starting are frequently inaccurate and can report
    /// false proximity to the destination.
    pub arrival_debounce: Duration,

    /// Radius around a step anchor that advances the current step.
    pub step_advance_radius_meters: f64,

    /// Distance off the route geometry that counts as a deviation.
    pub deviation_threshold_meters: f64,

    /// Minimum wall-clock interval between deviation evaluations. Keeps
    /// reroute traffic bounded under high-frequency position updates.
    pub deviation_check_interval: Duration,

    /// How long an arrived session lingers before ending itself.
    pub auto_end_delay: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            arrival_threshold_meters: 10.0,
            arrival_debounce: Duration::from_secs(10),
            step_advance_radius_meters: 50.0,
            deviation_threshold_meters: 10.0,
            deviation_check_interval: Duration::from_secs(5),
            auto_end_delay: Duration::from_secs(5),
        }
    }
}

impl SessionConfig {
    /// Set the arrival threshold in meters.
    pub fn with_arrival_threshold(mut self, meters: f64) -> Self {
        self.arrival_threshold_meters = meters;
        self
    }

    /// Set the arrival debounce window.
    pub fn with_arrival_debounce(mut self, debounce: Duration) -> Self {
        self.arrival_debounce = debounce;
        self
    }

    /// Set the deviation check interval.
    pub fn with_deviation_check_interval(mut self, interval: Duration) -> Self {
        self.deviation_check_interval = interval;
        self
    }

    /// Set the post-arrival auto-end delay.
    pub fn with_auto_end_delay(mut self, delay: Duration) -> Self {
        self.auto_end_delay = delay;
        self
    }
}
