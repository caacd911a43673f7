//! Position tracking
//!
//! Wraps the platform's continuous location sensor in a normalized update
//! stream: heading derivation, timeout absorption, last-known-good
//! fallbacks and idempotent teardown.

mod scripted;
mod tracker;
mod types;

pub use scripted::ScriptedSensor;
pub use tracker::{PositionSensor, PositionTracker, TrackerHandle};
pub use types::{
    Accuracy, PositionErrorKind, PositionFix, SensorReading, TrackerUpdate, WatchOptions,
    DEFAULT_POSITION,
};
