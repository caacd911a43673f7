//! A scripted position sensor for simulation and tests.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use super::tracker::PositionSensor;
use super::types::{SensorReading, WatchOptions};

/// Replays a pre-recorded walk at a fixed cadence.
///
/// Used by the CLI simulator and integration tests in place of a real
/// platform sensor. With a zero interval the whole script is delivered
/// immediately.
#[derive(Debug, Clone)]
pub struct ScriptedSensor {
    readings: Vec<SensorReading>,
    interval: Duration,
}

impl ScriptedSensor {
    /// Create a sensor that replays `readings` spaced by `interval`.
    pub fn new(readings: Vec<SensorReading>, interval: Duration) -> Self {
        Self { readings, interval }
    }

    /// Create a sensor that delivers the whole script immediately.
    pub fn immediate(readings: Vec<SensorReading>) -> Self {
        Self::new(readings, Duration::ZERO)
    }
}

impl PositionSensor for ScriptedSensor {
    fn watch(
        &self,
        _options: WatchOptions,
        tx: mpsc::UnboundedSender<SensorReading>,
        cancel: CancellationToken,
    ) {
        let readings = self.readings.clone();
        let interval = self.interval;

        tokio::spawn(async move {
            for reading in readings {
                if !interval.is_zero() {
                    tokio::select! {
                        _ = cancel.cancelled() => return,
                        _ = tokio::time::sleep(interval) => {}
                    }
                }
                if cancel.is_cancelled() || tx.send(reading).is_err() {
                    return;
                }
            }
            // Channel drops here; the tracker sees end-of-stream
        });
    }
}
