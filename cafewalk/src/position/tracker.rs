//! Position tracker: a normalized stream over the platform sensor.
//!
//! The tracker wraps a [`PositionSensor`] subscription and presents a
//! single ongoing update stream with defensive defaults:
//!
//! - heading is taken from the sensor when present, otherwise derived
//!   from the bearing between consecutive fixes (skipped on the very
//!   first fix, when there is nothing to derive from);
//! - timeouts are absorbed — they are routine indoors and must not show
//!   up as user-facing errors mid-session;
//! - other failures are surfaced together with a fallback point, so
//!   downstream state is never undefined.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use crate::geo::{bearing_degrees, distance_meters, GeoPoint};

use super::types::{
    PositionErrorKind, PositionFix, SensorReading, TrackerUpdate, WatchOptions, DEFAULT_POSITION,
};

/// Movement below this distance does not produce a derived heading; GPS
/// jitter while standing still would make the arrow spin.
const MIN_HEADING_TRAVEL_M: f64 = 1.0;

/// Platform adapter delivering continuous location updates.
///
/// Implementations push readings into `tx` at their own cadence until
/// `cancel` fires, then stop. Dropping `tx` ends the watch from the
/// sensor side.
pub trait PositionSensor: Send + Sync + 'static {
    /// Begin continuous updates.
    fn watch(
        &self,
        options: WatchOptions,
        tx: mpsc::UnboundedSender<SensorReading>,
        cancel: CancellationToken,
    );
}

/// Handle to a running tracker subscription.
///
/// `stop()` is idempotent: stopping an already-stopped handle is a no-op,
/// never an error. Dropping the handle stops tracking too.
#[derive(Debug, Clone)]
pub struct TrackerHandle {
    cancel: CancellationToken,
}

impl TrackerHandle {
    /// Stop the subscription. Safe to call any number of times.
    pub fn stop(&self) {
        if !self.cancel.is_cancelled() {
            debug!("position tracking stopped");
        }
        self.cancel.cancel();
    }

    /// Whether the subscription is still live.
    pub fn is_tracking(&self) -> bool {
        !self.cancel.is_cancelled()
    }
}

impl Drop for TrackerHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Wraps a sensor subscription into a normalized update stream.
pub struct PositionTracker;

impl PositionTracker {
    /// Start continuous tracking on `sensor`.
    ///
    /// Spawns the normalization task and returns the control handle
    /// together with the update stream. The task ends when the handle is
    /// stopped or the sensor closes its side of the channel.
    pub fn start<S: PositionSensor>(
        sensor: Arc<S>,
        options: WatchOptions,
    ) -> (TrackerHandle, mpsc::UnboundedReceiver<TrackerUpdate>) {
        let cancel = CancellationToken::new();
        let (raw_tx, raw_rx) = mpsc::unbounded_channel();
        let (update_tx, update_rx) = mpsc::unbounded_channel();

        sensor.watch(options, raw_tx, cancel.clone());

        let task_cancel = cancel.clone();
        tokio::spawn(async move {
            run_normalizer(raw_rx, update_tx, task_cancel).await;
        });

        (TrackerHandle { cancel }, update_rx)
    }
}

/// Consume raw readings until cancelled, emitting normalized updates.
async fn run_normalizer(
    mut raw_rx: mpsc::UnboundedReceiver<SensorReading>,
    update_tx: mpsc::UnboundedSender<TrackerUpdate>,
    cancel: CancellationToken,
) {
    debug!("position tracker started, waiting for sensor readings");

    let mut last_fix: Option<GeoPoint> = None;

    loop {
        let reading = tokio::select! {
            _ = cancel.cancelled() => break,
            maybe = raw_rx.recv() => match maybe {
                Some(reading) => reading,
                None => break,
            },
        };

        match reading {
            SensorReading::Fix {
                latitude,
                longitude,
                heading,
            } => {
                let point = GeoPoint::new(latitude, longitude);
                let heading_degrees = heading.or_else(|| derive_heading(last_fix, point));
                last_fix = Some(point);

                trace!(%point, ?heading_degrees, "sensor fix");

                let fix = PositionFix {
                    point,
                    heading_degrees,
                    timestamp: Instant::now(),
                };
                if update_tx.send(TrackerUpdate::Fix(fix)).is_err() {
                    break;
                }
            }
            SensorReading::Failure { kind, message } => {
                if kind == PositionErrorKind::Timeout {
                    // Routine under weak signal; swallow it
                    debug!("sensor timeout absorbed");
                    continue;
                }

                warn!(%kind, message, "position sensor failure");

                let update = TrackerUpdate::SensorError {
                    kind,
                    message,
                    fallback: last_fix.unwrap_or(DEFAULT_POSITION),
                };
                if update_tx.send(update).is_err() {
                    break;
                }
            }
        }
    }

    debug!("position tracker stopped");
}

/// Bearing from the previous fix, when there is one and we actually moved.
fn derive_heading(previous: Option<GeoPoint>, current: GeoPoint) -> Option<f64> {
    let previous = previous?;
    if distance_meters(previous, current) < MIN_HEADING_TRAVEL_M {
        return None;
    }
    Some(bearing_degrees(previous, current))
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Sensor that replays a fixed script of readings, then closes.
    struct ReplaySensor {
        script: Vec<SensorReading>,
    }

    impl PositionSensor for ReplaySensor {
        fn watch(
            &self,
            _options: WatchOptions,
            tx: mpsc::UnboundedSender<SensorReading>,
            _cancel: CancellationToken,
        ) {
            for reading in self.script.clone() {
                let _ = tx.send(reading);
            }
        }
    }

    fn fix(latitude: f64, longitude: f64, heading: Option<f64>) -> SensorReading {
        SensorReading::Fix {
            latitude,
            longitude,
            heading,
        }
    }

    async fn collect(script: Vec<SensorReading>) -> Vec<TrackerUpdate> {
        let sensor = Arc::new(ReplaySensor { script });
        let (_handle, mut updates) = PositionTracker::start(sensor, WatchOptions::default());

        let mut collected = Vec::new();
        while let Some(update) = updates.recv().await {
            collected.push(update);
        }
        collected
    }

    #[tokio::test]
    async fn test_sensor_heading_is_preferred() {
        let updates = collect(vec![fix(37.5665, 126.9780, Some(42.0))]).await;

        assert_eq!(updates.len(), 1);
        match &updates[0] {
            TrackerUpdate::Fix(f) => assert_eq!(f.heading_degrees, Some(42.0)),
            other => panic!("unexpected update: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_first_fix_has_no_derived_heading() {
        let updates = collect(vec![fix(37.5665, 126.9780, None)]).await;

        match &updates[0] {
            TrackerUpdate::Fix(f) => assert_eq!(f.heading_degrees, None),
            other => panic!("unexpected update: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_heading_derived_from_movement() {
        // Due north: second fix should derive a ~0 degree heading
        let updates = collect(vec![
            fix(37.5665, 126.9780, None),
            fix(37.5675, 126.9780, None),
        ])
        .await;

        match &updates[1] {
            TrackerUpdate::Fix(f) => {
                let heading = f.heading_degrees.expect("heading should be derived");
                assert!(heading < 1.0 || heading > 359.0, "got {}", heading);
            }
            other => panic!("unexpected update: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_stationary_jitter_keeps_heading_unset() {
        // Second fix ~0.1 m away: below the movement floor
        let updates = collect(vec![
            fix(37.5665000, 126.9780, None),
            fix(37.5665001, 126.9780, None),
        ])
        .await;

        match &updates[1] {
            TrackerUpdate::Fix(f) => assert_eq!(f.heading_degrees, None),
            other => panic!("unexpected update: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_timeout_is_absorbed() {
        let updates = collect(vec![
            fix(37.5665, 126.9780, None),
            SensorReading::Failure {
                kind: PositionErrorKind::Timeout,
                message: "no fix within 15s".to_string(),
            },
            fix(37.5666, 126.9780, None),
        ])
        .await;

        assert_eq!(updates.len(), 2);
        assert!(updates
            .iter()
            .all(|u| matches!(u, TrackerUpdate::Fix(_))));
    }

    #[tokio::test]
    async fn test_failure_falls_back_to_last_good_fix() {
        let updates = collect(vec![
            fix(37.5700, 126.9800, None),
            SensorReading::Failure {
                kind: PositionErrorKind::Unavailable,
                message: "no provider".to_string(),
            },
        ])
        .await;

        match &updates[1] {
            TrackerUpdate::SensorError { kind, fallback, .. } => {
                assert_eq!(*kind, PositionErrorKind::Unavailable);
                assert_eq!(*fallback, GeoPoint::new(37.5700, 126.9800));
            }
            other => panic!("unexpected update: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_failure_before_any_fix_uses_default() {
        let updates = collect(vec![SensorReading::Failure {
            kind: PositionErrorKind::PermissionDenied,
            message: "denied".to_string(),
        }])
        .await;

        match &updates[0] {
            TrackerUpdate::SensorError { kind, fallback, .. } => {
                assert_eq!(*kind, PositionErrorKind::PermissionDenied);
                assert_eq!(*fallback, DEFAULT_POSITION);
            }
            other => panic!("unexpected update: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_stop_is_idempotent() {
        let sensor = Arc::new(ReplaySensor { script: vec![] });
        let (handle, _updates) = PositionTracker::start(sensor, WatchOptions::default());

        assert!(handle.is_tracking());
        handle.stop();
        assert!(!handle.is_tracking());

        // Stopping again is a no-op, never an error
        handle.stop();
        handle.stop();
        assert!(!handle.is_tracking());
    }

    #[tokio::test]
    async fn test_stop_ends_the_stream() {
        let sensor = Arc::new(ReplaySensor { script: vec![] });
        let (handle, mut updates) = PositionTracker::start(sensor, WatchOptions::default());

        handle.stop();
        assert!(updates.recv().await.is_none());
    }
}
