//! Integration tests for the navigation session stack.
//!
//! These tests verify the complete guidance flows across the public API:
//! - Sensor → Position Tracker → Session → snapshots/events
//! - Arrival debounce, auto-end and teardown
//! - Deviation → reroute fetch → replacement route installation
//! - Reroute failure and sensor error surfacing
//!
//! Run with: `cargo test --test navigation_session_integration`

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use cafewalk::directions::{DirectionsError, DirectionsProvider};
use cafewalk::geo::GeoPoint;
use cafewalk::position::{PositionErrorKind, PositionSensor, SensorReading, WatchOptions};
use cafewalk::route::{GuidanceStep, ManeuverKind, Route, RouteSection};
use cafewalk::session::{
    NavigationState, NavigationSupervisor, SessionConfig, SessionEvent,
};

// ============================================================================
// Test Helpers
// ============================================================================

const BASE_LAT: f64 = 37.5665;
const BASE_LON: f64 = 126.9780;
/// Degrees of latitude per meter.
const LAT_PER_M: f64 = 1.0 / 111_320.0;

/// A point `meters` north of the base, optionally `east_m` east.
fn point_at(meters: f64, east_m: f64) -> GeoPoint {
    let lon_per_m = 1.0 / (111_320.0 * BASE_LAT.to_radians().cos());
    GeoPoint::new(BASE_LAT + meters * LAT_PER_M, BASE_LON + east_m * lon_per_m)
}

/// A straight northbound route with one step per section and vertices
/// every ~20 m.
fn straight_route(section_lengths: &[f64]) -> Route {
    let total: f64 = section_lengths.iter().sum();
    let mut sections = Vec::new();
    let mut offset = 0.0;

    for (index, &length) in section_lengths.iter().enumerate() {
        let vertex_count = (length / 20.0).round().max(1.0) as usize;
        let polyline: Vec<GeoPoint> = (0..=vertex_count)
            .map(|k| point_at(offset + length * k as f64 / vertex_count as f64, 0.0))
            .collect();

        let is_last = index + 1 == section_lengths.len();
        sections.push(RouteSection {
            distance_meters: length,
            guides: vec![GuidanceStep {
                sequence_index: 0,
                section_index: index,
                anchor: point_at(offset + length, 0.0),
                distance_meters: length,
                kind: if is_last {
                    ManeuverKind::Arrive
                } else {
                    ManeuverKind::Straight
                },
                raw_text: None,
            }],
            polyline,
        });
        offset += length;
    }

    Route::from_sections(total, sections).unwrap()
}

fn fix(meters: f64, east_m: f64) -> SensorReading {
    let point = point_at(meters, east_m);
    SensorReading::Fix {
        latitude: point.latitude,
        longitude: point.longitude,
        heading: None,
    }
}

/// A sensor the test feeds by hand through a channel.
struct ManualSensor {
    feed: Mutex<Option<mpsc::UnboundedReceiver<SensorReading>>>,
}

impl ManualSensor {
    fn new() -> (Arc<Self>, mpsc::UnboundedSender<SensorReading>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Arc::new(Self {
                feed: Mutex::new(Some(rx)),
            }),
            tx,
        )
    }
}

impl PositionSensor for ManualSensor {
    fn watch(
        &self,
        _options: WatchOptions,
        tx: mpsc::UnboundedSender<SensorReading>,
        cancel: CancellationToken,
    ) {
        let mut feed = self
            .feed
            .lock()
            .unwrap()
            .take()
            .expect("manual sensor supports a single watch");

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    maybe = feed.recv() => match maybe {
                        Some(reading) => {
                            if tx.send(reading).is_err() {
                                break;
                            }
                        }
                        None => break,
                    },
                }
            }
        });
    }
}

/// Provider that hands out routes from a queue and counts fetches.
struct QueueProvider {
    routes: Mutex<Vec<Result<Route, DirectionsError>>>,
    calls: AtomicUsize,
}

impl QueueProvider {
    fn new(routes: Vec<Result<Route, DirectionsError>>) -> Arc<Self> {
        Arc::new(Self {
            routes: Mutex::new(routes),
            calls: AtomicUsize::new(0),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl DirectionsProvider for QueueProvider {
    async fn fetch_route(
        &self,
        _origin: GeoPoint,
        _destination: GeoPoint,
    ) -> Result<Route, DirectionsError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut routes = self.routes.lock().unwrap();
        if routes.len() > 1 {
            routes.remove(0)
        } else {
            routes[0].clone()
        }
    }
}

type Supervisor = NavigationSupervisor<QueueProvider, ManualSensor>;

fn make_supervisor(
    provider: Arc<QueueProvider>,
    sensor: Arc<ManualSensor>,
) -> Arc<Supervisor> {
    Arc::new(NavigationSupervisor::new(
        provider,
        sensor,
        SessionConfig::default(),
    ))
}

// ============================================================================
// Arrival Flow
// ============================================================================

/// A fix on the destination at t=0 must not arrive (debounce); the same
/// fix after the debounce window must; the auto-end timer then returns
/// the session to idle without an explicit stop.
#[tokio::test(start_paused = true)]
async fn test_arrival_debounce_and_auto_end() {
    let provider = QueueProvider::new(vec![Ok(straight_route(&[400.0]))]);
    let (sensor, feed) = ManualSensor::new();
    let supervisor = make_supervisor(Arc::clone(&provider), sensor);

    let mut snapshots = supervisor.subscribe_snapshots();
    let mut events = supervisor.subscribe_events();

    let target = point_at(400.0, 0.0);
    supervisor.start_navigation_to(target).await.unwrap();
    snapshots.borrow_and_update();

    // First fix lands exactly on the target: held by the debounce
    feed.send(fix(400.0, 0.0)).unwrap();
    snapshots.changed().await.unwrap();
    assert_eq!(snapshots.borrow_and_update().state, NavigationState::Active);

    // Past the debounce window the same fix arrives
    tokio::time::advance(Duration::from_secs(11)).await;
    feed.send(fix(400.0, 0.0)).unwrap();
    snapshots.changed().await.unwrap();
    {
        let snapshot = snapshots.borrow_and_update();
        assert_eq!(snapshot.state, NavigationState::Arrived);
        assert_eq!(snapshot.remaining_distance_meters, 0.0);
        assert_eq!(snapshot.progress_percent, 100.0);
    }

    // The 5 s auto-end timer fires and the session ends itself
    snapshots.changed().await.unwrap();
    assert_eq!(snapshots.borrow_and_update().state, NavigationState::Idle);
    assert!(!supervisor.is_navigating().await);

    // Event order: route drawn, arrival, overlay cleared
    assert!(matches!(
        events.recv().await.unwrap(),
        SessionEvent::RouteAvailable { .. }
    ));
    assert!(matches!(events.recv().await.unwrap(), SessionEvent::Arrived));
    assert!(matches!(
        events.recv().await.unwrap(),
        SessionEvent::RouteCleared
    ));
}

/// A stop issued while arrived cancels the pending auto-end timer.
#[tokio::test(start_paused = true)]
async fn test_stop_before_auto_end_timer() {
    let provider = QueueProvider::new(vec![Ok(straight_route(&[400.0]))]);
    let (sensor, feed) = ManualSensor::new();
    let supervisor = make_supervisor(provider, sensor);
    let mut snapshots = supervisor.subscribe_snapshots();

    supervisor.start_navigation_to(point_at(400.0, 0.0)).await.unwrap();
    snapshots.borrow_and_update();

    tokio::time::advance(Duration::from_secs(11)).await;
    feed.send(fix(400.0, 0.0)).unwrap();
    snapshots.changed().await.unwrap();
    assert_eq!(snapshots.borrow_and_update().state, NavigationState::Arrived);

    // Stop immediately; the session must go idle and stay idle
    supervisor.stop_navigation().await;
    assert_eq!(supervisor.snapshot().state, NavigationState::Idle);

    tokio::time::advance(Duration::from_secs(10)).await;
    assert_eq!(supervisor.snapshot().state, NavigationState::Idle);
    assert!(!supervisor.is_navigating().await);
}

// ============================================================================
// Deviation Flow
// ============================================================================

/// Drifting 60 m off the corridor deviates the session, requests exactly
/// one reroute, and installs the replacement with a reset step index.
#[tokio::test(start_paused = true)]
async fn test_deviation_fetches_and_installs_replacement() {
    let provider = QueueProvider::new(vec![Ok(straight_route(&[400.0, 300.0, 300.0]))]);
    let (sensor, feed) = ManualSensor::new();
    let supervisor = make_supervisor(Arc::clone(&provider), sensor);

    let mut snapshots = supervisor.subscribe_snapshots();
    let mut events = supervisor.subscribe_events();

    supervisor
        .start_navigation_to(point_at(1000.0, 0.0))
        .await
        .unwrap();
    assert_eq!(provider.calls(), 1);
    assert!(matches!(
        events.recv().await.unwrap(),
        SessionEvent::RouteAvailable { .. }
    ));

    feed.send(fix(100.0, 0.0)).unwrap();
    snapshots.changed().await.unwrap();

    // Past the deviation check interval, 60 m perpendicular drift
    tokio::time::advance(Duration::from_secs(6)).await;
    feed.send(fix(500.0, 60.0)).unwrap();

    assert!(matches!(events.recv().await.unwrap(), SessionEvent::Deviated));
    assert!(matches!(events.recv().await.unwrap(), SessionEvent::Rerouted));
    assert!(matches!(
        events.recv().await.unwrap(),
        SessionEvent::RouteAvailable { .. }
    ));

    // Initial fetch plus exactly one reroute
    assert_eq!(provider.calls(), 2);

    snapshots.changed().await.unwrap();
    let snapshot = snapshots.borrow_and_update().clone();
    assert_eq!(snapshot.state, NavigationState::Active);
}

/// When the reroute fetch fails the session stays deviated on the stale
/// route and surfaces a non-blocking warning instead of collapsing.
#[tokio::test(start_paused = true)]
async fn test_reroute_failure_keeps_stale_route() {
    let provider = QueueProvider::new(vec![
        Ok(straight_route(&[400.0, 300.0, 300.0])),
        Err(DirectionsError::HttpError("gateway timeout".to_string())),
    ]);
    let (sensor, feed) = ManualSensor::new();
    let supervisor = make_supervisor(Arc::clone(&provider), sensor);

    let mut events = supervisor.subscribe_events();
    let mut snapshots = supervisor.subscribe_snapshots();

    supervisor
        .start_navigation_to(point_at(1000.0, 0.0))
        .await
        .unwrap();
    assert!(matches!(
        events.recv().await.unwrap(),
        SessionEvent::RouteAvailable { .. }
    ));

    tokio::time::advance(Duration::from_secs(6)).await;
    feed.send(fix(500.0, 60.0)).unwrap();
    snapshots.changed().await.unwrap();

    assert!(matches!(events.recv().await.unwrap(), SessionEvent::Deviated));
    match events.recv().await.unwrap() {
        SessionEvent::Error(error) => {
            assert!(error.to_string().contains("keeping current route"));
        }
        other => panic!("expected a reroute warning, got {:?}", other),
    }

    // Still deviated, still navigating: the next check will retry
    assert_eq!(
        supervisor.snapshot().state,
        NavigationState::Deviated
    );
    assert!(supervisor.is_navigating().await);
}

// ============================================================================
// Sensor Error Policy
// ============================================================================

/// Timeouts are absorbed; permission errors surface as typed events.
#[tokio::test(start_paused = true)]
async fn test_sensor_error_surfacing_policy() {
    let provider = QueueProvider::new(vec![Ok(straight_route(&[400.0]))]);
    let (sensor, feed) = ManualSensor::new();
    let supervisor = make_supervisor(provider, sensor);

    let mut events = supervisor.subscribe_events();
    let mut snapshots = supervisor.subscribe_snapshots();

    supervisor.start_navigation_to(point_at(400.0, 0.0)).await.unwrap();
    assert!(matches!(
        events.recv().await.unwrap(),
        SessionEvent::RouteAvailable { .. }
    ));

    feed.send(SensorReading::Failure {
        kind: PositionErrorKind::Timeout,
        message: "no fix within 15s".to_string(),
    })
    .unwrap();
    feed.send(SensorReading::Failure {
        kind: PositionErrorKind::PermissionDenied,
        message: "location permission denied".to_string(),
    })
    .unwrap();
    feed.send(fix(50.0, 0.0)).unwrap();
    snapshots.changed().await.unwrap();

    // The only error event is the permission failure; the timeout
    // produced nothing
    match events.recv().await.unwrap() {
        SessionEvent::Error(error) => {
            assert!(error.to_string().contains("permission denied"));
        }
        other => panic!("expected a sensor error, got {:?}", other),
    }
    assert!(events.try_recv().is_err());

    // The session survived both failures
    assert_eq!(supervisor.snapshot().state, NavigationState::Active);
}

// ============================================================================
// Lifecycle / Cleanup
// ============================================================================

/// Dropping the supervisor (component unmount) releases the sensor
/// subscription without an explicit stop.
#[tokio::test(start_paused = true)]
async fn test_drop_releases_sensor_subscription() {
    let provider = QueueProvider::new(vec![Ok(straight_route(&[400.0]))]);
    let (sensor, feed) = ManualSensor::new();
    let supervisor = make_supervisor(provider, sensor);

    supervisor.start_navigation_to(point_at(400.0, 0.0)).await.unwrap();
    feed.send(fix(10.0, 0.0)).unwrap();

    drop(supervisor);

    // The forwarder notices cancellation and drops its end of the feed
    let mut closed = false;
    for _ in 0..100 {
        tokio::task::yield_now().await;
        if feed.send(fix(11.0, 0.0)).is_err() {
            closed = true;
            break;
        }
    }
    assert!(closed, "sensor subscription still alive after drop");
}

/// The full UI surface stays coherent across a short guided walk.
#[tokio::test(start_paused = true)]
async fn test_snapshot_progression_during_walk() {
    let provider = QueueProvider::new(vec![Ok(straight_route(&[400.0, 300.0, 300.0]))]);
    let (sensor, feed) = ManualSensor::new();
    let supervisor = make_supervisor(provider, sensor);
    let mut snapshots = supervisor.subscribe_snapshots();

    supervisor
        .start_navigation_to(point_at(1000.0, 0.0))
        .await
        .unwrap();

    // Initial snapshot: full route ahead
    {
        let snapshot = snapshots.borrow_and_update().clone();
        assert_eq!(snapshot.state, NavigationState::Active);
        assert!(snapshot.is_tracking);
        assert_eq!(snapshot.remaining_time_minutes, 15); // 1 km at 4 km/h
    }

    feed.send(fix(500.0, 0.0)).unwrap();
    snapshots.changed().await.unwrap();
    {
        let snapshot = snapshots.borrow_and_update().clone();
        assert!((snapshot.progress_percent - 50.0).abs() < 3.0);
        assert!((snapshot.remaining_distance_meters - 500.0).abs() < 30.0);
        // ~500 m left at 4 km/h
        assert!((7..=8).contains(&snapshot.remaining_time_minutes));
        assert!(!snapshot.current_instruction.is_empty());
        assert!(!snapshot.next_instruction.is_empty());
    }

    supervisor.stop_navigation().await;
    assert_eq!(supervisor.snapshot().state, NavigationState::Idle);
}
