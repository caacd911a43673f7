//! Simulated guidance session: replay a walk against the full stack.
//!
//! Builds a demo route near Seoul Station, scripts a walk along its
//! geometry (optionally drifting off it halfway), and runs the real
//! supervisor/tracker/session machinery on top, printing every snapshot
//! and event until the session ends itself.

use std::sync::Arc;
use std::time::Duration;

use clap::Args;
use tracing::info;

use cafewalk::directions::{DirectionsError, DirectionsProvider};
use cafewalk::geo::{distance_meters, GeoPoint};
use cafewalk::position::{ScriptedSensor, SensorReading};
use cafewalk::route::{GuidanceStep, ManeuverKind, Route, RouteSection};
use cafewalk::session::{NavigationState, NavigationSupervisor, SessionConfig, SessionEvent};

use crate::error::CliError;

/// Arguments for the `simulate` subcommand.
#[derive(Debug, Args)]
pub struct SimulateArgs {
    /// Playback walking speed in m/s (faster than real walking so the
    /// session finishes quickly; arrival still respects the debounce)
    #[arg(long, default_value = "8.0")]
    pub speed: f64,

    /// Interval between simulated sensor fixes in milliseconds
    #[arg(long, default_value = "250")]
    pub tick_ms: u64,

    /// Drift ~60 m off the route halfway through to exercise the
    /// deviation and reroute machinery
    #[arg(long)]
    pub deviate: bool,
}

/// Provider serving the demo route initially and straight-line
/// replacements on reroute.
struct DemoProvider {
    route: Route,
}

impl DirectionsProvider for DemoProvider {
    async fn fetch_route(
        &self,
        origin: GeoPoint,
        destination: GeoPoint,
    ) -> Result<Route, DirectionsError> {
        let start = self
            .route
            .full_polyline()
            .first()
            .copied()
            .unwrap_or(destination);

        if distance_meters(origin, start) < 50.0 {
            return Ok(self.route.clone());
        }

        // Rerouted mid-walk: hand back a direct line to the destination
        let distance = distance_meters(origin, destination);
        let section = RouteSection {
            distance_meters: distance,
            guides: vec![GuidanceStep {
                sequence_index: 0,
                section_index: 0,
                anchor: destination,
                distance_meters: distance,
                kind: ManeuverKind::Arrive,
                raw_text: None,
            }],
            polyline: vec![origin, destination],
        };
        Route::from_sections(distance, vec![section]).map_err(DirectionsError::from)
    }
}

/// An L-shaped walk from Seoul Station toward a cafe to the northeast.
fn demo_route() -> Route {
    let start = GeoPoint::new(37.5665, 126.9780);
    let corner = GeoPoint::new(37.5695, 126.9780); // ~330 m north
    let cafe = GeoPoint::new(37.5695, 126.9806); // ~230 m east of the corner

    let leg1 = distance_meters(start, corner);
    let leg2 = distance_meters(corner, cafe);

    let sections = vec![
        RouteSection {
            distance_meters: leg1,
            guides: vec![GuidanceStep {
                sequence_index: 0,
                section_index: 0,
                anchor: corner,
                distance_meters: leg1,
                kind: ManeuverKind::TurnRight,
                raw_text: Some("turn right at the crosswalk".to_string()),
            }],
            polyline: sample_line(start, corner, 20.0),
        },
        RouteSection {
            distance_meters: leg2,
            guides: vec![GuidanceStep {
                sequence_index: 0,
                section_index: 1,
                anchor: cafe,
                distance_meters: leg2,
                kind: ManeuverKind::Arrive,
                raw_text: None,
            }],
            polyline: sample_line(corner, cafe, 20.0),
        },
    ];

    Route::from_sections(leg1 + leg2, sections).expect("demo route is well-formed")
}

/// Points every ~`spacing` meters from `a` to `b`, inclusive.
fn sample_line(a: GeoPoint, b: GeoPoint, spacing: f64) -> Vec<GeoPoint> {
    let length = distance_meters(a, b);
    let count = (length / spacing).ceil().max(1.0) as usize;
    (0..=count)
        .map(|k| {
            let t = k as f64 / count as f64;
            GeoPoint::new(
                a.latitude + (b.latitude - a.latitude) * t,
                a.longitude + (b.longitude - a.longitude) * t,
            )
        })
        .collect()
}

/// Script sensor fixes along the route at `speed` meters per tick-second.
fn script_walk(route: &Route, args: &SimulateArgs) -> Vec<SensorReading> {
    let polyline = route.full_polyline();
    let step_m = args.speed * args.tick_ms as f64 / 1000.0;

    let mut points = Vec::new();
    let mut carry = 0.0;
    for pair in polyline.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        let length = distance_meters(a, b);
        let mut along = carry;
        while along < length {
            let t = along / length;
            points.push(GeoPoint::new(
                a.latitude + (b.latitude - a.latitude) * t,
                a.longitude + (b.longitude - a.longitude) * t,
            ));
            along += step_m;
        }
        carry = along - length;
    }
    if let Some(&last) = polyline.last() {
        // Linger on the destination so arrival can clear the debounce
        for _ in 0..3 {
            points.push(last);
        }
    }

    if args.deviate {
        // Push the middle third of the walk ~60 m east
        let lon_offset = 60.0 / (111_320.0 * points[0].latitude.to_radians().cos());
        let third = points.len() / 3;
        for point in points.iter_mut().skip(third).take(third / 2) {
            point.longitude += lon_offset;
        }
    }

    points
        .into_iter()
        .map(|p| SensorReading::Fix {
            latitude: p.latitude,
            longitude: p.longitude,
            heading: None,
        })
        .collect()
}

/// Run the simulated session until it ends.
pub async fn run(args: SimulateArgs) -> Result<(), CliError> {
    let route = demo_route();
    let target = route
        .full_polyline()
        .last()
        .copied()
        .expect("demo route has geometry");

    info!(
        distance_m = route.total_distance_meters,
        eta_min = route.duration_minutes(),
        deviate = args.deviate,
        "starting simulated walk"
    );

    println!("route ({}m, ~{} min):", route.total_distance_meters.round(), route.duration_minutes());
    for entry in cafewalk::instruction::route_overview(&route) {
        let marker = if entry.is_final { "*" } else { " " };
        println!(
            " {} {}. {} ({}m)",
            marker,
            entry.step_number,
            entry.phrase,
            entry.distance_meters.round()
        );
    }

    let readings = script_walk(&route, &args);
    let sensor = Arc::new(ScriptedSensor::new(
        readings,
        Duration::from_millis(args.tick_ms),
    ));
    let provider = Arc::new(DemoProvider { route });

    let supervisor = NavigationSupervisor::new(provider, sensor, SessionConfig::default());
    let mut snapshots = supervisor.subscribe_snapshots();
    let mut events = supervisor.subscribe_events();

    supervisor.start_navigation_to(target).await?;

    loop {
        tokio::select! {
            changed = snapshots.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = snapshots.borrow_and_update().clone();
                println!(
                    "[{}] {:>4.0}m left ({:>3.0}%) | {} | next: {}",
                    snapshot.state,
                    snapshot.remaining_distance_meters,
                    snapshot.progress_percent,
                    snapshot.current_instruction,
                    snapshot.next_instruction,
                );
                if snapshot.state == NavigationState::Idle {
                    break;
                }
            }
            event = events.recv() => match event {
                Ok(SessionEvent::RouteAvailable { polyline }) => {
                    println!(">>> route overlay: {} vertices", polyline.len());
                }
                Ok(SessionEvent::RouteCleared) => println!(">>> route overlay cleared"),
                Ok(SessionEvent::Deviated) => println!(">>> off route, recalculating"),
                Ok(SessionEvent::Rerouted) => println!(">>> new route installed"),
                Ok(SessionEvent::Arrived) => println!(">>> destination reached"),
                Ok(SessionEvent::Error(error)) => println!(">>> warning: {}", error),
                Err(_) => break,
            },
        }
    }

    println!("session ended");
    Ok(())
}
