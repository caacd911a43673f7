//! The navigation session state machine.
//!
//! [`NavigationSession`] consumes position fixes and produces step,
//! arrival and deviation state. It is deliberately pure: every transition
//! takes `now` as an argument, performs no I/O and never blocks. The
//! async work a transition implies (timers, reroute fetches) is returned
//! as [`SessionEffect`]s for the supervisor's event loop to perform.

use tokio::time::Instant;
use tracing::{debug, info};

use crate::geo::{distance_meters, GeoPoint};
use crate::instruction;
use crate::position::PositionFix;
use crate::route::{Route, WALKING_SPEED_MPS};

use super::config::SessionConfig;
use super::state::{NavigationSnapshot, NavigationState, SessionEffect};

/// A live guidance session along one route.
///
/// Mutated exclusively by position events and the explicit transition
/// calls below. Not internally synchronized: the supervisor owns one
/// instance per session and drives it from a single task.
#[derive(Debug)]
pub struct NavigationSession {
    state: NavigationState,
    route: Route,
    target: GeoPoint,
    config: SessionConfig,

    /// Index into the flattened step sequence. Monotonically
    /// non-decreasing for the lifetime of one route; a reroute resets it
    /// to 0, the only allowed decrease.
    current_step_index: usize,

    /// When the session started. Preserved across reroutes so deviation
    /// churn cannot defeat the arrival debounce.
    started_at: Instant,

    /// When the deviation check last ran.
    last_deviation_check_at: Instant,

    last_known_position: Option<GeoPoint>,
    last_known_heading_degrees: f64,

    /// Meters left along the route, maintained on every fix.
    remaining_meters: f64,

    /// A replacement route has been requested and not yet resolved.
    reroute_in_flight: bool,
}

impl NavigationSession {
    /// Begin a session guiding toward `target` along `route`.
    pub fn start(route: Route, target: GeoPoint, config: SessionConfig, now: Instant) -> Self {
        info!(
            %target,
            distance_m = route.total_distance_meters,
            steps = route.steps().len(),
            "navigation session started"
        );

        let remaining_meters = Self::route_length(&route);
        Self {
            state: NavigationState::Active,
            route,
            target,
            config,
            current_step_index: 0,
            started_at: now,
            last_deviation_check_at: now,
            last_known_position: None,
            last_known_heading_degrees: 0.0,
            remaining_meters,
            reroute_in_flight: false,
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> NavigationState {
        self.state
    }

    /// The route currently guiding the walker.
    pub fn route(&self) -> &Route {
        &self.route
    }

    /// The destination.
    pub fn target(&self) -> GeoPoint {
        self.target
    }

    /// Current step index into the flattened sequence.
    pub fn current_step_index(&self) -> usize {
        self.current_step_index
    }

    /// Last position received, if any.
    pub fn last_known_position(&self) -> Option<GeoPoint> {
        self.last_known_position
    }

    /// Last resolved heading in degrees.
    pub fn last_known_heading_degrees(&self) -> f64 {
        self.last_known_heading_degrees
    }

    /// Process one position fix.
    ///
    /// Transition order: bookkeeping, arrival check (debounced), step
    /// advancement (monotonic), then the rate-limited deviation
    /// evaluation. Valid while guiding (`Active`/`Deviated`); fixes
    /// arriving in any other state are ignored.
    pub fn handle_position(&mut self, fix: &PositionFix, now: Instant) -> Vec<SessionEffect> {
        let mut effects = Vec::new();

        if !matches!(
            self.state,
            NavigationState::Active | NavigationState::Deviated
        ) {
            return effects;
        }

        self.last_known_position = Some(fix.point);
        if let Some(heading) = fix.heading_degrees {
            self.last_known_heading_degrees = heading;
        }
        self.remaining_meters = self
            .route
            .remaining_meters_from(fix.point, self.current_step_index);

        if self.check_arrival(fix.point, now) {
            effects.push(SessionEffect::Arrived);
            return effects;
        }

        self.advance_step(fix.point);

        if let Some(effect) = self.check_deviation(fix.point, now) {
            effects.push(effect);
        }

        effects
    }

    /// Arrival check: within threshold of the target, and past the
    /// debounce window that filters unstable early fixes.
    fn check_arrival(&mut self, point: GeoPoint, now: Instant) -> bool {
        let to_target = distance_meters(point, self.target);
        if to_target > self.config.arrival_threshold_meters {
            return false;
        }
        if now.duration_since(self.started_at) <= self.config.arrival_debounce {
            debug!(
                to_target_m = to_target,
                "within arrival threshold but inside debounce window"
            );
            return false;
        }

        info!(to_target_m = to_target, "destination reached");
        self.state = NavigationState::Arrived;
        self.remaining_meters = 0.0;
        true
    }

    /// Advance the current step from the walker's position.
    ///
    /// Scans the not-yet-passed steps for the lowest one whose anchor is
    /// within the advance radius. Reaching the current step's own anchor
    /// completes that maneuver and moves to the next step; reaching a
    /// later anchor means the walker caught up to it. The index never
    /// decreases.
    fn advance_step(&mut self, point: GeoPoint) {
        let steps = self.route.steps();
        if steps.is_empty() {
            return;
        }

        let hit = steps[self.current_step_index..]
            .iter()
            .position(|step| {
                distance_meters(point, step.anchor) <= self.config.step_advance_radius_meters
            })
            .map(|offset| self.current_step_index + offset);

        if let Some(index) = hit {
            let next = if index == self.current_step_index {
                (index + 1).min(steps.len() - 1)
            } else {
                index
            };
            if next > self.current_step_index {
                debug!(
                    from = self.current_step_index,
                    to = next,
                    "guidance step advanced"
                );
                self.current_step_index = next;
            }
        }
    }

    /// Rate-limited deviation evaluation.
    ///
    /// At most once per configured interval: measure the minimum offset
    /// from the remaining route geometry. Off the route, transition to
    /// `Deviated` and request one reroute at a time; back on it (after a
    /// failed reroute), resolve to `Active` again.
    fn check_deviation(&mut self, point: GeoPoint, now: Instant) -> Option<SessionEffect> {
        if now.duration_since(self.last_deviation_check_at) < self.config.deviation_check_interval {
            return None;
        }
        self.last_deviation_check_at = now;

        let offset = self
            .route
            .min_offset_from_remaining(point, self.current_step_index)?;

        if offset <= self.config.deviation_threshold_meters {
            if self.state == NavigationState::Deviated && !self.reroute_in_flight {
                info!("walker rejoined the route, resuming guidance");
                self.state = NavigationState::Active;
            }
            return None;
        }

        if self.state == NavigationState::Active {
            info!(offset_m = offset, "route deviation detected");
            self.state = NavigationState::Deviated;
        }

        if self.reroute_in_flight {
            return None;
        }
        self.reroute_in_flight = true;
        Some(SessionEffect::RequestReroute { origin: point })
    }

    /// Install a replacement route after a deviation.
    ///
    /// Resolves `Deviated` back to `Active` and resets the step index to
    /// 0 — the documented discontinuity. The session clock is preserved.
    pub fn install_reroute(&mut self, route: Route, now: Instant) {
        info!(
            distance_m = route.total_distance_meters,
            steps = route.steps().len(),
            "replacement route installed"
        );

        self.remaining_meters = Self::route_length(&route);
        self.route = route;
        self.current_step_index = 0;
        self.state = NavigationState::Active;
        self.reroute_in_flight = false;
        self.last_deviation_check_at = now;
    }

    /// A reroute fetch failed. Keep guiding on the stale route; the next
    /// periodic deviation check will retry.
    pub fn reroute_failed(&mut self) {
        debug_assert!(self.state == NavigationState::Deviated || !self.reroute_in_flight);
        self.reroute_in_flight = false;
    }

    /// Produce the UI-facing snapshot.
    pub fn snapshot(&self, is_tracking: bool) -> NavigationSnapshot {
        let total = Self::route_length(&self.route).max(1.0);
        let remaining = self.remaining_meters.clamp(0.0, total);
        let progress_percent = (100.0 * (1.0 - remaining / total)).clamp(0.0, 100.0);
        let remaining_time_minutes = (remaining / WALKING_SPEED_MPS / 60.0).round() as u32;

        let (current_instruction, next_instruction) = match self.state {
            NavigationState::Arrived => (
                instruction::phrase(crate::route::ManeuverKind::Arrive).to_string(),
                String::new(),
            ),
            _ => {
                let residual = self.residual_to_current_anchor();
                instruction::format_pair(self.route.steps(), self.current_step_index, residual)
            }
        };

        NavigationSnapshot {
            state: self.state,
            current_instruction,
            next_instruction,
            remaining_distance_meters: remaining,
            remaining_time_minutes,
            progress_percent,
            is_tracking,
        }
    }

    /// Live distance to the current step's anchor, falling back to the
    /// step's own leg length before the first fix arrives.
    fn residual_to_current_anchor(&self) -> f64 {
        let step = match self.route.steps().get(self.current_step_index) {
            Some(step) => step,
            None => return 0.0,
        };
        match self.last_known_position {
            Some(position) => distance_meters(position, step.anchor),
            None => step.distance_meters,
        }
    }

    /// Route length used for progress: the measured geometry when there
    /// is one, the provider summary otherwise.
    fn route_length(route: &Route) -> f64 {
        let measured = route.path_length_meters();
        if measured > 0.0 {
            measured
        } else {
            route.total_distance_meters
        }
    }
}
