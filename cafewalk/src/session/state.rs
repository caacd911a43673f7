//! Session state, snapshots and events.

use crate::error::NavigationError;
use crate::geo::GeoPoint;

/// Lifecycle state of a navigation session.
///
/// `Deviated` is a transient sub-state of guidance: a replacement route
/// is being fetched (or waiting to be retried) while the walker keeps
/// getting instructions from the stale route. `Arrived` is terminal for
/// a session instance; a new start always begins fresh from `Idle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NavigationState {
    /// No session is live.
    #[default]
    Idle,
    /// Guiding along the current route.
    Active,
    /// Off the route; a replacement is pending.
    Deviated,
    /// Within the arrival threshold of the destination.
    Arrived,
}

impl std::fmt::Display for NavigationState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "Idle"),
            Self::Active => write!(f, "Active"),
            Self::Deviated => write!(f, "Deviated"),
            Self::Arrived => write!(f, "Arrived"),
        }
    }
}

/// Read-only view of the session for the UI layer.
///
/// Recomputed after every state transition; never persisted.
#[derive(Debug, Clone, Default)]
pub struct NavigationSnapshot {
    /// Current lifecycle state.
    pub state: NavigationState,
    /// Instruction for the current step.
    pub current_instruction: String,
    /// Preview of the following step.
    pub next_instruction: String,
    /// Meters left to the destination along the route.
    pub remaining_distance_meters: f64,
    /// Walking minutes left at the reference speed.
    pub remaining_time_minutes: u32,
    /// Share of the route already covered, `0.0..=100.0`.
    pub progress_percent: f64,
    /// Whether the position subscription is live.
    pub is_tracking: bool,
}

/// Effects a transition asks its driver to perform.
///
/// The state machine itself never blocks or spawns; the event loop turns
/// these into timers and network calls.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEffect {
    /// The walker reached the destination; arm the auto-end timer.
    Arrived,
    /// The walker left the route; fetch a replacement from `origin`.
    RequestReroute { origin: GeoPoint },
}

/// Push events emitted to subscribers (UI, map overlay).
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// A route is available to draw. Sent on every (re)route.
    RouteAvailable { polyline: Vec<GeoPoint> },
    /// The route overlay should be cleared.
    RouteCleared,
    /// The session left the planned route.
    Deviated,
    /// A replacement route was installed after a deviation.
    Rerouted,
    /// The destination was reached.
    Arrived,
    /// A surfaced, non-fatal error. See [`NavigationError`] for
    /// blocking-versus-warning semantics.
    Error(NavigationError),
}
