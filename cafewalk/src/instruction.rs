//! Instruction formatting.
//!
//! Maps a guidance step plus the walker's residual distance to it into
//! the distance-bucketed phrasing shown on screen. Provider-supplied
//! phrases take precedence; otherwise a fixed phrase is keyed by the
//! maneuver kind.

use crate::route::{GuidanceStep, ManeuverKind, Route};

/// Shown as the secondary line when there is no next step.
pub const ARRIVING_SOON: &str = "arriving soon";

/// Fixed phrase for a maneuver kind.
pub fn phrase(kind: ManeuverKind) -> &'static str {
    match kind {
        ManeuverKind::Straight => "continue straight",
        ManeuverKind::TurnLeft => "turn left",
        ManeuverKind::TurnRight => "turn right",
        ManeuverKind::UTurn => "make a U-turn",
        ManeuverKind::BearLeft => "bear left",
        ManeuverKind::BearRight => "bear right",
        ManeuverKind::Arrive => "arrive at destination",
    }
}

/// Format a step with the walker's residual distance to its anchor.
///
/// Bucketing applies uniformly regardless of maneuver kind: the further
/// away the anchor, the wordier the prefix; within 10 m the action stands
/// alone.
pub fn format(step: &GuidanceStep, residual_meters: f64) -> String {
    let action = step
        .raw_text
        .as_deref()
        .unwrap_or_else(|| phrase(step.kind));
    let d = residual_meters.round() as i64;

    if residual_meters > 100.0 {
        format!("{}m ahead, {}", d, action)
    } else if residual_meters > 30.0 {
        format!("{}m ahead {}", d, action)
    } else if residual_meters > 10.0 {
        format!("{}m {}", d, action)
    } else {
        action.to_string()
    }
}

/// Format the current and next instruction for a step sequence.
///
/// The secondary line applies the same formatting to the following step,
/// using that step's own leg distance as residual; when the current step
/// is the last one it reads [`ARRIVING_SOON`].
pub fn format_pair(steps: &[GuidanceStep], index: usize, residual_meters: f64) -> (String, String) {
    let primary = match steps.get(index) {
        Some(step) => format(step, residual_meters),
        None => phrase(ManeuverKind::Arrive).to_string(),
    };

    let secondary = match steps.get(index + 1) {
        Some(next) => format(next, next.distance_meters),
        None => ARRIVING_SOON.to_string(),
    };

    (primary, secondary)
}

/// One entry of the full-route overview card list.
#[derive(Debug, Clone, PartialEq)]
pub struct OverviewEntry {
    /// 1-based display number.
    pub step_number: usize,
    /// The phrase for this step.
    pub phrase: String,
    /// Leg distance in meters.
    pub distance_meters: f64,
    /// Whether this is the final step of the route.
    pub is_final: bool,
}

/// Build the full turn-by-turn overview for a route.
///
/// This backs the scrollable "whole route" panel; the per-step phrasing
/// is bare (no distance prefix) because the list shows distances in a
/// separate column.
pub fn route_overview(route: &Route) -> Vec<OverviewEntry> {
    let steps = route.steps();
    steps
        .iter()
        .map(|step| OverviewEntry {
            step_number: step.sequence_index + 1,
            phrase: step
                .raw_text
                .clone()
                .unwrap_or_else(|| phrase(step.kind).to_string()),
            distance_meters: step.distance_meters,
            is_final: step.sequence_index + 1 == steps.len(),
        })
        .collect()
}
