//! Route, section and guidance step types.
//!
//! A [`Route`] is the normalized form of whatever the directions provider
//! returned: an ordered list of [`RouteSection`]s, a dense flattening of
//! their [`GuidanceStep`]s, and a flattened polyline with cumulative
//! distances for progress and deviation queries.

use std::fmt;

use thiserror::Error;

use crate::geo::{distance_meters, GeoPoint};

/// Reference pedestrian speed, 4 km/h expressed in m/s.
///
/// The upstream directions service is driving-oriented; its durations
/// underestimate walking time and are recomputed from this speed at
/// normalization time.
pub const WALKING_SPEED_MPS: f64 = 4_000.0 / 3_600.0;

/// Errors raised while validating a normalized route.
///
/// These indicate a malformed provider response or a bug in upstream
/// normalization, not a runtime condition the session should tolerate.
#[derive(Debug, Clone, Error)]
pub enum RouteError {
    /// The provider returned a route with no sections.
    #[error("route has no sections")]
    EmptySections,

    /// Section distances disagree with the summary total beyond rounding.
    #[error("section distances sum to {summed:.0} m but summary declares {declared:.0} m")]
    DistanceMismatch { declared: f64, summed: f64 },
}

/// The maneuver a guidance step asks the walker to perform.
///
/// Mirrors the provider's numeric guidance codes (1..=7); anything the
/// provider invents beyond that table is treated as straight-ahead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManeuverKind {
    Straight,
    TurnLeft,
    TurnRight,
    UTurn,
    BearLeft,
    BearRight,
    Arrive,
}

impl ManeuverKind {
    /// Map a provider guidance code to a maneuver.
    ///
    /// Unknown codes fall back to [`ManeuverKind::Straight`].
    pub fn from_guidance_code(code: u32) -> Self {
        match code {
            1 => Self::Straight,
            2 => Self::TurnLeft,
            3 => Self::TurnRight,
            4 => Self::UTurn,
            5 => Self::BearLeft,
            6 => Self::BearRight,
            7 => Self::Arrive,
            _ => Self::Straight,
        }
    }
}

impl fmt::Display for ManeuverKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Straight => "Straight",
            Self::TurnLeft => "TurnLeft",
            Self::TurnRight => "TurnRight",
            Self::UTurn => "UTurn",
            Self::BearLeft => "BearLeft",
            Self::BearRight => "BearRight",
            Self::Arrive => "Arrive",
        };
        write!(f, "{}", name)
    }
}

/// A single turn-by-turn instruction anchored to a point along the route.
///
/// Produced once per route normalization; immutable for the lifetime of
/// the route. `raw_text`, when present, takes precedence over phrasing
/// derived from `kind`.
#[derive(Debug, Clone, PartialEq)]
pub struct GuidanceStep {
    /// Dense index into the flattened step sequence, starting at 0.
    pub sequence_index: usize,
    /// Index of the owning section within the route.
    pub section_index: usize,
    /// Where along the route this instruction applies.
    pub anchor: GeoPoint,
    /// Length of the leg this step covers, in meters.
    pub distance_meters: f64,
    /// The maneuver to perform.
    pub kind: ManeuverKind,
    /// Provider-supplied phrase, preferred over `kind` when present.
    pub raw_text: Option<String>,
}

/// One leg of a route: a distance, its guidance steps and its geometry.
///
/// Sections are traversed in order and never revisited.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteSection {
    /// Length of this section in meters.
    pub distance_meters: f64,
    /// Guidance steps within this section, in travel order.
    pub guides: Vec<GuidanceStep>,
    /// Geometry of this section, in travel order.
    pub polyline: Vec<GeoPoint>,
}

/// A vertex of the flattened route geometry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PathVertex {
    /// The vertex position.
    pub point: GeoPoint,
    /// Distance walked from the route start to this vertex, in meters.
    pub cumulative_meters: f64,
    /// Index of the section this vertex belongs to.
    pub section_index: usize,
}

/// A normalized, indexable walking route.
#[derive(Debug, Clone)]
pub struct Route {
    /// Total length declared by the provider summary, in meters.
    pub total_distance_meters: f64,
    /// Walking duration in seconds, recomputed at 4 km/h.
    pub total_duration_seconds: f64,
    /// Ordered sections.
    sections: Vec<RouteSection>,
    /// Dense flattening of every section's guides.
    steps: Vec<GuidanceStep>,
    /// Flattened geometry with cumulative distances.
    path: Vec<PathVertex>,
}

impl Route {
    /// Tolerance allowed between the summary distance and the section sum.
    ///
    /// The provider rounds each section to whole meters.
    fn distance_tolerance(section_count: usize) -> f64 {
        1.0 + 0.5 * section_count as f64
    }

    /// Assemble a route from already-normalized sections.
    ///
    /// Assigns dense `sequence_index` values across all guides and builds
    /// the flattened path. Every section is expected to carry at least one
    /// guide (normalization synthesizes one when the provider sent none).
    pub fn from_sections(
        total_distance_meters: f64,
        sections: Vec<RouteSection>,
    ) -> Result<Self, RouteError> {
        if sections.is_empty() {
            tracing::error!("normalization produced a route with no sections");
            return Err(RouteError::EmptySections);
        }

        let summed: f64 = sections.iter().map(|s| s.distance_meters).sum();
        if (summed - total_distance_meters).abs() > Self::distance_tolerance(sections.len()) {
            tracing::error!(
                summed,
                declared = total_distance_meters,
                "section distances disagree with route summary"
            );
            return Err(RouteError::DistanceMismatch {
                declared: total_distance_meters,
                summed,
            });
        }

        let mut steps = Vec::new();
        for (section_index, section) in sections.iter().enumerate() {
            for guide in &section.guides {
                steps.push(GuidanceStep {
                    sequence_index: steps.len(),
                    section_index,
                    ..guide.clone()
                });
            }
        }

        let mut path: Vec<PathVertex> = Vec::new();
        let mut cumulative = 0.0;
        for (section_index, section) in sections.iter().enumerate() {
            for &point in &section.polyline {
                if let Some(prev) = path.last() {
                    cumulative += distance_meters(prev.point, point);
                }
                path.push(PathVertex {
                    point,
                    cumulative_meters: cumulative,
                    section_index,
                });
            }
        }

        Ok(Self {
            total_distance_meters,
            total_duration_seconds: total_distance_meters / WALKING_SPEED_MPS,
            sections,
            steps,
            path,
        })
    }

    /// Ordered sections of this route.
    pub fn sections(&self) -> &[RouteSection] {
        &self.sections
    }

    /// The dense step sequence indexed by the navigation session.
    pub fn steps(&self) -> &[GuidanceStep] {
        &self.steps
    }

    /// Flattened geometry with cumulative distances.
    pub fn path(&self) -> &[PathVertex] {
        &self.path
    }

    /// Total length of the flattened geometry in meters.
    ///
    /// May differ slightly from `total_distance_meters` because the
    /// provider measures along road centerlines.
    pub fn path_length_meters(&self) -> f64 {
        self.path.last().map(|v| v.cumulative_meters).unwrap_or(0.0)
    }

    /// The full polyline, for handing to the map overlay collaborator.
    pub fn full_polyline(&self) -> Vec<GeoPoint> {
        self.path.iter().map(|v| v.point).collect()
    }

    /// Walking duration recomputed from the summary distance, in minutes.
    pub fn duration_minutes(&self) -> u32 {
        (self.total_duration_seconds / 60.0).round() as u32
    }

    /// Nearest path vertex to a point, with its distance in meters.
    ///
    /// Returns `None` when the provider sent no geometry at all.
    pub fn nearest_path_vertex(&self, point: GeoPoint) -> Option<(usize, f64)> {
        self.path
            .iter()
            .enumerate()
            .map(|(i, v)| (i, distance_meters(point, v.point)))
            .min_by(|a, b| a.1.total_cmp(&b.1))
    }

    /// Meters left to walk from `point`, measured along the geometry.
    ///
    /// Uses the nearest vertex as the current progress mark. Falls back to
    /// the sum of the not-yet-reached step legs when there is no geometry.
    pub fn remaining_meters_from(&self, point: GeoPoint, current_step_index: usize) -> f64 {
        match self.nearest_path_vertex(point) {
            Some((index, _)) => {
                (self.path_length_meters() - self.path[index].cumulative_meters).max(0.0)
            }
            None => self
                .steps
                .iter()
                .skip(current_step_index)
                .map(|s| s.distance_meters)
                .sum(),
        }
    }

    /// Minimum distance from `point` to any vertex of the sections not yet
    /// completed, in meters. `None` when those sections have no geometry.
    pub fn min_offset_from_remaining(
        &self,
        point: GeoPoint,
        current_step_index: usize,
    ) -> Option<f64> {
        let from_section = self
            .steps
            .get(current_step_index)
            .map(|s| s.section_index)
            .unwrap_or(0);

        self.path
            .iter()
            .filter(|v| v.section_index >= from_section)
            .map(|v| distance_meters(point, v.point))
            .min_by(|a, b| a.total_cmp(b))
    }
}
