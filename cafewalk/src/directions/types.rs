//! Wire types for the directions provider.
//!
//! These mirror the JSON the route service returns. They are our own
//! types, decoupled from any SDK, and tolerant of extra fields — the real
//! API sends far more than position tracking needs.

use serde::{Deserialize, Serialize};

use crate::geo::GeoPoint;

/// Travel priority requested from the provider.
///
/// Pedestrian guidance always asks for the shortest path; time-optimized
/// routing only makes sense for driving.
pub const WALKING_PRIORITY: &str = "DISTANCE";

/// An `x`/`y` coordinate pair as the provider expects it: `x` is
/// longitude, `y` is latitude.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RawCoord {
    pub x: f64,
    pub y: f64,
}

impl From<GeoPoint> for RawCoord {
    fn from(p: GeoPoint) -> Self {
        Self {
            x: p.longitude,
            y: p.latitude,
        }
    }
}

/// Request body for a walking route.
#[derive(Debug, Clone, Serialize)]
pub struct DirectionsRequest {
    pub origin: RawCoord,
    pub destination: RawCoord,
    pub priority: &'static str,
    pub mode: &'static str,
}

impl DirectionsRequest {
    /// Build a walking request between two points.
    pub fn walking(origin: GeoPoint, destination: GeoPoint) -> Self {
        Self {
            origin: origin.into(),
            destination: destination.into(),
            priority: WALKING_PRIORITY,
            mode: "walking",
        }
    }
}

/// Top-level directions response.
#[derive(Debug, Clone, Deserialize)]
pub struct RawDirectionsResponse {
    #[serde(default)]
    pub routes: Vec<RawRoute>,
}

/// One computed route.
#[derive(Debug, Clone, Deserialize)]
pub struct RawRoute {
    pub summary: RawSummary,
    #[serde(default)]
    pub sections: Vec<RawSection>,
}

/// Route summary totals.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct RawSummary {
    /// Total distance in meters.
    pub distance: f64,
    /// Provider duration in seconds. Driving-tuned; not trusted for
    /// walking and recomputed during normalization.
    pub duration: f64,
}

/// One leg of the computed route.
#[derive(Debug, Clone, Deserialize)]
pub struct RawSection {
    /// Section distance in meters.
    pub distance: f64,
    /// Turn-by-turn guidance points. May be absent.
    #[serde(default)]
    pub guides: Vec<RawGuide>,
    /// Road geometry. May be absent.
    #[serde(default)]
    pub roads: Vec<RawRoad>,
}

impl RawSection {
    /// First geometry vertex of this section, if any.
    pub fn first_vertex(&self) -> Option<GeoPoint> {
        let road = self.roads.first()?;
        let chunk = road.vertexes.chunks_exact(2).next()?;
        Some(GeoPoint::new(chunk[1], chunk[0]))
    }
}

/// One guidance point within a section.
#[derive(Debug, Clone, Deserialize)]
pub struct RawGuide {
    /// Longitude of the guidance point.
    pub x: f64,
    /// Latitude of the guidance point.
    pub y: f64,
    /// Distance covered by this leg, in meters.
    #[serde(default)]
    pub distance: f64,
    /// Numeric maneuver code (1..=7).
    #[serde(default)]
    pub guidance_type: u32,
    /// Human-readable phrase, preferred over the code when present.
    #[serde(default)]
    pub guidance_text: Option<String>,
}

/// Road geometry: vertices stored flat as `[lng, lat, lng, lat, ...]`.
#[derive(Debug, Clone, Deserialize)]
pub struct RawRoad {
    #[serde(default)]
    pub vertexes: Vec<f64>,
}

impl RawRoad {
    /// Decode the flat vertex list into points. A trailing odd value is
    /// dropped rather than misread.
    pub fn points(&self) -> impl Iterator<Item = GeoPoint> + '_ {
        self.vertexes
            .chunks_exact(2)
            .map(|pair| GeoPoint::new(pair[1], pair[0]))
    }
}
