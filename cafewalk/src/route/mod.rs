//! Route model
//!
//! Normalizes an externally supplied route into a flat, indexable
//! sequence of guidance steps plus the geometry the session scans for
//! progress and deviation.

mod model;
mod normalize;

pub use model::{
    GuidanceStep, ManeuverKind, PathVertex, Route, RouteError, RouteSection, WALKING_SPEED_MPS,
};
pub use normalize::normalize;
