//! Error types for the directions provider.

use thiserror::Error;

use crate::route::RouteError;

/// Errors that can occur while fetching or normalizing a route.
///
/// The provider is best-effort and possibly unavailable; every failure is
/// typed so callers can decide between blocking and non-blocking surfacing.
#[derive(Debug, Clone, Error)]
pub enum DirectionsError {
    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    HttpError(String),

    /// JSON deserialization failed.
    #[error("Failed to parse response: {0}")]
    JsonError(String),

    /// The provider answered but found no route between the points.
    #[error("No route found between origin and destination")]
    NoRoute,

    /// The provider's route failed normalization invariants.
    #[error("Provider returned an invalid route: {0}")]
    InvalidRoute(#[from] RouteError),
}
