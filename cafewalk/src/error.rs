//! Navigation error taxonomy.

use thiserror::Error;

use crate::directions::DirectionsError;
use crate::position::PositionErrorKind;

/// Errors surfaced from a navigation session to the UI layer.
///
/// The core never terminates the process on error; the worst outcome is
/// the session reverting to idle with one of these attached. Sensor
/// timeouts are absorbed inside the position tracker and never reach
/// this type.
#[derive(Debug, Clone, Error)]
pub enum NavigationError {
    /// The position sensor failed in a way the user can act on
    /// (permission, availability). Recoverable via retry.
    #[error("position sensor error ({kind}): {message}")]
    Sensor {
        kind: PositionErrorKind,
        message: String,
    },

    /// The initial route fetch failed; the session never started.
    /// Surfaced as a blocking error.
    #[error("could not fetch a route: {0}")]
    RouteFetch(DirectionsError),

    /// A deviation-triggered reroute failed; the session keeps guiding
    /// on the stale route and retries at the next deviation check.
    /// Surfaced as a non-blocking warning.
    #[error("rerouting failed, keeping current route: {0}")]
    Reroute(DirectionsError),
}
