//! Directions collaborator
//!
//! Abstraction over the external route computation service plus the wire
//! types it speaks. The navigation session only ever sees the normalized
//! [`crate::route::Route`]; raw provider payloads stay inside this module
//! and the route normalizer.

mod client;
mod error;
pub mod types;

pub use client::{DirectionsProvider, HttpDirectionsClient};
pub use error::DirectionsError;
