//! Navigation session
//!
//! The core of the engine: a pure state machine
//! ([`NavigationSession`]) that turns position fixes into step, arrival
//! and deviation state, and a supervisor ([`NavigationSupervisor`]) that
//! owns its lifecycle — one live session at a time, an event-loop task
//! driving it, and idempotent teardown of tracking and timers.

mod config;
mod model;
mod state;
mod supervisor;

pub use config::SessionConfig;
pub use model::NavigationSession;
pub use state::{NavigationSnapshot, NavigationState, SessionEffect, SessionEvent};
pub use supervisor::NavigationSupervisor;
