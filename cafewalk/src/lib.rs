//! CafeWalk - Pedestrian turn-by-turn navigation core
//!
//! This library turns a single externally-computed walking route into a live,
//! GPS-driven guidance session: step tracking, arrival detection, deviation
//! recovery and session lifecycle/cleanup. It renders nothing and stores
//! nothing; the map widget, the cafe database and the route computation
//! service are external collaborators.
//!
//! # High-Level API
//!
//! For most use cases, the [`session`] module provides the supervisor facade:
//!
//! ```ignore
//! use cafewalk::geo::GeoPoint;
//! use cafewalk::session::{NavigationSupervisor, SessionConfig};
//!
//! let supervisor = NavigationSupervisor::new(directions, sensor, SessionConfig::default());
//! let mut snapshots = supervisor.subscribe_snapshots();
//!
//! supervisor.start_navigation_to(GeoPoint::new(37.4979, 127.0276)).await?;
//! while snapshots.changed().await.is_ok() {
//!     let snap = snapshots.borrow().clone();
//!     println!("{}", snap.current_instruction);
//! }
//! ```

pub mod directions;
pub mod error;
pub mod geo;
pub mod instruction;
pub mod logging;
pub mod position;
pub mod route;
pub mod session;

/// Version of the CafeWalk library and CLI.
///
/// This is synchronized across all components in the workspace.
/// The version is defined in `Cargo.toml` and injected at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
