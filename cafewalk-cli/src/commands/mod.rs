//! CLI subcommands.

pub mod simulate;

pub use simulate::SimulateArgs;
