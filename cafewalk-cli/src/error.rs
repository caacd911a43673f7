//! CLI error handling with user-friendly messages.

use std::process;

use thiserror::Error;

use cafewalk::error::NavigationError;

/// CLI-specific errors.
#[derive(Debug, Error)]
pub enum CliError {
    /// Failed to initialize logging.
    #[error("failed to initialize logging: {0}")]
    LoggingInit(String),

    /// The navigation core reported a blocking error.
    #[error("navigation error: {0}")]
    Navigation(#[from] NavigationError),
}

impl CliError {
    /// Exit the process with an error message and a non-zero code.
    pub fn exit(&self) -> ! {
        eprintln!("Error: {}", self);
        process::exit(1);
    }
}
