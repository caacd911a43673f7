//! CafeWalk CLI - Command-line interface
//!
//! This binary drives the CafeWalk navigation core without the app
//! around it: it replays simulated walks through the real session
//! machinery and prints the guidance a user would see.

use clap::{Parser, Subcommand};

mod commands;
mod error;

use commands::SimulateArgs;
use error::CliError;

#[derive(Parser)]
#[command(name = "cafewalk")]
#[command(version = cafewalk::VERSION)]
#[command(about = "Pedestrian navigation core simulator", long_about = None)]
struct Cli {
    /// Directory for log files
    #[arg(long, default_value = "logs")]
    log_dir: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a simulated walk through a full guidance session
    Simulate(SimulateArgs),
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let _guard = match cafewalk::logging::init_logging(&cli.log_dir, "cafewalk.log") {
        Ok(guard) => guard,
        Err(e) => CliError::LoggingInit(e.to_string()).exit(),
    };

    let result = match cli.command {
        Commands::Simulate(args) => commands::simulate::run(args).await,
    };

    if let Err(e) = result {
        e.exit();
    }
}
