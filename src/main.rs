//! Command line driver for the wind field simulator.
//!
//! - `gale run --output wind/` simulates random gusts blowing through the field and records every
//!   frame.
//! - `gale inspect wind/` replays a recording and reports how the field evolved.

use std::{path::PathBuf, process::ExitCode};

use clap::{Parser, Subcommand};
use tracing::error;
use tracing_subscriber::EnvFilter;

mod inspect;
mod run;

#[derive(Parser)]
#[command(name = "gale")]
#[command(version, about = "Stable-fluids wind field simulator", long_about = None)]
struct Cli {
    /// Log every simulation step
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Only log errors
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Blow gusts through the field and record each frame
    Run(run::RunArgs),

    /// Summarize a recording frame by frame
    Inspect {
        /// Recording directory
        path: PathBuf,
    },
}

fn setup_logging(verbose: bool, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    setup_logging(cli.verbose, cli.quiet);

    let result = match cli.command {
        Commands::Run(args) => run::run(args),
        Commands::Inspect { path } => inspect::inspect(path),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err:#}");
            ExitCode::FAILURE
        }
    }
}
