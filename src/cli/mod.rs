//! CLI module for Certload
//!
//! Provides commands:
//! - `run`: Drive the configured scenarios and print a summary
//! - `handshake`: Perform one login handshake and print the outcome
//! - `keygen`: Generate a key pair and print its public half

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

pub mod handshake;
pub mod keygen;
pub mod run;

/// Certificate login load generator
#[derive(Parser, Debug)]
#[command(name = "certload")]
#[command(about = "Load generator for certificate-based login")]
#[command(version)]
pub struct Cli {
    /// Extra configuration file layered over the defaults
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run load scenarios
    Run(RunArgs),
    /// Perform a single login handshake
    Handshake,
    /// Generate a key pair and print the public key
    Keygen,
}

#[derive(Args, Debug, Default)]
pub struct RunArgs {
    /// Scenario to run (repeatable). Defaults to every enabled scenario.
    #[arg(long = "scenario", short = 's')]
    pub scenarios: Vec<String>,

    /// Iterations per second
    #[arg(long)]
    pub rate: Option<u32>,

    /// Run duration in seconds
    #[arg(long)]
    pub duration: Option<u64>,

    /// Executor pool size
    #[arg(long)]
    pub vus: Option<usize>,

    /// Print reports as JSON instead of text
    #[arg(long)]
    pub json: bool,
}

/// Run the CLI command
pub async fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Some(Commands::Run(args)) => run::run(cli.config.as_deref(), args).await,
        Some(Commands::Handshake) => handshake::run(cli.config.as_deref()).await,
        Some(Commands::Keygen) => keygen::run(),
        None => {
            let mut cmd = <Cli as clap::CommandFactory>::command();
            cmd.print_help()?;
            println!();
            Ok(())
        }
    }
}
