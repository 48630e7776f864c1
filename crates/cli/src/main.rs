//! lightsout CLI
//!
//! A command-line interface for the lightsout scheduler: one invocation
//! performs one reconciliation run against a region, driven by flags or by
//! a JSON trigger payload.

mod commands;

use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, fmt};

/// lightsout: scheduled start/stop for tagged cloud compute.
#[derive(Parser, Debug)]
#[command(name = "lightsout", version, about)]
struct Cli {
    /// Output format.
    #[arg(long, default_value = "text", global = true)]
    format: OutputFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Execute one reconciliation run.
    Run(commands::run::RunArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Run(args) => commands::run::run(&args, &cli.format).await,
    }
}
