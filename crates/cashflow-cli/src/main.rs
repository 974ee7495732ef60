//! Cashflow CLI - Run the cash-flow optimizer from the command line
//!
//! Loads a network description, runs the learning loop over it, prints the
//! retained allocation and writes a JSON snapshot of the result.

// Clippy pedantic allows - these are intentional design choices
#![allow(clippy::doc_markdown)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::unused_async)]

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod config;
mod network;

use commands::{run, validate};

#[derive(Parser)]
#[command(name = "cashflow")]
#[command(author, version, about = "Cash flow optimizer - min-cost routing with Q-learning", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Configuration file (defaults to ./cashflow.toml or ~/.config/cashflow/cashflow.toml)
    #[arg(short, long, global = true, env = "CASHFLOW_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Optimize a network and report the result
    Run(run::RunArgs),

    /// Check a network file
    Validate(validate::ValidateArgs),

    /// Configuration management
    #[command(subcommand)]
    Config(commands::config::ConfigCommands),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = cli.config.clone().or_else(config::Config::find_config_file);
    let config = config::Config::load_from(config_path.as_deref())?;

    // Initialize logging based on verbosity
    let log_level = if cli.verbose {
        "debug"
    } else {
        config.logging.level.as_str()
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("cashflow={log_level},cashflow_core={log_level},cashflow_rl={log_level}")
                    .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    match cli.command {
        Commands::Run(args) => run::run(args, &config).await,
        Commands::Validate(args) => validate::run(args).await,
        Commands::Config(cmd) => {
            commands::config::run(cmd, &config, config_path.as_deref()).await
        }
    }
}
