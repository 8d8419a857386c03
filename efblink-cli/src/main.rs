//! EFB Link CLI - Command-line interface
//!
//! This binary provides a command-line interface to the efblink library.

mod commands;
mod error;
mod runner;

use std::net::SocketAddr;

use clap::{Parser, Subcommand};

use commands::config::ConfigCommands;
use commands::discover::DiscoverArgs;
use commands::run::RunArgs;

#[derive(Parser)]
#[command(name = "efblink")]
#[command(version = efblink::VERSION)]
#[command(about = "Flight-simulator telemetry with automatic feed failover", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Listen on all enabled feeds and print the unified telemetry
    Run {
        /// Write status changes and snapshots as JSON lines
        #[arg(long)]
        json: bool,

        /// Enable debug-level logging
        #[arg(long)]
        debug: bool,

        /// Mirror log output to the console (ignored with --json)
        #[arg(short, long)]
        verbose: bool,
    },

    /// Listen for a simulator beacon and print its address
    Discover {
        /// Seconds to wait (default: discovery.timeout from config)
        #[arg(long)]
        timeout: Option<u64>,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Ask the simulator plugin to reload its configuration
    Reload {
        /// Plugin address (e.g., 192.168.1.20:49100); discovered if omitted
        #[arg(long)]
        target: Option<SocketAddr>,
    },

    /// View or modify configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run {
            json,
            debug,
            verbose,
        } => {
            commands::run::run(RunArgs {
                json,
                debug,
                verbose,
            })
            .await
        }
        Commands::Discover { timeout, json } => {
            commands::discover::run(DiscoverArgs { timeout, json }).await
        }
        Commands::Reload { target } => commands::reload::run(target).await,
        Commands::Config { command } => commands::config::run(command),
    };

    if let Err(e) = result {
        e.exit();
    }
}
