//! CLI module: command parsing and dispatch
//!
//! All CLI logic lives here. `main.rs` calls `cli::run()`.

pub mod config;
pub mod console;
pub mod run;

use std::path::PathBuf;

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};

use baitbot::config::Config;

#[derive(Parser)]
#[command(name = "baitbot")]
#[command(version)]
#[command(about = "Automated, human-like replies in ongoing chat conversations", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the conversation agents and the operator console
    Run {
        /// Config file path (defaults to ~/.baitbot/config.json)
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Feed the conversations with simulated inbound messages
        #[arg(long)]
        demo: bool,
    },
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
    /// Show version information
    Version,
}

#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Validate the configuration file
    Check {
        /// Config file path (defaults to ~/.baitbot/config.json)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

/// Resolves an explicit config path or the default one.
pub(crate) fn config_path(explicit: Option<PathBuf>) -> PathBuf {
    explicit.unwrap_or_else(Config::path)
}

pub async fn run() -> Result<()> {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    match cli.command {
        None => {
            let mut cmd = Cli::command();
            cmd.print_help()?;
            println!();
        }
        Some(Commands::Version) => {
            cmd_version();
        }
        Some(Commands::Run { config, demo }) => {
            run::cmd_run(config_path(config), demo).await?;
        }
        Some(Commands::Config { action }) => {
            config::cmd_config(action).await?;
        }
    }

    Ok(())
}

fn cmd_version() {
    println!("baitbot {}", env!("CARGO_PKG_VERSION"));
    println!();
    println!("Automated, human-like replies in ongoing chat conversations");
}
