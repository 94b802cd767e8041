//! Operator CLI for Biogate
//!
//! Validates service configuration files, lists the sensors they declare,
//! prints the display strings chosen for every modality combination and
//! reports which vendor notifier a device tree selects.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod handlers;

#[derive(Parser)]
#[command(name = "biogate")]
#[command(about = "Biogate - biometric authentication service tooling", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Load and validate a configuration file
    Check {
        /// Config file path
        config: PathBuf,
    },

    /// List the sensors a configuration declares
    Sensors {
        /// Config file path
        config: PathBuf,

        /// Emit JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Print the display category and strings for every modality bitmask
    Labels {
        /// Config file path; built-in strings are used when omitted
        config: Option<PathBuf>,
    },

    /// Report the vendor notifier selected for a device tree
    Notifier {
        /// Root of the device tree to probe
        #[arg(long, default_value = "/")]
        root: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(log_level))
        .with_writer(std::io::stderr)
        .init();

    let output = match cli.command {
        Commands::Check { config } => handlers::check::run(&config)?,
        Commands::Sensors { config, json } => handlers::sensors::run(&config, json)?,
        Commands::Labels { config } => handlers::labels::run(config.as_deref())?,
        Commands::Notifier { root } => handlers::notifier::run(&root)?,
    };
    print!("{output}");
    Ok(())
}
