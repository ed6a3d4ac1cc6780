use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use ramped_output::config::DriveConfig;
use ramped_output::runtime;

/// Ramped tank drive on simulated motor outputs
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// Drive configuration (JSON); built-in defaults when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    mode: Mode,
}

#[derive(Debug, Subcommand)]
enum Mode {
    /// Drive with the keyboard
    Teleop,
    /// Play a JSON script of timed commands and print one sample per tick
    Profile { script: PathBuf },
}

#[tokio::main]
async fn main() {
    // Setup logging (set RUST_LOG=info or debug)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse().unwrap()))
        .with_writer(std::io::stderr)
        .init(); // installs the subscriber globally

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => match DriveConfig::load(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Config error: {}", e);
                std::process::exit(1);
            }
        },
        None => DriveConfig::default(),
    };

    let result = match &cli.mode {
        Mode::Teleop => runtime::run_teleop(&config).await,
        Mode::Profile { script } => runtime::run_profile(&config, script).await,
    };

    if let Err(e) = result {
        eprintln!("Runtime error: {}", e);
        std::process::exit(1);
    }
}
