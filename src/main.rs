//! ncmon - serial log monitor for network-coding and clock-sync experiments
//!
//! This is the binary entry point. All logic lives in the library.

use std::path::PathBuf;

use clap::Parser;
use ncmon::cli::{Cli, Command};
use ncmon::runner;
use ncmon_app::config::{load_settings, load_settings_from};
use ncmon_core::logging;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();

    if let Err(e) = logging::init(None) {
        eprintln!("Warning: file logging disabled: {}", e);
    }

    // An explicit settings file must parse; the implicit one falls back to defaults
    let mut settings = match &cli.config {
        Some(path) => load_settings_from(path)?,
        None => {
            let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
            load_settings(&cwd)
        }
    };
    if let Some(baud) = cli.baud {
        settings.serial.baud_rate = baud;
    }

    let result = match cli.command {
        Command::Coding(args) => runner::run_coding(args, &settings).await,
        Command::Sync(args) => runner::run_sync(args, &settings).await,
        Command::Replay(args) => runner::run_replay(args, &settings).await,
        Command::Ports => runner::print_ports(),
    };

    if let Err(e) = &result {
        tracing::error!("ncmon exiting with error: {}", e);
    }
    Ok(result?)
}
