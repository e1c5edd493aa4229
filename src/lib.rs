//! ncmon - serial log monitor for network-coding and clock-sync experiments
//!
//! This is the binary crate's library. The domain lives in the workspace
//! crates:
//! - `ncmon-core`: classifier, sample store, statistics, errors, logging
//! - `ncmon-source`: serial, process and stdin line sources
//! - `ncmon-app`: roles, node state, reports, export, the monitor loop
//! - `ncmon-tui`: ratatui charts
//!
//! This crate adds the CLI, the headless JSON-lines renderer and the
//! subcommand runners.

pub mod cli;
pub mod headless;
pub mod runner;

pub use cli::{Cli, Command};
pub use runner::{run_coding, run_replay, run_sync, Frontend};
