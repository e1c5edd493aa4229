//! Configuration file parsing for ncmon
//!
//! Supports:
//! - `.ncmon/config.toml` in the working directory
//! - an explicit `--config <path>`

pub mod settings;
pub mod types;

pub use settings::{config_path, load_settings, load_settings_from, CONFIG_FILENAME, NCMON_DIR};
pub use types::*;
