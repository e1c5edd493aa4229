//! Logging configuration using tracing
//!
//! The terminal belongs to the chart view (or to the JSON stream in headless
//! mode), so diagnostics only ever go to a rolling file.

use std::path::{Path, PathBuf};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::error::Result;

/// File name prefix of the rolling log.
const LOG_FILE_NAME: &str = "ncmon.log";

/// Environment variable holding the `EnvFilter` directives.
pub const LOG_ENV_VAR: &str = "NCMON_LOG";

/// Initialize the logging subsystem
///
/// Logs are written to `dir` when given, otherwise to
/// `~/.local/share/ncmon/logs/`. Returns the directory that was used.
/// Log level is controlled by the `NCMON_LOG` environment variable.
///
/// # Examples
/// ```bash
/// NCMON_LOG=debug ncmon coding -p /dev/ttyUSB0 /dev/ttyUSB1
/// NCMON_LOG=ncmon_core=trace ncmon sync --observer /dev/ttyUSB2
/// ```
pub fn init(dir: Option<&Path>) -> Result<PathBuf> {
    let log_dir = dir.map(Path::to_path_buf).unwrap_or_else(default_log_directory);
    std::fs::create_dir_all(&log_dir)?;

    let file_appender = RollingFileAppender::new(Rotation::DAILY, &log_dir, LOG_FILE_NAME);

    let env_filter = EnvFilter::try_from_env(LOG_ENV_VAR)
        .unwrap_or_else(|_| EnvFilter::new("ncmon=info,ncmon_app=info,warn"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_writer(file_appender)
                .with_ansi(false)
                .with_target(true)
                .with_file(true)
                .with_line_number(true)
                .with_timer(fmt::time::ChronoLocal::new(
                    "%Y-%m-%d %H:%M:%S%.3f".to_string(),
                )),
        )
        .init();

    tracing::info!("───────────────────────────────────────────────");
    tracing::info!("ncmon {} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!("Log directory: {}", log_dir.display());

    Ok(log_dir)
}

/// Default log directory under the platform data dir.
pub fn default_log_directory() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("ncmon")
        .join("logs")
}
