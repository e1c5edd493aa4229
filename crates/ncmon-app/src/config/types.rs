//! Configuration types for ncmon
//!
//! Defines `Settings` (`.ncmon/config.toml`) and its sections.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use ncmon_source::SerialOptions;

/// Application settings (.ncmon/config.toml)
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Settings {
    #[serde(default)]
    pub serial: SerialSettings,

    #[serde(default)]
    pub window: WindowSettings,

    #[serde(default)]
    pub render: RenderSettings,

    #[serde(default)]
    pub export: ExportSettings,

    #[serde(default)]
    pub sync: SyncSettings,
}

/// Serial port parameters
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct SerialSettings {
    #[serde(default = "default_baud_rate")]
    pub baud_rate: u32,

    /// Read timeout in milliseconds; also bounds how fast a port closes
    #[serde(default = "default_read_timeout_ms")]
    pub read_timeout_ms: u64,
}

impl Default for SerialSettings {
    fn default() -> Self {
        Self {
            baud_rate: default_baud_rate(),
            read_timeout_ms: default_read_timeout_ms(),
        }
    }
}

impl SerialSettings {
    pub fn options(&self) -> SerialOptions {
        SerialOptions {
            baud_rate: self.baud_rate,
            read_timeout: Duration::from_millis(self.read_timeout_ms),
        }
    }
}

fn default_baud_rate() -> u32 {
    921_600
}

fn default_read_timeout_ms() -> u64 {
    10
}

/// Sample window
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct WindowSettings {
    /// Capacity of every sample buffer
    #[serde(default = "default_window_size")]
    pub size: usize,
}

impl Default for WindowSettings {
    fn default() -> Self {
        Self {
            size: default_window_size(),
        }
    }
}

fn default_window_size() -> usize {
    1000
}

/// Render cadence
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct RenderSettings {
    /// Minimum time between two renders
    #[serde(default = "default_render_interval_ms")]
    pub interval_ms: u64,

    /// Sleep after a pass in which no source had a line
    #[serde(default = "default_idle_backoff_ms")]
    pub idle_backoff_ms: u64,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            interval_ms: default_render_interval_ms(),
            idle_backoff_ms: default_idle_backoff_ms(),
        }
    }
}

impl RenderSettings {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    pub fn idle_backoff(&self) -> Duration {
        Duration::from_millis(self.idle_backoff_ms)
    }
}

fn default_render_interval_ms() -> u64 {
    200
}

fn default_idle_backoff_ms() -> u64 {
    5
}

/// Files written by `--save`
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ExportSettings {
    /// Coding-gain blocks, one per native count
    #[serde(default = "default_export_path")]
    pub path: PathBuf,

    /// Final clock-sync statistics (JSON)
    #[serde(default = "default_sync_export_path")]
    pub sync_path: PathBuf,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            path: default_export_path(),
            sync_path: default_sync_export_path(),
        }
    }
}

fn default_export_path() -> PathBuf {
    PathBuf::from("export/coding_plot/relay_values.txt")
}

fn default_sync_export_path() -> PathBuf {
    PathBuf::from("export/sync_plot/sync_report.json")
}

/// Clock-sync statistics
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct SyncSettings {
    /// Leading edge deltas excluded from statistics
    #[serde(default = "default_delta_warmup")]
    pub delta_warmup: usize,

    /// Leading master offsets excluded from statistics
    #[serde(default = "default_offset_warmup")]
    pub offset_warmup: usize,

    #[serde(default = "default_histogram_bins")]
    pub histogram_bins: usize,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            delta_warmup: default_delta_warmup(),
            offset_warmup: default_offset_warmup(),
            histogram_bins: default_histogram_bins(),
        }
    }
}

fn default_delta_warmup() -> usize {
    1
}

fn default_offset_warmup() -> usize {
    2
}

fn default_histogram_bins() -> usize {
    20
}
