//! ncmon-app - Experiment state and orchestration for ncmon
//!
//! Binds peers to roles, applies their log lines to per-node sample stores,
//! derives reports for rendering, saves coding results and drives the whole
//! thing from [`Monitor`].

pub mod config;
pub mod export;
pub mod monitor;
pub mod node;
pub mod report;
pub mod role;
pub mod signals;

// Re-export primary types
pub use config::{load_settings, load_settings_from, Settings};
pub use export::{
    format_block, parse_blocks, read_blocks, write_block, write_sync_report, ExportBlock,
};
pub use monitor::{Mode, Monitor, MonitorSummary, Pass, Renderer, StopReason};
pub use node::{Dispatch, EdgeCycle, NodeState};
pub use report::{
    CodingReport, CodingView, NativeReport, PeerOffsets, ReplayView, Snapshot, SyncReport,
};
pub use role::{PatternId, Role};
