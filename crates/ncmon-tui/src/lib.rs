//! # ncmon-tui - Terminal Charts
//!
//! Renders monitor snapshots with ratatui: relay transmissions and coding
//! gain with native reception bars, clock-sync edge spreads and offsets, and
//! replays of saved coding runs.
//!
//! [`TerminalRenderer`] plugs into the monitor loop as its
//! [`ncmon_app::Renderer`].

pub mod event;
pub mod terminal;
pub mod theme;
pub mod view;
pub mod widgets;

pub use terminal::{install_panic_hook, TerminalRenderer};
pub use view::{view, SnapshotView, HOLD_HINT, LIVE_HINT};
