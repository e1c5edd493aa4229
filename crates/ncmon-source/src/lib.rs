//! # ncmon-source - Line Sources
//!
//! Everything that produces device log lines for the monitor: serial ports,
//! child processes and standard input, all behind the non-blocking
//! [`LineSource`] contract.
//!
//! Depends on [`ncmon_core`] for error handling and line cleaning.
//!
//! ## Public API
//!
//! ### Contract
//! - [`LineSource`] - `label()`, non-blocking `read_line()`, `close()`
//! - [`LineRead`] - `Line`, `Idle` or `Closed`
//! - [`ChannelSource`] - Receiving half shared by every binding
//!
//! ### Bindings
//! - [`SerialSource`] - A serial port read on a background thread
//! - [`ProcessSource`] - A child process's stdout (`cmd:<program> <args>`)
//! - [`StdinSource`] - This process's stdin (`-`)
//!
//! ### Discovery
//! - [`SourceSpec`] - Parse a command-line source string and open it
//! - [`list_ports()`] - Enumerate serial ports

pub mod line;
pub mod ports;
pub mod process;
pub mod serial;
pub mod spec;
pub mod stdin;
#[cfg(any(test, feature = "test-helpers"))]
pub mod test_utils;

pub use line::{decode_line, ChannelSource, LineRead, LineSource, LINE_CHANNEL_CAPACITY};
pub use ports::{list_ports, PortInfo, PortKind};
pub use process::ProcessSource;
pub use serial::{SerialOptions, SerialSource};
pub use spec::SourceSpec;
pub use stdin::StdinSource;
