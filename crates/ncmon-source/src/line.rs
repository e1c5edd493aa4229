//! The line-source contract
//!
//! Every binding runs its blocking reader on a background thread or task and
//! forwards cleaned lines through a bounded channel. The monitor only ever
//! calls [`LineSource::read_line`], which never blocks.

use tokio::sync::mpsc::{self, error::TryRecvError};

use ncmon_core::clean_line;
use ncmon_core::prelude::*;

/// Lines buffered per source before the reader applies backpressure.
pub const LINE_CHANNEL_CAPACITY: usize = 1024;

/// Result of one non-blocking read attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineRead {
    /// A cleaned, non-empty line.
    Line(String),
    /// Nothing available right now.
    Idle,
    /// The source is gone and will never produce another line.
    Closed,
}

/// A non-blocking producer of device log lines.
pub trait LineSource: Send {
    /// Human-readable origin of the lines (port path, command, `stdin`).
    fn label(&self) -> &str;

    /// Take the next line if one is ready.
    fn read_line(&mut self) -> LineRead;

    /// Stop the underlying reader and release the device. Idempotent.
    fn close(&mut self);
}

/// Decode raw bytes read from a device into a cleaned line.
///
/// Returns `None` for undecodable bytes and for lines that are empty after
/// escape stripping and trimming.
pub fn decode_line(raw: &[u8]) -> Option<String> {
    match std::str::from_utf8(raw) {
        Ok(text) => clean_line(text),
        Err(e) => {
            trace!("Dropping undecodable line ({} bytes): {}", raw.len(), e);
            None
        }
    }
}

/// Receiving half of a reader channel, with the source's label.
pub struct ChannelSource {
    label: String,
    rx: mpsc::Receiver<String>,
    closed: bool,
}

impl ChannelSource {
    /// Create the channel pair. The sender goes to the background reader.
    pub fn channel(label: impl Into<String>) -> (mpsc::Sender<String>, Self) {
        let (tx, rx) = mpsc::channel(LINE_CHANNEL_CAPACITY);
        let source = Self {
            label: label.into(),
            rx,
            closed: false,
        };
        (tx, source)
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

impl LineSource for ChannelSource {
    fn label(&self) -> &str {
        &self.label
    }

    fn read_line(&mut self) -> LineRead {
        if self.closed {
            return LineRead::Closed;
        }
        match self.rx.try_recv() {
            Ok(line) => LineRead::Line(line),
            Err(TryRecvError::Empty) => LineRead::Idle,
            Err(TryRecvError::Disconnected) => {
                debug!("Line source {} disconnected", self.label);
                self.closed = true;
                LineRead::Closed
            }
        }
    }

    fn close(&mut self) {
        if !self.closed {
            self.rx.close();
            self.closed = true;
        }
    }
}
