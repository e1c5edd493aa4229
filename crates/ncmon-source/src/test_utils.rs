//! Test utilities for line sources
//!
//! [`ScriptedSource`] replays a fixed sequence of reads so the monitor can be
//! driven deterministically without hardware.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::line::{LineRead, LineSource};

/// A line source that replays scripted reads, then reports `Closed`.
pub struct ScriptedSource {
    label: String,
    reads: VecDeque<LineRead>,
    closed: Arc<AtomicBool>,
    /// Keep returning `Idle` instead of `Closed` once the script runs out.
    hold_open: bool,
}

impl ScriptedSource {
    /// Replay `lines` one per read, then close.
    pub fn new<I, S>(label: &str, lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::from_reads(
            label,
            lines.into_iter().map(|l| LineRead::Line(l.into())).collect(),
        )
    }

    /// Replay an explicit sequence of reads (lines, idles, a close).
    pub fn from_reads(label: &str, reads: Vec<LineRead>) -> Self {
        Self {
            label: label.to_string(),
            reads: reads.into(),
            closed: Arc::new(AtomicBool::new(false)),
            hold_open: false,
        }
    }

    /// Stay idle after the script instead of closing.
    pub fn held_open(mut self) -> Self {
        self.hold_open = true;
        self
    }

    /// Shared flag set when the monitor calls `close()`.
    pub fn close_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.closed)
    }
}

impl LineSource for ScriptedSource {
    fn label(&self) -> &str {
        &self.label
    }

    fn read_line(&mut self) -> LineRead {
        if self.closed.load(Ordering::Acquire) {
            return LineRead::Closed;
        }
        match self.reads.pop_front() {
            Some(read) => read,
            None if self.hold_open => LineRead::Idle,
            None => LineRead::Closed,
        }
    }

    fn close(&mut self) {
        self.closed.store(true, Ordering::Release);
    }
}
