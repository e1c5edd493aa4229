//! Headless mode - JSON lines instead of charts
//!
//! Every render becomes one NDJSON line on stdout, so runs can be recorded or
//! piped into other tools.
//!
//! # Example Output
//!
//! ```json
//! {"event":"started","mode":"coding","sources":["/dev/ttyUSB0","/dev/ttyUSB1"],"timestamp":1704700001000}
//! {"event":"snapshot","snapshot":{"kind":"coding","relay":{...},"natives":[...]},"timestamp":1704700001200}
//! {"event":"finished","summary":{"reason":"all_terminated",...},"timestamp":1704700009000}
//! ```

use std::io::{self, Write};

use chrono::Utc;
use serde::Serialize;

use ncmon_app::{Mode, MonitorSummary, Renderer, Snapshot};
use ncmon_core::prelude::*;

/// Events emitted in headless mode
#[derive(Debug, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum HeadlessEvent<'a> {
    /// Sources are open and the monitor is about to start
    Started {
        mode: Mode,
        sources: Vec<String>,
        timestamp: i64,
    },

    /// One render of the current state
    Snapshot {
        snapshot: &'a Snapshot,
        timestamp: i64,
    },

    /// The monitor stopped and tore down
    Finished {
        summary: &'a MonitorSummary,
        timestamp: i64,
    },

    /// Final statistics were written to disk
    Saved {
        mode: Mode,
        path: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        native_count: Option<usize>,
        timestamp: i64,
    },
}

fn now() -> i64 {
    Utc::now().timestamp_millis()
}

impl<'a> HeadlessEvent<'a> {
    pub fn started(mode: Mode, sources: Vec<String>) -> Self {
        Self::Started {
            mode,
            sources,
            timestamp: now(),
        }
    }

    pub fn snapshot(snapshot: &'a Snapshot) -> Self {
        Self::Snapshot {
            snapshot,
            timestamp: now(),
        }
    }

    pub fn finished(summary: &'a MonitorSummary) -> Self {
        Self::Finished {
            summary,
            timestamp: now(),
        }
    }

    pub fn saved(mode: Mode, path: impl Into<String>, native_count: Option<usize>) -> Self {
        Self::Saved {
            mode,
            path: path.into(),
            native_count,
            timestamp: now(),
        }
    }
}

/// Renderer that writes one JSON object per line.
pub struct HeadlessRenderer<W: Write> {
    out: W,
}

impl HeadlessRenderer<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> HeadlessRenderer<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn emit(&mut self, event: &HeadlessEvent<'_>) -> Result<()> {
        serde_json::to_writer(&mut self.out, event)
            .context("Failed to serialize headless event")?;
        self.out.write_all(b"\n")?;
        self.out.flush()?;
        Ok(())
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> Renderer for HeadlessRenderer<W> {
    fn render(&mut self, snapshot: &Snapshot) -> Result<()> {
        self.emit(&HeadlessEvent::snapshot(snapshot))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ncmon_app::ReplayView;

    fn lines(out: Vec<u8>) -> Vec<serde_json::Value> {
        String::from_utf8(out)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect()
    }

    #[test]
    fn test_render_writes_one_line_per_snapshot() {
        let mut renderer = HeadlessRenderer::new(Vec::new());
        let snapshot = Snapshot::Replay(ReplayView::new("values.txt", Vec::new(), 150));
        renderer.render(&snapshot).unwrap();
        renderer.render(&snapshot).unwrap();

        let events = lines(renderer.into_inner());
        assert_eq!(events.len(), 2);
        assert_eq!(events[0]["event"], "snapshot");
        assert_eq!(events[0]["snapshot"]["kind"], "replay");
        assert_eq!(events[0]["snapshot"]["range"], 150);
        assert!(events[0]["timestamp"].is_i64());
    }

    #[test]
    fn test_started_and_saved_events() {
        let mut renderer = HeadlessRenderer::new(Vec::new());
        renderer
            .emit(&HeadlessEvent::started(Mode::Sync, vec!["-".to_string()]))
            .unwrap();
        renderer
            .emit(&HeadlessEvent::saved(Mode::Coding, "out.txt", Some(3)))
            .unwrap();
        renderer
            .emit(&HeadlessEvent::saved(Mode::Sync, "sync.json", None))
            .unwrap();

        let events = lines(renderer.into_inner());
        assert_eq!(events[0]["event"], "started");
        assert_eq!(events[0]["mode"], "sync");
        assert_eq!(events[0]["sources"][0], "-");
        assert_eq!(events[1]["event"], "saved");
        assert_eq!(events[1]["mode"], "coding");
        assert_eq!(events[1]["native_count"], 3);
        assert_eq!(events[2]["mode"], "sync");
        assert!(events[2].get("native_count").is_none());
    }
}
