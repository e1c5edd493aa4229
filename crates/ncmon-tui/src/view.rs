//! Top-level view: lays out the panels for one snapshot plus a key hint bar.

use ratatui::buffer::Buffer;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::text::{Line, Span};
use ratatui::widgets::Widget;
use ratatui::Frame;

use ncmon_app::Snapshot;

use crate::theme::styles;
use crate::widgets::{CodingPanel, NativeBars, ReplayPanel, SyncPanel};

/// Hint shown while the monitor is running.
pub const LIVE_HINT: &str = "q/Esc: stop monitoring";
/// Hint shown once the run is over and the last charts are held on screen.
pub const HOLD_HINT: &str = "finished - q/Esc: quit";

pub struct SnapshotView<'a> {
    snapshot: &'a Snapshot,
    hint: &'a str,
}

impl<'a> SnapshotView<'a> {
    pub fn new(snapshot: &'a Snapshot, hint: &'a str) -> Self {
        Self { snapshot, hint }
    }
}

impl Widget for SnapshotView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.width == 0 || area.height == 0 {
            return;
        }

        let [body, footer] =
            Layout::vertical([Constraint::Min(0), Constraint::Length(1)]).areas(area);

        match self.snapshot {
            Snapshot::Coding(view) => {
                let [relay_area, natives_area] =
                    Layout::vertical([Constraint::Percentage(65), Constraint::Percentage(35)])
                        .areas(body);
                CodingPanel::new(&view.relay).render(relay_area, buf);
                NativeBars::new(&view.natives).render(natives_area, buf);
            }
            Snapshot::Sync(report) => SyncPanel::new(report).render(body, buf),
            Snapshot::Replay(view) => ReplayPanel::new(view).render(body, buf),
        }

        Line::from(vec![
            Span::styled(format!(" {} ", self.snapshot.kind()), styles::status_yellow()),
            Span::styled(self.hint, styles::text_muted()),
        ])
        .render(footer, buf);
    }
}

/// Draw `snapshot` over the whole frame.
pub fn view(frame: &mut Frame, snapshot: &Snapshot, hint: &str) {
    frame.render_widget(SnapshotView::new(snapshot, hint), frame.area());
}
