//! Relay view: transmissions per native packet and coding gain.
//!
//! ```text
//! ┌─ /dev/ttyUSB0 (relay) ─────────────────────────────────────────┐
//! │ broadcasts 42  retransmissions 3  backlog 1  gain 1.84 / 2.00  │
//! │ ┌ transmissions ──────────────┐┌ coding gain ─────────────────┐ │
//! │ │ ⠀⠀⠀⠀⠀⠀⠀⠀⣀⠤⠒ no coding     ││ ⠉⠒⠤⣀⣀⣀⣀⣀ measured            │ │
//! │ │ ⠀⠀⣀⠤⠒⠉⠀⠀⠀⠀ measured       ││ ⠒⠒⠒⠒⠒⠒⠒⠒ ideal               │ │
//! │ └─────────────────────────────┘└──────────────────────────────┘ │
//! └────────────────────────────────────────────────────────────────┘
//! ```

use ratatui::buffer::Buffer;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Chart, LegendPosition, Widget};

use ncmon_app::CodingReport;

use super::{axis, bounds, level, line_series, tick};
use crate::theme::{palette, styles};

pub struct CodingPanel<'a> {
    report: &'a CodingReport,
}

impl<'a> CodingPanel<'a> {
    pub fn new(report: &'a CodingReport) -> Self {
        Self { report }
    }

    fn summary(&self) -> Line<'static> {
        let r = self.report;
        let ideal = r
            .ideal_gain
            .map_or_else(|| "undefined".to_string(), |g| format!("{:.2}", g));
        let mut spans = vec![
            Span::styled("broadcasts ", styles::text_secondary()),
            Span::styled(r.encoded_broadcasts.to_string(), styles::label_bold()),
            Span::styled("  retransmissions ", styles::text_secondary()),
            Span::styled(r.retransmissions.to_string(), styles::label_bold()),
            Span::styled("  backlog ", styles::text_secondary()),
            Span::styled(r.unencoded_backlog.to_string(), styles::label_bold()),
            Span::styled("  gain ", styles::text_secondary()),
            Span::styled(format!("{:.2}", r.average_gain), styles::status_green()),
            Span::styled(format!(" / {}", ideal), styles::text_muted()),
        ];
        if r.report_savings_mean > 0.0 {
            spans.push(Span::styled("  report savings ", styles::text_secondary()));
            spans.push(Span::styled(tick(r.report_savings_mean), styles::label_bold()));
        }
        if r.terminated {
            spans.push(Span::styled("  [shut down]", styles::status_red()));
        }
        Line::from(spans)
    }
}

impl Widget for CodingPanel<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.width == 0 || area.height == 0 {
            return;
        }

        let title = format!(" {} (relay, {} natives) ", self.report.relay, self.report.native_count);
        let block = styles::panel_block(&title, true);
        let inner = block.inner(area);
        block.render(area, buf);

        let [summary_area, charts_area] =
            Layout::vertical([Constraint::Length(1), Constraint::Min(0)]).areas(inner);
        self.summary().render(summary_area, buf);

        let [transm_area, gain_area] =
            Layout::horizontal([Constraint::Percentage(50), Constraint::Percentage(50)])
                .areas(charts_area);
        render_transmissions(self.report, transm_area, buf);
        render_gain(self.report, gain_area, buf);
    }
}

fn render_transmissions(report: &CodingReport, area: Rect, buf: &mut Buffer) {
    let measured = report.transmission_points();
    let ideal = report.ideal_transmission_points();
    let uncoded = report.uncoded_transmission_points();
    let (x, y) = bounds([&measured[..], &ideal[..], &uncoded[..]]);

    let chart = Chart::new(vec![
        line_series("no coding", styles::series(palette::SERIES_UNCODED), &uncoded),
        line_series("ideal", styles::series(palette::SERIES_IDEAL), &ideal),
        line_series("measured", styles::series(palette::SERIES_MEASURED), &measured),
    ])
    .block(styles::panel_block(" transmissions ", false))
    .x_axis(axis("native packet", x))
    .y_axis(axis("broadcasts", y))
    .legend_position(Some(LegendPosition::TopLeft));
    chart.render(area, buf);
}

fn render_gain(report: &CodingReport, area: Rect, buf: &mut Buffer) {
    let measured = report.coding_gain_points();
    let (x, _) = bounds([&measured[..]]);
    let ideal = report.ideal_gain.map(|g| level(x, g)).unwrap_or_default();
    let (_, y) = bounds([&measured[..], &ideal[..]]);

    let chart = Chart::new(vec![
        line_series("ideal", styles::series(palette::SERIES_IDEAL), &ideal),
        line_series("measured", styles::series(palette::SERIES_MEASURED), &measured),
    ])
    .block(styles::panel_block(" coding gain ", false))
    .x_axis(axis("broadcast", x))
    .y_axis(axis("gain", y))
    .legend_position(Some(LegendPosition::TopRight));
    chart.render(area, buf);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::widgets::test_support::{buf_contains_text, render_to_buf};
    use ncmon_app::{NodeState, Role};

    fn report(lines: &[&str], natives: usize) -> CodingReport {
        let mut relay = NodeState::new("/dev/ttyUSB0", Role::Relay, 100);
        for line in lines {
            relay.apply(line);
        }
        CodingReport::from_relay(&relay, natives)
    }

    #[test]
    fn test_renders_empty_report_without_panic() {
        let r = report(&[], 1);
        let buf = render_to_buf(CodingPanel::new(&r), 100, 24);
        assert!(buf_contains_text(&buf, "/dev/ttyUSB0"));
        assert!(buf_contains_text(&buf, "undefined"));
    }

    #[test]
    fn test_summary_shows_counters() {
        let r = report(
            &[
                "Encoded packets [ 1 2 ]",
                "Encoded packets [ 3 4 ]",
                "Number of retransmissions: 5",
            ],
            2,
        );
        let buf = render_to_buf(CodingPanel::new(&r), 120, 30);
        assert!(buf_contains_text(&buf, "broadcasts 2"));
        assert!(buf_contains_text(&buf, "retransmissions 5"));
        assert!(buf_contains_text(&buf, "transmissions"));
        assert!(buf_contains_text(&buf, "coding gain"));
    }

    #[test]
    fn test_tiny_area_does_not_panic() {
        let r = report(&["Encoded packets [ 1 2 ]"], 2);
        render_to_buf(CodingPanel::new(&r), 3, 2);
        render_to_buf(CodingPanel::new(&r), 0, 0);
    }
}
