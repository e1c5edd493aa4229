//! Clock-sync view
//!
//! Top row: edge spreads measured by the observer, with their mean and a
//! histogram. Bottom row: one column per sync peer showing the master offset
//! with its drift trend, and the averaged send/receive offsets.

use ratatui::buffer::Buffer;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::text::Line;
use ratatui::widgets::{Bar, BarChart, BarGroup, Chart, LegendPosition, Paragraph, Widget};

use ncmon_app::{PeerOffsets, SyncReport};
use ncmon_core::{indexed, HistogramBin};

use super::{axis, bounds, level, line_series, scatter_series, tick};
use crate::theme::{palette, styles};

pub struct SyncPanel<'a> {
    report: &'a SyncReport,
}

impl<'a> SyncPanel<'a> {
    pub fn new(report: &'a SyncReport) -> Self {
        Self { report }
    }
}

impl Widget for SyncPanel<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.width == 0 || area.height == 0 {
            return;
        }

        let [edges_area, peers_area] =
            Layout::vertical([Constraint::Percentage(50), Constraint::Percentage(50)]).areas(area);
        let [deltas_area, histogram_area] =
            Layout::horizontal([Constraint::Percentage(60), Constraint::Percentage(40)])
                .areas(edges_area);

        render_deltas(self.report, deltas_area, buf);
        render_histogram(&self.report.histogram, histogram_area, buf);

        if self.report.peers.is_empty() {
            Paragraph::new("No sync peers")
                .style(styles::text_muted())
                .block(styles::panel_block(" offsets ", false))
                .render(peers_area, buf);
            return;
        }

        let columns = Layout::horizontal(
            self.report
                .peers
                .iter()
                .map(|_| Constraint::Ratio(1, self.report.peers.len() as u32)),
        )
        .split(peers_area);
        for (peer, column) in self.report.peers.iter().zip(columns.iter()) {
            render_peer(peer, *column, buf);
        }
    }
}

fn render_deltas(report: &SyncReport, area: Rect, buf: &mut Buffer) {
    let deltas = indexed(&report.edge_deltas);
    let (x, _) = bounds([&deltas[..]]);
    let mean = if deltas.is_empty() {
        Vec::new()
    } else {
        level(x, report.delta_mean)
    };
    let (_, y) = bounds([&deltas[..], &mean[..]]);

    let title = format!(
        " {} edge spread (us)  cycles {}  mean {} ",
        report.observer,
        report.cycles,
        tick(report.delta_mean)
    );
    Chart::new(vec![
        line_series("spread", styles::series(palette::SERIES_DELTA), &deltas),
        line_series("mean", styles::series(palette::SERIES_MEAN), &mean),
    ])
    .block(styles::panel_block(&title, true))
    .x_axis(axis("cycle", x))
    .y_axis(axis("us", y))
    .legend_position(Some(LegendPosition::TopRight))
    .render(area, buf);
}

fn render_histogram(bins: &[HistogramBin], area: Rect, buf: &mut Buffer) {
    let block = styles::panel_block(" spread histogram ", false);
    if bins.is_empty() {
        Paragraph::new("No samples yet")
            .style(styles::text_muted())
            .block(block)
            .render(area, buf);
        return;
    }

    let bars: Vec<Bar> = bins
        .iter()
        .map(|bin| {
            Bar::default()
                .value(bin.count)
                .text_value(String::new())
                .style(styles::series(palette::HISTOGRAM_BAR))
        })
        .collect();

    // label only the outer edges; the bars are too narrow for more
    let range = match (bins.first(), bins.last()) {
        (Some(first), Some(last)) => format!("{} .. {} us", tick(first.lower), tick(last.upper)),
        _ => String::new(),
    };

    BarChart::default()
        .block(block)
        .bar_width(1)
        .bar_gap(0)
        .data(BarGroup::default().label(Line::from(range)).bars(&bars))
        .render(area, buf);
}

fn render_peer(peer: &PeerOffsets, area: Rect, buf: &mut Buffer) {
    let [offset_area, avg_area] =
        Layout::vertical([Constraint::Percentage(50), Constraint::Percentage(50)]).areas(area);

    let offsets = indexed(&peer.master_offsets);
    let (x, _) = bounds([&offsets[..]]);
    let trend: Vec<(f64, f64)> = peer
        .trend
        .map(|t| vec![(x[0], t.at(x[0])), (x[1], t.at(x[1]))])
        .unwrap_or_default();
    let (_, y) = bounds([&offsets[..], &trend[..]]);

    let drift = peer
        .trend
        .map_or_else(|| "n/a".to_string(), |t| format!("{:.3}", t.slope));
    let title = format!(" {} offset to master  drift {} ", peer.label, drift);
    Chart::new(vec![
        scatter_series("offset", styles::series(palette::SERIES_OFFSET), &offsets),
        line_series("trend", styles::series(palette::SERIES_TREND), &trend),
    ])
    .block(styles::panel_block(&title, false))
    .x_axis(axis("sample", x))
    .y_axis(axis("us", y))
    .legend_position(Some(LegendPosition::TopRight))
    .render(offset_area, buf);

    let send = indexed(&to_f64(&peer.send_offsets));
    let recv = indexed(&to_f64(&peer.recv_offsets));
    let (x, y) = bounds([&send[..], &recv[..]]);
    Chart::new(vec![
        line_series("send", styles::series(palette::SERIES_SEND), &send),
        line_series("recv", styles::series(palette::SERIES_RECV), &recv),
    ])
    .block(styles::panel_block(" avg send/recv offset ", false))
    .x_axis(axis("report", x))
    .y_axis(axis("us", y))
    .legend_position(Some(LegendPosition::TopRight))
    .render(avg_area, buf);
}

fn to_f64(values: &[i64]) -> Vec<f64> {
    values.iter().map(|v| *v as f64).collect()
}
