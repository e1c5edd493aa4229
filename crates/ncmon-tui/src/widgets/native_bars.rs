//! Native peers: one bar group per board with its reception counters.

use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Bar, BarChart, BarGroup, Paragraph, Widget};

use ncmon_app::NativeReport;

use crate::theme::{palette, styles};

const BAR_WIDTH: u16 = 3;

pub struct NativeBars<'a> {
    natives: &'a [NativeReport],
}

impl<'a> NativeBars<'a> {
    pub fn new(natives: &'a [NativeReport]) -> Self {
        Self { natives }
    }
}

fn group(report: &NativeReport) -> BarGroup<'static> {
    let bars: Vec<Bar<'static>> = report
        .bars()
        .iter()
        .map(|(_, value)| value)
        .zip(palette::BAR_COLORS)
        .map(|(value, color)| {
            // pending can briefly go negative when a cached decode is seen first
            let value = u64::try_from(*value).unwrap_or(0);
            Bar::default().value(value).style(styles::series(color))
        })
        .collect();

    let mut label = report.label.clone();
    if report.terminated {
        label.push_str(" (done)");
    }
    BarGroup::default().label(Line::from(label)).bars(&bars)
}

fn legend() -> Line<'static> {
    let spans: Vec<_> = NativeReport::BAR_LABELS
        .iter()
        .zip(palette::BAR_COLORS)
        .flat_map(|(name, color)| {
            [
                Span::styled("■ ", styles::series(color)),
                Span::styled(format!("{}  ", name), styles::text_secondary()),
            ]
        })
        .collect();
    Line::from(spans)
}

impl Widget for NativeBars<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.width == 0 || area.height == 0 {
            return;
        }

        let block = styles::panel_block(" native peers ", false);
        let inner = block.inner(area);
        block.render(area, buf);

        if self.natives.is_empty() {
            Paragraph::new("No native peers")
                .style(styles::text_muted())
                .render(inner, buf);
            return;
        }

        let (legend_area, chart_area) = match inner.height {
            0 => return,
            1 => (inner, Rect::default()),
            _ => (
                Rect { height: 1, ..inner },
                Rect {
                    y: inner.y + 1,
                    height: inner.height - 1,
                    ..inner
                },
            ),
        };
        legend().render(legend_area, buf);

        let mut chart = BarChart::default()
            .bar_width(BAR_WIDTH)
            .bar_gap(0)
            .group_gap(2);
        for report in self.natives {
            chart = chart.data(group(report));
        }
        chart.render(chart_area, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::widgets::test_support::{buf_contains_text, render_to_buf};
    use ncmon_app::{NodeState, Role};

    fn native(label: &str, lines: &[&str]) -> NativeReport {
        let mut node = NodeState::new(label, Role::Native, 10);
        for line in lines {
            node.apply(line);
        }
        NativeReport::from_native(&node)
    }

    #[test]
    fn test_renders_group_per_native() {
        let natives = vec![
            native("n1", &["Received encoded packet", "Decoded packet 1"]),
            native("n2", &["Received encoded packet"]),
        ];
        let buf = render_to_buf(NativeBars::new(&natives), 120, 16);
        assert!(buf_contains_text(&buf, "n1"));
        assert!(buf_contains_text(&buf, "n2"));
        assert!(buf_contains_text(&buf, "waiting in cache"));
    }

    #[test]
    fn test_no_natives_message() {
        let buf = render_to_buf(NativeBars::new(&[]), 40, 5);
        assert!(buf_contains_text(&buf, "No native peers"));
    }

    #[test]
    fn test_negative_pending_is_clamped() {
        // cached decode without a preceding failure
        let natives = vec![native("n1", &["Decoded cashed packet 3"])];
        assert_eq!(natives[0].pending_in_cache, -1);
        render_to_buf(NativeBars::new(&natives), 40, 10);
    }
}
