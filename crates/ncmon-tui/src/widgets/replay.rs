//! Saved coding runs drawn side by side, one series per native count.

use ratatui::buffer::Buffer;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::widgets::{Chart, Dataset, LegendPosition, Paragraph, Widget};

use ncmon_app::ReplayView;
use ncmon_core::indexed;

use super::{axis, bounds, line_series};
use crate::theme::{palette, styles};

pub struct ReplayPanel<'a> {
    view: &'a ReplayView,
}

impl<'a> ReplayPanel<'a> {
    pub fn new(view: &'a ReplayView) -> Self {
        Self { view }
    }
}

impl Widget for ReplayPanel<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.width == 0 || area.height == 0 {
            return;
        }

        let title = format!(" {} (first {} values) ", self.view.source, self.view.range);
        let block = styles::panel_block(&title, true);

        if self.view.blocks.is_empty() {
            Paragraph::new("No saved runs in this file")
                .style(styles::text_muted())
                .block(block)
                .render(area, buf);
            return;
        }

        let inner = block.inner(area);
        block.render(area, buf);

        let names: Vec<String> = self
            .view
            .blocks
            .iter()
            .map(|b| format!("{} natives", b.native_count))
            .collect();
        let transmissions: Vec<Vec<(f64, f64)>> = self
            .view
            .blocks
            .iter()
            .map(|b| indexed(&b.transmissions.iter().map(|v| *v as f64).collect::<Vec<_>>()))
            .collect();
        let gains: Vec<Vec<(f64, f64)>> = self
            .view
            .blocks
            .iter()
            .map(|b| indexed(&b.coding_gain))
            .collect();
        let uncoded: Vec<(f64, f64)> = (1..=self.view.max_len())
            .map(|x| (x as f64, x as f64))
            .collect();

        let [transm_area, gain_area] =
            Layout::horizontal([Constraint::Percentage(50), Constraint::Percentage(50)])
                .areas(inner);

        let mut datasets = vec![line_series(
            "no coding",
            styles::series(palette::SERIES_UNCODED),
            &uncoded,
        )];
        datasets.extend(series(&names, &transmissions));
        let (x, y) = bounds(
            transmissions
                .iter()
                .map(Vec::as_slice)
                .chain([uncoded.as_slice()]),
        );
        Chart::new(datasets)
            .block(styles::panel_block(" transmissions ", false))
            .x_axis(axis("native packet", x))
            .y_axis(axis("broadcasts", y))
            .legend_position(Some(LegendPosition::TopLeft))
            .render(transm_area, buf);

        let (x, y) = bounds(gains.iter().map(Vec::as_slice));
        Chart::new(series(&names, &gains).collect())
            .block(styles::panel_block(" coding gain ", false))
            .x_axis(axis("broadcast", x))
            .y_axis(axis("gain", y))
            .legend_position(Some(LegendPosition::TopRight))
            .render(gain_area, buf);
    }
}

fn series<'a>(
    names: &'a [String],
    data: &'a [Vec<(f64, f64)>],
) -> impl Iterator<Item = Dataset<'a>> {
    names
        .iter()
        .zip(data)
        .enumerate()
        .map(|(i, (name, points))| {
            line_series(name, styles::series(palette::replay_color(i)), points)
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::widgets::test_support::{buf_contains_text, render_to_buf};
    use ncmon_app::ExportBlock;

    fn block(native_count: usize, len: usize) -> ExportBlock {
        ExportBlock {
            native_count,
            transmissions: (1..=len as i64).map(|v| v / 2 + 1).collect(),
            coding_gain: (0..len).map(|v| 1.0 + v as f64 / len as f64).collect(),
            average_gain: 1.5,
            ideal_gain: Some(1.5),
        }
    }

    #[test]
    fn test_renders_legend_per_block() {
        let view = ReplayView::new("relay_values.txt", vec![block(2, 40), block(3, 60)], 150);
        let buf = render_to_buf(ReplayPanel::new(&view), 140, 30);
        assert!(buf_contains_text(&buf, "relay_values.txt (first 150 values)"));
        assert!(buf_contains_text(&buf, "2 natives"));
        assert!(buf_contains_text(&buf, "3 natives"));
        assert!(buf_contains_text(&buf, "no coding"));
    }

    #[test]
    fn test_empty_file_message() {
        let view = ReplayView::new("empty.txt", Vec::new(), 150);
        let buf = render_to_buf(ReplayPanel::new(&view), 60, 6);
        assert!(buf_contains_text(&buf, "No saved runs"));
    }
}
