//! Chart widgets, one per experiment view

mod coding;
mod native_bars;
mod replay;
mod sync;

pub use coding::CodingPanel;
pub use native_bars::NativeBars;
pub use replay::ReplayPanel;
pub use sync::SyncPanel;

use ratatui::style::Style;
use ratatui::symbols::Marker;
use ratatui::text::Line;
use ratatui::widgets::{Axis, Dataset, GraphType};

use crate::theme::styles;

/// Axis bounds covering every point of every series.
///
/// Degenerate ranges are widened so the chart always has an extent.
pub(crate) fn bounds<'a, I>(series: I) -> ([f64; 2], [f64; 2])
where
    I: IntoIterator<Item = &'a [(f64, f64)]>,
{
    let mut x = [f64::INFINITY, f64::NEG_INFINITY];
    let mut y = [f64::INFINITY, f64::NEG_INFINITY];
    for &(px, py) in series.into_iter().flatten() {
        x = [x[0].min(px), x[1].max(px)];
        y = [y[0].min(py), y[1].max(py)];
    }
    (widen(x), widen(y))
}

fn widen(range: [f64; 2]) -> [f64; 2] {
    if !range[0].is_finite() || !range[1].is_finite() {
        return [0.0, 1.0];
    }
    if range[0] == range[1] {
        return [range[0] - 0.5, range[1] + 0.5];
    }
    range
}

/// Format an axis tick compactly.
pub(crate) fn tick(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e9 {
        format!("{}", value as i64)
    } else {
        format!("{:.2}", value)
    }
}

pub(crate) fn axis(title: &str, range: [f64; 2]) -> Axis<'_> {
    let mid = (range[0] + range[1]) / 2.0;
    Axis::default()
        .title(title)
        .style(styles::text_muted())
        .bounds(range)
        .labels([
            Line::from(tick(range[0])),
            Line::from(tick(mid)),
            Line::from(tick(range[1])),
        ])
}

/// A braille line series.
pub(crate) fn line_series<'a>(name: &'a str, style: Style, data: &'a [(f64, f64)]) -> Dataset<'a> {
    Dataset::default()
        .name(name)
        .marker(Marker::Braille)
        .graph_type(GraphType::Line)
        .style(style)
        .data(data)
}

/// A braille scatter series.
pub(crate) fn scatter_series<'a>(
    name: &'a str,
    style: Style,
    data: &'a [(f64, f64)],
) -> Dataset<'a> {
    Dataset::default()
        .name(name)
        .marker(Marker::Braille)
        .graph_type(GraphType::Scatter)
        .style(style)
        .data(data)
}

/// Horizontal line at `y` across `x`.
pub(crate) fn level(x: [f64; 2], y: f64) -> Vec<(f64, f64)> {
    vec![(x[0], y), (x[1], y)]
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounds_cover_all_series() {
        let a = [(1.0, 2.0), (3.0, 4.0)];
        let b = [(0.0, 10.0)];
        let (x, y) = bounds([&a[..], &b[..]]);
        assert_eq!(x, [0.0, 3.0]);
        assert_eq!(y, [2.0, 10.0]);
    }

    #[test]
    fn test_bounds_empty_and_degenerate() {
        let (x, y) = bounds(std::iter::empty::<&[(f64, f64)]>());
        assert_eq!(x, [0.0, 1.0]);
        assert_eq!(y, [0.0, 1.0]);

        let one = [(2.0, 5.0)];
        let (x, y) = bounds([&one[..]]);
        assert_eq!(x, [1.5, 2.5]);
        assert_eq!(y, [4.5, 5.5]);
    }

    #[test]
    fn test_tick_format() {
        assert_eq!(tick(3.0), "3");
        assert_eq!(tick(-12.0), "-12");
        assert_eq!(tick(1.256), "1.26");
    }
}
