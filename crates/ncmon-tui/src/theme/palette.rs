//! Color palette for the chart views.

use ratatui::style::Color;

// --- Borders ---
pub const BORDER_DIM: Color = Color::DarkGray;
pub const BORDER_ACTIVE: Color = Color::Cyan;

// --- Text ---
pub const TEXT_PRIMARY: Color = Color::White;
pub const TEXT_SECONDARY: Color = Color::Gray;
pub const TEXT_MUTED: Color = Color::DarkGray;

// --- Status ---
pub const STATUS_GREEN: Color = Color::Green;
pub const STATUS_RED: Color = Color::Red;
pub const STATUS_YELLOW: Color = Color::Yellow;

// --- Coding series ---
pub const SERIES_MEASURED: Color = Color::Cyan;
pub const SERIES_IDEAL: Color = Color::Green;
pub const SERIES_UNCODED: Color = Color::Red;

// --- Native reception bars (display order) ---
pub const BAR_COLORS: [Color; 5] = [
    Color::Blue,
    Color::Green,
    Color::Cyan,
    Color::Yellow,
    Color::Red,
];

// --- Sync series ---
pub const SERIES_DELTA: Color = Color::Cyan;
pub const SERIES_MEAN: Color = Color::Yellow;
pub const SERIES_OFFSET: Color = Color::Magenta;
pub const SERIES_TREND: Color = Color::Yellow;
pub const SERIES_SEND: Color = Color::Blue;
pub const SERIES_RECV: Color = Color::Green;
pub const HISTOGRAM_BAR: Color = Color::Cyan;

/// One color per replayed block, cycled.
pub const REPLAY_COLORS: [Color; 6] = [
    Color::Cyan,
    Color::Green,
    Color::Magenta,
    Color::Yellow,
    Color::Blue,
    Color::LightRed,
];

pub fn replay_color(index: usize) -> Color {
    REPLAY_COLORS[index % REPLAY_COLORS.len()]
}
