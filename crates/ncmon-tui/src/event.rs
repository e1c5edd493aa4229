//! Terminal event polling

use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ncmon_core::prelude::*;

/// Keys that stop the monitor: `q`, `Esc` and `Ctrl+C` (raw mode swallows
/// SIGINT, so Ctrl+C arrives as a key).
pub fn is_quit_key(key: KeyEvent) -> bool {
    match key.code {
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => true,
        KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => true,
        _ => false,
    }
}

/// Drain pending terminal events, waiting up to `timeout` for the first.
/// Returns whether any of them was a quit key press.
pub fn poll_quit(timeout: Duration) -> Result<bool> {
    let mut quit = false;
    let mut wait = timeout;
    while event::poll(wait)? {
        wait = Duration::ZERO;
        if let Event::Key(key) = event::read()? {
            if key.kind == KeyEventKind::Press && is_quit_key(key) {
                quit = true;
            }
        }
    }
    Ok(quit)
}
