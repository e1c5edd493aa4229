//! Terminal setup, restoration and the chart renderer

use std::time::Duration;

use ratatui::DefaultTerminal;

use ncmon_app::{Renderer, Snapshot};
use ncmon_core::prelude::*;

use crate::event;
use crate::view::{self, HOLD_HINT, LIVE_HINT};

/// How long the hold screen waits for a key before redrawing.
const HOLD_POLL: Duration = Duration::from_millis(100);

/// Install a panic hook that restores the terminal
pub fn install_panic_hook() {
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        ratatui::restore();
        original_hook(panic_info);
    }));
}

/// Draws snapshots on the alternate screen.
///
/// The terminal is restored on [`TerminalRenderer::restore`] or on drop.
pub struct TerminalRenderer {
    terminal: DefaultTerminal,
    restored: bool,
}

impl TerminalRenderer {
    /// Enter raw mode and the alternate screen.
    pub fn init() -> Result<Self> {
        install_panic_hook();
        let terminal = ratatui::try_init()
            .map_err(|e| Error::terminal(format!("Failed to initialise terminal: {}", e)))?;
        Ok(Self {
            terminal,
            restored: false,
        })
    }

    fn draw(&mut self, snapshot: &Snapshot, hint: &str) -> Result<()> {
        self.terminal
            .draw(|frame| view::view(frame, snapshot, hint))
            .map_err(|e| Error::render(e.to_string()))?;
        Ok(())
    }

    /// Keep the final charts on screen until a quit key or `interrupted()`.
    pub fn hold(&mut self, snapshot: &Snapshot, interrupted: impl Fn() -> bool) -> Result<()> {
        loop {
            self.draw(snapshot, HOLD_HINT)?;
            if interrupted() || event::poll_quit(HOLD_POLL)? {
                return Ok(());
            }
        }
    }

    pub fn restore(mut self) {
        self.restore_terminal();
    }

    fn restore_terminal(&mut self) {
        if !self.restored {
            ratatui::restore();
            self.restored = true;
        }
    }
}

impl Renderer for TerminalRenderer {
    fn render(&mut self, snapshot: &Snapshot) -> Result<()> {
        self.draw(snapshot, LIVE_HINT)
    }

    fn poll_quit(&mut self) -> bool {
        match event::poll_quit(Duration::ZERO) {
            Ok(quit) => quit,
            Err(e) => {
                warn!("Failed to poll terminal events: {}", e);
                false
            }
        }
    }
}

impl Drop for TerminalRenderer {
    fn drop(&mut self) {
        self.restore_terminal();
    }
}
