use std::io::{self, Stdout};

use crossterm::{
    cursor::Show,
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::{debug, warn};

use crate::domain::error::{SerconError, SerconResult};

pub type ConsoleTerminal = Terminal<CrosstermBackend<Stdout>>;

/// Puts the local terminal into raw mode on the alternate screen and
/// restores it when dropped, whichever way the console exits.
pub struct TerminalGuard {
    _private: (),
}

impl TerminalGuard {
    pub fn enter() -> SerconResult<Self> {
        enable_raw_mode().map_err(|e| SerconError::Tui(e.to_string()))?;
        let guard = Self { _private: () };
        execute!(io::stdout(), EnterAlternateScreen)
            .map_err(|e| SerconError::Tui(e.to_string()))?;
        debug!("Terminal switched to raw mode");
        Ok(guard)
    }

    /// Terminal drawing to stdout; only meaningful while the guard lives
    pub fn terminal(&self) -> SerconResult<ConsoleTerminal> {
        Terminal::new(CrosstermBackend::new(io::stdout()))
            .map_err(|e| SerconError::Tui(e.to_string()))
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        // Restore terminal
        if let Err(e) = disable_raw_mode() {
            warn!("Failed to leave raw mode: {}", e);
        }
        if let Err(e) = execute!(io::stdout(), LeaveAlternateScreen, Show) {
            warn!("Failed to leave alternate screen: {}", e);
        }
        debug!("Terminal restored");
    }
}
