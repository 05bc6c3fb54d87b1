use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::core::input::{Key, KeySource};
use crate::domain::error::{SerconError, SerconResult};

/// Key presses from the local terminal (must be in raw mode)
#[derive(Debug, Default)]
pub struct CrosstermKeys;

impl KeySource for CrosstermKeys {
    fn next_key(&mut self, timeout: Duration) -> SerconResult<Option<Key>> {
        let ready = event::poll(timeout).map_err(|e| SerconError::Tui(e.to_string()))?;
        if !ready {
            return Ok(None);
        }

        match event::read().map_err(|e| SerconError::Tui(e.to_string()))? {
            Event::Key(key) => Ok(map_key(key)),
            // Resizes are picked up by the renderer on its next frame.
            _ => Ok(None),
        }
    }
}

/// Translate a crossterm key event; `None` for keys the console ignores
pub fn map_key(key: KeyEvent) -> Option<Key> {
    if key.kind == KeyEventKind::Release {
        return None;
    }

    let mapped = match key.code {
        KeyCode::Char(c) if key.modifiers.contains(KeyModifiers::CONTROL) => Key::Ctrl(c),
        KeyCode::Char(c) => Key::Char(c),
        KeyCode::Enter => Key::Enter,
        KeyCode::Backspace => Key::Backspace,
        KeyCode::Tab => Key::Tab,
        KeyCode::Esc => Key::Esc,
        KeyCode::Up => Key::Up,
        KeyCode::Down => Key::Down,
        KeyCode::Left => Key::Left,
        KeyCode::Right => Key::Right,
        KeyCode::Home => Key::Home,
        KeyCode::End => Key::End,
        KeyCode::Delete => Key::Delete,
        _ => return None,
    };
    Some(mapped)
}
