//! Byte-level terminal state machine.
//!
//! Interprets newline, backspace and bell into cursor and scroll
//! mutations over a fixed scroll region. Output always lands on the bottom
//! row of the region; older rows scroll up and fall off the top.

use std::collections::VecDeque;

pub const NEWLINE: u8 = b'\n';
pub const CARRIAGE_RETURN: u8 = b'\r';
pub const BACKSPACE: u8 = 0x08;
pub const BELL: u8 = 0x07;

/// Glyph shown for control bytes that have no meaning here
const UNPRINTABLE: char = '.';

/// Rectangular area that scrolls, excluding the status row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScrollRegion {
    pub top: u16,
    pub bottom: u16,
    /// First column bytes are placed in
    pub left: u16,
    /// Number of cells per row
    pub width: u16,
}

impl ScrollRegion {
    /// Region for a terminal of the given size: every row but the last
    /// (status bar), one column of left margin.
    pub fn for_terminal(columns: u16, rows: u16) -> Self {
        Self {
            top: 0,
            bottom: rows.saturating_sub(2),
            left: 1,
            width: columns.saturating_sub(1).max(1),
        }
    }

    pub fn height(&self) -> u16 {
        self.bottom - self.top + 1
    }

    /// One past the last cell of a row
    pub fn end(&self) -> u16 {
        self.left + self.width
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScreenCursor {
    pub row: u16,
    pub column: u16,
}

/// Side effect of feeding bytes, in the order it happened
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScreenEvent {
    /// A newline finalized this row's text (trailing blanks trimmed)
    Committed(String),
    Scrolled,
    /// Bell, or backspace at the first column
    Alert,
}

#[derive(Debug, Clone)]
pub struct ScreenBuffer {
    region: ScrollRegion,
    cursor: ScreenCursor,
    rows: VecDeque<Vec<char>>,
    ignore_carriage_return: bool,
}

impl ScreenBuffer {
    pub fn new(region: ScrollRegion, ignore_carriage_return: bool) -> Self {
        let rows = (0..region.height())
            .map(|_| blank_row(region.width))
            .collect();
        Self {
            region,
            cursor: ScreenCursor {
                row: region.bottom,
                column: region.left,
            },
            rows,
            ignore_carriage_return,
        }
    }

    pub fn region(&self) -> ScrollRegion {
        self.region
    }

    pub fn cursor(&self) -> ScreenCursor {
        self.cursor
    }

    /// Apply `bytes` in order and report what happened
    pub fn feed(&mut self, bytes: &[u8]) -> Vec<ScreenEvent> {
        let mut events = Vec::new();
        for &byte in bytes {
            self.apply(byte, &mut events);
        }
        events
    }

    fn apply(&mut self, byte: u8, events: &mut Vec<ScreenEvent>) {
        match byte {
            NEWLINE => {
                events.push(ScreenEvent::Committed(self.current_line()));
                self.scroll(events);
            }
            BACKSPACE => {
                if self.cursor.column > self.region.left {
                    self.cursor.column -= 1;
                    let cell = self.cell_index();
                    self.current_row_mut()[cell] = ' ';
                } else {
                    events.push(ScreenEvent::Alert);
                }
            }
            BELL => events.push(ScreenEvent::Alert),
            CARRIAGE_RETURN if self.ignore_carriage_return => {}
            other => {
                if self.cursor.column >= self.region.end() {
                    self.scroll(events);
                }
                let cell = self.cell_index();
                self.current_row_mut()[cell] = glyph(other);
                self.cursor.column += 1;
            }
        }
    }

    fn scroll(&mut self, events: &mut Vec<ScreenEvent>) {
        self.rows.pop_front();
        self.rows.push_back(blank_row(self.region.width));
        self.cursor.column = self.region.left;
        events.push(ScreenEvent::Scrolled);
    }

    fn cell_index(&self) -> usize {
        usize::from(self.cursor.column - self.region.left)
    }

    fn current_row_mut(&mut self) -> &mut Vec<char> {
        // `rows` always holds region.height() >= 1 rows.
        let last = self.rows.len() - 1;
        &mut self.rows[last]
    }

    /// Text of the row the cursor is on, trailing blanks trimmed
    pub fn current_line(&self) -> String {
        self.rows
            .back()
            .map(|row| row.iter().collect::<String>().trim_end().to_string())
            .unwrap_or_default()
    }

    /// Every row of the region, top to bottom, without trimming
    pub fn lines(&self) -> impl Iterator<Item = String> + '_ {
        self.rows.iter().map(|row| row.iter().collect())
    }

    /// Adopt a new region, keeping the bottom-most rows and the text that
    /// still fits.
    pub fn resize(&mut self, region: ScrollRegion) {
        if region == self.region {
            return;
        }
        let width = usize::from(region.width);
        for row in self.rows.iter_mut() {
            row.resize(width, ' ');
        }
        let height = usize::from(region.height());
        while self.rows.len() > height {
            self.rows.pop_front();
        }
        while self.rows.len() < height {
            self.rows.push_front(blank_row(region.width));
        }

        let offset = self.cursor.column.saturating_sub(self.region.left);
        self.region = region;
        self.cursor = ScreenCursor {
            row: region.bottom,
            column: region.left + offset.min(region.width),
        };
    }
}

fn blank_row(width: u16) -> Vec<char> {
    vec![' '; usize::from(width)]
}

fn glyph(byte: u8) -> char {
    if byte.is_ascii_control() {
        UNPRINTABLE
    } else {
        char::from(byte)
    }
}
