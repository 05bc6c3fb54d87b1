use ratatui::{layout::Rect, Frame};

use crate::core::screen::ScreenBuffer;

use super::overlay::OverlayView;
use super::widgets::{
    popup::{render_dialog, render_menu},
    screen::render_screen,
    status::{render_status_line, StatusLine},
};

/// Draw one full console frame: serial output, status bar, then any
/// menu or dialog on top.
pub fn draw_console(f: &mut Frame, screen: &ScreenBuffer, status: &StatusLine, overlay: Option<&OverlayView>) {
    let size = f.size();
    if size.area() == 0 {
        return;
    }

    render_screen(f, screen);

    let status_area = Rect::new(size.x, size.y + size.height - 1, size.width, 1);
    render_status_line(f, status_area, status);

    match overlay {
        Some(OverlayView::Menu { title, lines }) => render_menu(f, size, title, lines),
        Some(OverlayView::Dialog(dialog)) => render_dialog(f, size, dialog),
        None => {
            let cursor = screen.cursor();
            let column = cursor.column.min(size.width.saturating_sub(1));
            f.set_cursor(column, cursor.row);
        }
    }
}
