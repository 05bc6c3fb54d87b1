use ratatui::{layout::Rect, text::Line, widgets::Paragraph, Frame};

use crate::core::screen::ScreenBuffer;

/// Draw the scroll region rows at their screen positions
pub fn render_screen(f: &mut Frame, screen: &ScreenBuffer) {
    let region = screen.region();
    let area = Rect::new(region.left, region.top, region.width, region.height()).intersection(f.size());
    if area.area() == 0 {
        return;
    }

    let lines: Vec<Line> = screen.lines().map(Line::from).collect();
    f.render_widget(Paragraph::new(lines), area);
}
