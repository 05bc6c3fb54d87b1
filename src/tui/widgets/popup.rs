use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

use crate::tui::dialog::{Control, Dialog, INPUT_MARKER};

/// Rectangle of `width` x `height` centered in `area`, clipped to it
pub fn centered_area(width: u16, height: u16, area: Rect) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect::new(
        area.x + (area.width - width) / 2,
        area.y + (area.height - height) / 2,
        width,
        height,
    )
}

fn bordered(title: &str) -> Block<'_> {
    Block::default()
        .borders(Borders::ALL)
        .title(title)
        .border_style(Style::default().fg(Color::Yellow))
}

pub fn render_menu(f: &mut Frame, area: Rect, title: &str, lines: &[String]) {
    let inner_width = lines
        .iter()
        .map(|l| l.chars().count())
        .chain(std::iter::once(title.chars().count()))
        .max()
        .unwrap_or(0);
    let popup = centered_area(
        u16::try_from(inner_width + 2).unwrap_or(u16::MAX),
        u16::try_from(lines.len() + 2).unwrap_or(u16::MAX),
        area,
    );

    f.render_widget(Clear, popup);
    let content: Vec<Line> = lines.iter().map(|l| Line::from(l.as_str())).collect();
    f.render_widget(Paragraph::new(content).block(bordered(title)), popup);
}

pub fn render_dialog(f: &mut Frame, area: Rect, dialog: &Dialog) {
    let popup = centered_area(
        u16::try_from(dialog.width()).unwrap_or(u16::MAX),
        u16::try_from(dialog.height()).unwrap_or(u16::MAX),
        area,
    );

    let focused = Style::default().add_modifier(Modifier::BOLD);
    let content: Vec<Line> = dialog
        .controls()
        .iter()
        .enumerate()
        .map(|(index, control)| {
            let has_focus = dialog.focus() == Some(index);
            match control {
                Control::Label(text) => Line::from(text.as_str()),
                Control::Input { prompt, value, .. } => {
                    let style = if has_focus { focused } else { Style::default() };
                    Line::from(vec![
                        Span::raw(prompt.as_str()),
                        Span::raw(INPUT_MARKER),
                        Span::styled(value.as_str(), style),
                    ])
                }
                Control::Buttons { options, selected } => Line::from(
                    options
                        .iter()
                        .enumerate()
                        .map(|(i, option)| {
                            let style = if i == *selected {
                                Style::default().add_modifier(Modifier::REVERSED)
                            } else {
                                Style::default()
                            };
                            Span::styled(format!("[{}]", option), style)
                        })
                        .collect::<Vec<_>>(),
                ),
            }
        })
        .collect();

    f.render_widget(Clear, popup);
    f.render_widget(Paragraph::new(content).block(bordered("")), popup);
}
