use std::path::Path;

use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::Span,
    widgets::Paragraph,
    Frame,
};

use crate::infrastructure::tcp::BridgeState;

const SEPARATOR: &str = " | ";

/// Bottom row: device identity plus bridge and capture state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusLine {
    pub text: String,
    /// Draw with the alert style for this frame
    pub alert: bool,
}

impl StatusLine {
    pub fn compose(
        device: &str,
        baud_rate: u32,
        menu_key: char,
        bridge: &BridgeState,
        capture: Option<&Path>,
    ) -> Self {
        let mut parts = vec![
            format!("Ctrl + {} to open menu", menu_key.to_ascii_uppercase()),
            format!("{} {}", device, baud_rate),
        ];
        if *bridge != BridgeState::Disabled {
            parts.push(bridge.to_string());
        }
        if let Some(path) = capture {
            parts.push(format!("Capture: {}", path.display()));
        }

        Self {
            text: parts.join(SEPARATOR),
            alert: false,
        }
    }

    /// Text padded (or cut) to exactly `width` columns
    pub fn padded(&self, width: usize) -> String {
        let mut text: String = self.text.chars().take(width).collect();
        let len = text.chars().count();
        text.extend(std::iter::repeat(' ').take(width - len));
        text
    }
}

pub fn render_status_line(f: &mut Frame, area: Rect, status: &StatusLine) {
    let style = if status.alert {
        Style::default().fg(Color::Black).bg(Color::Yellow)
    } else {
        Style::default().add_modifier(Modifier::REVERSED)
    };

    let text = status.padded(usize::from(area.width));
    f.render_widget(Paragraph::new(Span::styled(text, style)), area);
}
