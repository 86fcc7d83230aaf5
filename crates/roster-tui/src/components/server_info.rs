//! Server info pane: the descriptor's session metadata, pretty-printed.

use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::{Paragraph, Wrap},
    Frame,
};
use serde_json::Value;

use crate::theme::Palette;
use crate::widgets::pane_chrome::pane_chrome;

/// Multi-line rendering of the server's metadata blob.
pub fn render_info(info: &Value) -> String {
    match info {
        Value::Null => String::new(),
        other => serde_json::to_string_pretty(other).unwrap_or_else(|_| other.to_string()),
    }
}

pub fn draw(frame: &mut Frame, area: Rect, info: &str, scroll: u16, focused: bool, palette: &Palette) {
    let block = pane_chrome("server", Some('2'), focused, None, palette);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    if info.is_empty() {
        frame.render_widget(
            Paragraph::new(Span::styled("  no server metadata", palette.muted())),
            inner,
        );
        return;
    }

    let lines: Vec<Line> = info
        .lines()
        .map(|l| Line::from(Span::styled(l.to_string(), palette.secondary())))
        .collect();
    frame.render_widget(
        Paragraph::new(lines)
            .wrap(Wrap { trim: false })
            .scroll((scroll, 0)),
        inner,
    );
}
