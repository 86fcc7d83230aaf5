//! History pane: recently fetched servers, most recent first.

use chrono::Local;
use ratatui::{
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::{List, ListItem, ListState, Paragraph},
    Frame,
};
use roster_core::history::HistoryEntry;

use crate::theme::Palette;
use crate::widgets::pane_chrome::pane_chrome;

pub fn draw(
    frame: &mut Frame,
    area: Rect,
    entries: &[HistoryEntry],
    cursor: usize,
    focused: bool,
    palette: &Palette,
) {
    let block = pane_chrome("history", Some('1'), focused, None, palette);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    if entries.is_empty() {
        frame.render_widget(
            Paragraph::new(Span::styled("  nothing fetched yet", palette.muted())),
            inner,
        );
        return;
    }

    let items: Vec<ListItem> = entries
        .iter()
        .enumerate()
        .map(|(i, entry)| {
            let style = if focused && i == cursor {
                palette.selected()
            } else {
                Style::default().fg(palette.primary)
            };
            let mut spans = vec![Span::styled(format!(" {}", entry.display_name()), style)];
            if entry.custom_name.is_some() {
                spans.push(Span::styled(format!("  {}", entry.address), palette.muted()));
            }
            spans.push(Span::styled(
                format!(
                    "  {}",
                    entry.last_used_at.with_timezone(&Local).format("%m-%d %H:%M")
                ),
                palette.muted(),
            ));
            ListItem::new(Line::from(spans)).style(style)
        })
        .collect();

    let mut state = ListState::default();
    state.select(Some(cursor.min(entries.len() - 1)));
    frame.render_stateful_widget(List::new(items), inner, &mut state);
}
