//! Toast overlay: draws the session's live notifications.

use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Clear, Paragraph},
    Frame,
};
use roster_core::notify::{NotificationKind, NotificationQueue};
use unicode_width::UnicodeWidthStr;

use crate::theme::Palette;

const MAX_VISIBLE: usize = 4;

/// Render notifications in the top-right corner of `area`, newest on top.
pub fn draw(frame: &mut Frame, area: Rect, queue: &NotificationQueue, palette: &Palette) {
    if queue.is_empty() {
        return;
    }
    let max_width = (area.width / 2).clamp(30, 60).min(area.width);

    let mut y = area.y + 1;
    let newest: Vec<_> = queue.list().collect();
    for note in newest.iter().rev().take(MAX_VISIBLE) {
        if y >= area.y + area.height {
            break;
        }

        let (icon, color) = match note.kind {
            NotificationKind::Success => ("✓", palette.success),
            NotificationKind::Error => ("✗", palette.error),
        };
        let text = format!(
            " {} {} {} ",
            icon,
            note.created_at.format("%H:%M:%S"),
            note.message
        );
        let w = (text.width() as u16).min(max_width);
        let x = area.x + area.width.saturating_sub(w + 1);
        let toast_area = Rect {
            x,
            y,
            width: w,
            height: 1,
        };

        frame.render_widget(Clear, toast_area);
        frame.render_widget(
            Paragraph::new(Line::from(Span::styled(
                text,
                Style::default()
                    .fg(color)
                    .bg(palette.selection_bg)
                    .add_modifier(Modifier::BOLD),
            ))),
            toast_area,
        );
        y += 1;
    }
}
