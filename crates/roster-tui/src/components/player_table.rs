//! Player table: the current page of the filtered roster.

use ratatui::{
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::{List, ListItem, ListState, Paragraph},
    Frame,
};
use roster_core::model::EnrichedPlayer;
use roster_core::view::PageView;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::theme::Palette;
use crate::widgets::pane_chrome::{pane_chrome, Badge};

const ID_W: usize = 5;
const PING_W: usize = 6;

/// Fit `text` into exactly `width` terminal columns, cutting with "…".
pub fn fit(text: &str, width: usize) -> String {
    if text.width() <= width {
        let pad = width - text.width();
        return format!("{}{}", text, " ".repeat(pad));
    }
    if width == 0 {
        return String::new();
    }
    let mut out = String::new();
    let mut used = 0;
    for c in text.chars() {
        let w = c.width().unwrap_or(0);
        if used + w > width - 1 {
            break;
        }
        out.push(c);
        used += w;
    }
    out.push('…');
    used += 1;
    out.push_str(&" ".repeat(width.saturating_sub(used)));
    out
}

/// `●` avatar resolved, `○` lookup pending, blank when there is nothing to look up.
fn avatar_marker(player: &EnrichedPlayer) -> &'static str {
    match (&player.avatar_ref, &player.external_id) {
        (Some(_), _) => "●",
        (None, Some(_)) => "○",
        (None, None) => " ",
    }
}

fn render_row<'a>(
    player: &EnrichedPlayer,
    name_w: usize,
    is_cursor: bool,
    is_selected: bool,
    palette: &Palette,
) -> ListItem<'a> {
    let row_style = if is_cursor {
        palette.selected()
    } else {
        Style::default().fg(palette.primary)
    };
    let marker_style = if player.avatar_ref.is_some() {
        Style::default().fg(palette.success)
    } else {
        palette.muted()
    };
    let pin = if is_selected { "▶" } else { " " };

    ListItem::new(Line::from(vec![
        Span::styled(pin, palette.accent()),
        Span::styled(avatar_marker(player), marker_style),
        Span::styled(format!(" {:>w$} ", player.id(), w = ID_W), palette.secondary()),
        Span::styled(fit(player.name(), name_w), row_style),
        Span::styled(
            format!("{:>w$}", format!("{}ms", player.player.ping), w = PING_W),
            palette.ping(player.player.ping),
        ),
    ]))
    .style(row_style)
}

pub fn draw(
    frame: &mut Frame,
    area: Rect,
    page: &PageView,
    cursor: usize,
    selected: Option<u32>,
    focused: bool,
    palette: &Palette,
) {
    let badge = (page.page_count > 1).then(|| Badge {
        text: format!("{}/{}", page.page, page.page_count),
        color: palette.secondary,
    });
    let block = pane_chrome("players", Some('3'), focused, badge, palette);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    if page.is_empty() {
        let msg = if page.total == 0 {
            "  no roster loaded"
        } else {
            "  no players match the search"
        };
        frame.render_widget(Paragraph::new(Span::styled(msg, palette.muted())), inner);
        return;
    }

    // pin + marker + " id " + ping
    let fixed = 2 + ID_W + 2 + PING_W;
    let name_w = (inner.width as usize).saturating_sub(fixed).max(4);

    let items: Vec<ListItem> = page
        .rows
        .iter()
        .enumerate()
        .map(|(i, p)| render_row(p, name_w, focused && i == cursor, selected == Some(p.id()), palette))
        .collect();

    let mut state = ListState::default();
    state.select(Some(cursor.min(page.rows.len() - 1)));
    let list = List::new(items)
        .highlight_style(Style::default())
        .highlight_symbol("");
    frame.render_stateful_widget(list, inner, &mut state);
}
