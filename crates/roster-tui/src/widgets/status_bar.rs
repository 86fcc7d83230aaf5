//! Status bar: roster summary on the left, mode and keybindings after it.

use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};
use roster_core::view::PageView;

use crate::theme::Palette;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputMode {
    Normal,
    Target,
    SearchName,
    SearchId,
    Rename,
}

impl InputMode {
    pub fn label(self) -> &'static str {
        match self {
            Self::Normal => "NORMAL",
            Self::Target => "TARGET",
            Self::SearchName => "NAME",
            Self::SearchId => "ID",
            Self::Rename => "RENAME",
        }
    }

    fn color(self, palette: &Palette) -> Color {
        match self {
            Self::Normal => palette.secondary,
            Self::Rename => palette.accent,
            _ => palette.filter_fg,
        }
    }

    fn keys(self) -> &'static str {
        match self {
            Self::Normal => {
                " e target  Enter fetch/select  / name  # id  [ ] page  ↑↓/jk move  Tab pane  r rename  d/D forget  t theme  x dismiss  q quit"
            }
            Self::Target => " host[:port]  Enter fetch  Esc clear/close",
            Self::SearchName | Self::SearchId => " type to filter  Enter keep  Esc clear/close",
            Self::Rename => " display name  Enter save (empty clears)  Esc cancel",
        }
    }
}

/// "showing X of Y players" plus the page position.
pub fn summary(page: &PageView) -> String {
    if page.total == 0 {
        return "no players".to_string();
    }
    format!(
        "showing {} of {} players · page {}/{}",
        page.matched, page.total, page.page, page.page_count
    )
}

pub fn draw(
    frame: &mut Frame,
    area: Rect,
    mode: InputMode,
    page: &PageView,
    fetching: Option<&str>,
    palette: &Palette,
) {
    let mut spans = vec![Span::styled(
        format!(" {} ", mode.label()),
        Style::default()
            .fg(mode.color(palette))
            .add_modifier(Modifier::BOLD),
    )];

    if let Some(target) = fetching {
        spans.push(Span::styled(
            format!("fetching {}… ", target),
            Style::default().fg(palette.filter_fg),
        ));
    }
    spans.push(Span::styled(summary(page), palette.secondary()));
    spans.push(Span::styled(mode.keys(), palette.muted()));

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_counts() {
        let page = PageView {
            page: 2,
            page_count: 3,
            matched: 45,
            total: 60,
            rows: Vec::new(),
        };
        assert_eq!(summary(&page), "showing 45 of 60 players · page 2/3");
        let empty = PageView {
            page: 1,
            page_count: 0,
            matched: 0,
            total: 0,
            rows: Vec::new(),
        };
        assert_eq!(summary(&empty), "no players");
    }
}
