//! FilterInput: one-line tui-input editor used for the target, the two
//! search boxes and history renames.

use ratatui::crossterm::event::{Event, KeyCode, KeyEvent};
use ratatui::{
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};
use tui_input::{backend::crossterm::EventHandler, Input};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::theme::Palette;

pub enum FilterAction {
    Changed(String),
    Confirmed,
    Cancelled,
    None,
}

/// The tail of `text` left after scrolling `columns` terminal columns off the
/// left edge. A wide character cut by the edge is dropped entirely.
fn skip_columns(text: &str, columns: usize) -> &str {
    let mut used = 0;
    for (i, c) in text.char_indices() {
        if used >= columns {
            return &text[i..];
        }
        used += c.width().unwrap_or(0);
    }
    ""
}

pub struct FilterInput {
    input: Input,
    active: bool,
    prompt: &'static str,
    placeholder: String,
}

impl FilterInput {
    pub fn new(prompt: &'static str, placeholder: impl Into<String>) -> Self {
        Self {
            input: Input::default(),
            active: false,
            prompt,
            placeholder: placeholder.into(),
        }
    }

    pub fn activate(&mut self) {
        self.active = true;
    }

    pub fn deactivate(&mut self) {
        self.active = false;
    }

    pub fn set_value(&mut self, value: &str) {
        self.input = Input::new(value.to_string());
    }

    pub fn text(&self) -> &str {
        self.input.value()
    }

    /// Handle a key event. Returns what happened.
    ///
    /// Esc clears a non-empty input first; a second Esc closes it.
    pub fn handle_key(&mut self, key: KeyEvent) -> FilterAction {
        match key.code {
            KeyCode::Esc => {
                if !self.input.value().is_empty() {
                    self.input = Input::default();
                    FilterAction::Changed(String::new())
                } else {
                    self.deactivate();
                    FilterAction::Cancelled
                }
            }
            KeyCode::Enter => {
                self.deactivate();
                FilterAction::Confirmed
            }
            _ => {
                let before = self.input.value().to_string();
                self.input.handle_event(&Event::Key(key));
                if self.input.value() != before {
                    FilterAction::Changed(self.input.value().to_string())
                } else {
                    FilterAction::None
                }
            }
        }
    }

    pub fn draw(&self, frame: &mut Frame, area: Rect, palette: &Palette) {
        let lead = self.prompt.width() + 1;
        let scroll = self
            .input
            .visual_scroll(area.width.saturating_sub(lead as u16 + 1) as usize);
        let value = self.input.value();
        let display = if value.is_empty() {
            Span::styled(
                format!("{} {}", self.prompt, self.placeholder),
                Style::default().fg(palette.muted),
            )
        } else {
            let visible = skip_columns(value, scroll);
            let fg = if self.active {
                palette.filter_fg
            } else {
                palette.primary
            };
            Span::styled(format!("{} {}", self.prompt, visible), Style::default().fg(fg))
        };

        let paragraph =
            Paragraph::new(Line::from(vec![display])).style(Style::default().bg(palette.filter_bg));
        frame.render_widget(paragraph, area);

        if self.active && area.width > 0 {
            let cursor_x = area.x + (lead + self.input.visual_cursor() - scroll) as u16;
            frame.set_cursor_position((cursor_x.min(area.x + area.width - 1), area.y));
        }
    }
}
