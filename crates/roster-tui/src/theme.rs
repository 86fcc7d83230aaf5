//! Color palettes for the roster TUI.
//!
//! Two fixed palettes, picked at runtime from the persisted `Theme`.

use ratatui::style::{Color, Modifier, Style};
use roster_core::prefs::Theme;

#[derive(Debug, Clone, Copy)]
pub struct Palette {
    pub bg: Color,
    pub primary: Color,
    pub secondary: Color,
    pub muted: Color,
    pub accent: Color,
    pub border: Color,
    pub border_focused: Color,
    pub number_hint: Color,
    pub selection_bg: Color,
    pub filter_bg: Color,
    pub filter_fg: Color,
    pub success: Color,
    pub error: Color,
    pub ping_good: Color,
    pub ping_fair: Color,
    pub ping_poor: Color,
}

// ── Palettes ──────────────────────────────────────────────────────────────────

const DARK: Palette = Palette {
    bg: Color::Rgb(18, 18, 18),
    primary: Color::Rgb(210, 210, 225),
    secondary: Color::Rgb(115, 115, 138),
    muted: Color::Rgb(72, 72, 88),
    accent: Color::Rgb(255, 95, 95),
    border: Color::Rgb(40, 40, 52),
    border_focused: Color::Rgb(120, 100, 200),
    number_hint: Color::Rgb(90, 90, 115),
    selection_bg: Color::Rgb(28, 28, 40),
    filter_bg: Color::Rgb(20, 20, 32),
    filter_fg: Color::Rgb(255, 200, 80),
    success: Color::Rgb(80, 200, 120),
    error: Color::Rgb(255, 95, 95),
    ping_good: Color::Rgb(80, 200, 120),
    ping_fair: Color::Rgb(255, 184, 80),
    ping_poor: Color::Rgb(255, 80, 80),
};

const LIGHT: Palette = Palette {
    bg: Color::Rgb(246, 246, 240),
    primary: Color::Rgb(30, 30, 40),
    secondary: Color::Rgb(90, 90, 110),
    muted: Color::Rgb(150, 150, 160),
    accent: Color::Rgb(200, 40, 60),
    border: Color::Rgb(200, 200, 210),
    border_focused: Color::Rgb(100, 70, 190),
    number_hint: Color::Rgb(130, 130, 150),
    selection_bg: Color::Rgb(225, 222, 240),
    filter_bg: Color::Rgb(236, 234, 222),
    filter_fg: Color::Rgb(150, 90, 0),
    success: Color::Rgb(20, 140, 70),
    error: Color::Rgb(200, 40, 40),
    ping_good: Color::Rgb(20, 140, 70),
    ping_fair: Color::Rgb(180, 110, 0),
    ping_poor: Color::Rgb(200, 40, 40),
};

impl Palette {
    pub fn for_theme(theme: Theme) -> Self {
        match theme {
            Theme::Dark => DARK,
            Theme::Light => LIGHT,
        }
    }

    // ── Predefined styles ─────────────────────────────────────────────────────

    pub fn base(&self) -> Style {
        Style::default().fg(self.primary).bg(self.bg)
    }

    pub fn secondary(&self) -> Style {
        Style::default().fg(self.secondary)
    }

    pub fn muted(&self) -> Style {
        Style::default().fg(self.muted)
    }

    pub fn accent(&self) -> Style {
        Style::default().fg(self.accent)
    }

    pub fn selected(&self) -> Style {
        Style::default()
            .bg(self.selection_bg)
            .fg(self.primary)
            .add_modifier(Modifier::BOLD)
    }

    pub fn border(&self, focused: bool) -> Style {
        if focused {
            Style::default().fg(self.border_focused)
        } else {
            Style::default().fg(self.border)
        }
    }

    /// Round-trip time coloring: under 80ms good, under 150ms fair.
    pub fn ping(&self, ping: u32) -> Style {
        let color = match ping {
            0..=79 => self.ping_good,
            80..=149 => self.ping_fair,
            _ => self.ping_poor,
        };
        Style::default().fg(color)
    }
}
