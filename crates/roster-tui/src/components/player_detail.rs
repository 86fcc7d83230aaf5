//! Detail pane for the selected player.

use ratatui::{
    layout::Rect,
    style::Modifier,
    text::{Line, Span},
    widgets::{Paragraph, Wrap},
    Frame,
};
use roster_core::model::EnrichedPlayer;

use crate::theme::Palette;
use crate::widgets::pane_chrome::pane_chrome;

fn field<'a>(label: &'a str, value: String, palette: &Palette) -> Line<'a> {
    Line::from(vec![
        Span::styled(format!("{:<10}", label), palette.muted()),
        Span::styled(value, palette.secondary()),
    ])
}

pub fn draw(frame: &mut Frame, area: Rect, player: Option<&EnrichedPlayer>, palette: &Palette) {
    let block = pane_chrome("player", None, false, None, palette);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let Some(player) = player else {
        frame.render_widget(
            Paragraph::new(Span::styled("  Enter on a row to inspect it", palette.muted())),
            inner,
        );
        return;
    };

    let avatar = match (&player.avatar_ref, &player.external_id) {
        (Some(url), _) => url.clone(),
        (None, Some(_)) => "resolving…".to_string(),
        (None, None) => "-".to_string(),
    };

    let lines = vec![
        Line::from(Span::styled(
            player.name().to_string(),
            palette.accent().add_modifier(Modifier::BOLD),
        )),
        field("id", player.id().to_string(), palette),
        field("ping", format!("{}ms", player.player.ping), palette),
        field("endpoint", player.player.endpoint.clone(), palette),
        field(
            "discord",
            player.external_id.clone().unwrap_or_else(|| "-".to_string()),
            palette,
        ),
        field("avatar", avatar, palette),
    ];
    frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: true }), inner);
}
