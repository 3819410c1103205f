//! Connected clients panel

use avemu_core::SessionId;
use ratatui::{
    Frame,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem},
};

/// Clients listed before the rest are summarized.
const MAX_LISTED: usize = 10;

/// Rows needed to show every listed client, the summary line and borders.
pub const HEIGHT: u16 = MAX_LISTED as u16 + 3;

/// Render the connected clients panel.
pub fn render(frame: &mut Frame, sessions: &[SessionId], area: Rect) {
    let dim = Style::default().fg(Color::DarkGray);

    let mut items: Vec<ListItem> = sessions
        .iter()
        .take(MAX_LISTED)
        .map(|session| {
            ListItem::new(Line::from(vec![
                Span::styled("● ", Style::default().fg(Color::Green)),
                Span::styled(
                    session.port().to_string(),
                    Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
                ),
                Span::styled(format!(" ({})", session.ip()), dim),
            ]))
        })
        .collect();

    if sessions.len() > MAX_LISTED {
        items.push(ListItem::new(Span::styled(
            format!("... and {} more", sessions.len() - MAX_LISTED),
            dim,
        )));
    }

    if items.is_empty() {
        items.push(ListItem::new(Span::styled(
            "No clients connected",
            dim.add_modifier(Modifier::ITALIC),
        )));
    }

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Blue))
        .title(format!(" Clients ({}) ", sessions.len()));
    frame.render_widget(List::new(items).block(block), area);
}
