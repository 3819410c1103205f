//! Device state panel

use ratatui::{
    Frame,
    layout::{Constraint, Rect},
    style::{Color, Modifier, Style},
    text::Span,
    widgets::{Block, Borders, Paragraph, Row, Table},
};

/// Tracked values shown at most.
const MAX_ENTRIES: usize = 12;

/// Render the device state panel.
pub fn render(frame: &mut Frame, state: &[(String, String)], area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Green))
        .title(" Device State ");

    if state.is_empty() {
        let empty = Span::styled(
            "No state tracked",
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
        );
        frame.render_widget(Paragraph::new(empty).block(block), area);
        return;
    }

    let rows: Vec<Row> = state
        .iter()
        .take(MAX_ENTRIES)
        .map(|(key, value)| {
            let value_style = match value.as_str() {
                "on" | "true" => Style::default().fg(Color::Green),
                "off" | "false" => Style::default().fg(Color::Red),
                _ => Style::default().fg(Color::White),
            };
            Row::new(vec![
                Span::styled(key.as_str(), Style::default().fg(Color::Cyan)),
                Span::styled(value.as_str(), value_style),
            ])
        })
        .collect();

    let table = Table::new(rows, [Constraint::Percentage(50), Constraint::Percentage(50)]).block(block);
    frame.render_widget(table, area);
}
