//! Header bar
//!
//! Device name, listening port and the addresses clients can use.

use ratatui::{
    Frame,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};

use super::Dashboard;

const SEPARATOR: &str = "  •  ";

/// Render the header bar.
pub fn render(frame: &mut Frame, view: &Dashboard<'_>, area: Rect) {
    let dim = Style::default().fg(Color::DarkGray);

    let mut spans = vec![
        Span::styled("AVEmu", Style::default().fg(Color::Magenta).add_modifier(Modifier::BOLD)),
        Span::styled(
            format!(" - {}", view.console.metadata().device_name),
            Style::default().fg(Color::Cyan),
        ),
        Span::styled(SEPARATOR, dim),
        Span::styled(format!("port {}", view.port), Style::default().fg(Color::Green)),
    ];

    if !view.host_addresses.is_empty() {
        let addrs: Vec<String> = view.host_addresses.iter().map(ToString::to_string).collect();
        spans.push(Span::styled(format!(" ({})", addrs.join(", ")), dim));
    }

    spans.push(Span::raw("  "));
    spans.push(Span::styled("[i]", Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)));
    spans.push(Span::styled(" Info", dim));

    let block = Block::default().borders(Borders::ALL).border_style(Style::default().fg(Color::Blue));
    frame.render_widget(Paragraph::new(Line::from(spans)).block(block), area);
}
