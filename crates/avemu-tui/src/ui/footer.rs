//! Footer bar
//!
//! Counters, key hints and the latest operator notice.

use ratatui::{
    Frame,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};
use tracing::Level;

use super::{Dashboard, truncate};

const SEPARATOR: &str = "  •  ";
const NOTICE_WIDTH: usize = 60;

/// Render the footer bar.
pub fn render(frame: &mut Frame, view: &Dashboard<'_>, area: Rect) {
    let counters = view.snapshot.counters;
    let dim = Style::default().fg(Color::DarkGray);
    let count = Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD);
    let errors = if counters.errors > 0 {
        Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)
    } else {
        dim
    };

    let mut spans = vec![
        Span::styled("Commands: ", dim),
        Span::styled(counters.commands.to_string(), count),
        Span::styled(SEPARATOR, dim),
        Span::styled("Errors: ", dim),
        Span::styled(counters.errors.to_string(), errors),
        Span::styled(SEPARATOR, dim),
        Span::styled("Connections: ", dim),
        Span::styled(counters.connections.to_string(), count),
        Span::styled(SEPARATOR, dim),
        Span::styled("[i]", Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)),
        Span::styled(" Protocol  ", dim),
        Span::styled("[Ctrl+C]", Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)),
        Span::styled(" Quit", dim),
    ];

    if let Some(notice) = view.notice {
        let color = if notice.level == Level::ERROR { Color::Red } else { Color::Yellow };
        spans.push(Span::styled(SEPARATOR, dim));
        spans.push(Span::styled(
            format!("{} {}", notice.timestamp.format("%H:%M:%S"), truncate(&notice.message, NOTICE_WIDTH)),
            Style::default().fg(color),
        ));
    }

    let block = Block::default().borders(Borders::ALL).border_style(dim);
    frame.render_widget(Paragraph::new(Line::from(spans)).block(block), area);
}
