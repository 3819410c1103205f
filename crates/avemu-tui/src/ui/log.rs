//! Command log panel
//!
//! Shows the newest exchanges. When a selection scrolls past the visible
//! rows the window follows it.

use avemu_core::CommandLogEntry;
use ratatui::{
    Frame,
    layout::{Constraint, Rect},
    style::{Color, Modifier, Style},
    text::Span,
    widgets::{Block, Borders, Row, Table},
};

use super::{Dashboard, truncate};

const COMMAND_WIDTH: usize = 25;
const SELECTED_MARKER: &str = "▶ ";

/// Render the command log panel.
pub fn render(frame: &mut Frame, view: &Dashboard<'_>, area: Rect) {
    let log = &view.snapshot.log;
    let selected = view.console.selected_log().filter(|&idx| idx < log.len());
    let window = visible_window(log.len(), view.console.config().log_rows, selected);

    let mut rows: Vec<Row> = Vec::with_capacity(window.len());
    for (pos, entry) in log[window.clone()].iter().enumerate() {
        let from_newest = log.len() - 1 - (window.start + pos);
        rows.push(entry_row(entry, selected == Some(from_newest)));
    }

    if rows.is_empty() {
        rows.push(Row::new(vec![
            Span::raw(""),
            Span::raw(""),
            Span::styled(
                "Waiting for commands...",
                Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
            ),
        ]));
    }

    let hint = if selected.is_some() { "[↑↓] Navigate  [Enter] Details" } else { "[↑↓] Select" };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow))
        .title(format!(" Command Log {hint} "));

    let header = Row::new(vec!["Time", "Client", "Command", "→", "Response"])
        .style(Style::default().add_modifier(Modifier::BOLD));

    let widths = [
        Constraint::Length(10),
        Constraint::Length(8),
        Constraint::Length(COMMAND_WIDTH as u16),
        Constraint::Length(1),
        Constraint::Min(COMMAND_WIDTH as u16),
    ];

    frame.render_widget(Table::new(rows, widths).header(header).block(block), area);
}

fn entry_row(entry: &CommandLogEntry, selected: bool) -> Row<'static> {
    let time = if selected {
        format!("{SELECTED_MARKER}{}", entry.timestamp.format("%M:%S"))
    } else {
        entry.timestamp.format("%H:%M:%S").to_string()
    };

    let response_style = if entry.is_error {
        Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::Green)
    };

    let row = Row::new(vec![
        Span::styled(time, Style::default().fg(Color::DarkGray)),
        Span::styled(entry.session.port().to_string(), Style::default().fg(Color::Cyan)),
        Span::styled(truncate(&entry.command, COMMAND_WIDTH), Style::default().fg(Color::Yellow)),
        Span::styled("→", Style::default().fg(Color::DarkGray)),
        Span::styled(truncate(&entry.response, COMMAND_WIDTH), response_style),
    ]);

    match (selected, entry.is_error) {
        (false, _) => row,
        (true, true) => row.style(Style::default().bg(Color::Red)),
        (true, false) => row.style(Style::default().bg(Color::Blue)),
    }
}

/// Index range of the log (oldest first) to show, given a selection counted
/// back from the newest entry.
fn visible_window(len: usize, rows: usize, selected: Option<usize>) -> std::ops::Range<usize> {
    let rows = rows.max(1);
    let newer_hidden = selected.map_or(0, |idx| (idx + 1).saturating_sub(rows));
    let end = len.saturating_sub(newer_hidden);
    end.saturating_sub(rows)..end
}
