//! Protocol information panel
//!
//! Full-screen browser over the protocol's commands with incremental search.

use avemu_core::CommandInfo;
use ratatui::{
    Frame,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};

use super::truncate;
use crate::Console;

const SYNTAX_WIDTH: usize = 20;
const DESCRIPTION_WIDTH: usize = 45;
const RULE_WIDTH: usize = 70;

/// Render the protocol information panel.
pub fn render(frame: &mut Frame, console: &Console, area: Rect) {
    let dim = Style::default().fg(Color::DarkGray);
    let key = Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD);

    let mut lines = vec![
        Line::from(vec![
            Span::styled(
                format!("Protocol: {}", console.metadata().device_name),
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            ),
            Span::raw("    "),
            Span::styled("[i/ESC]", key),
            Span::styled(" Close", dim),
        ]),
        Line::default(),
        search_bar(console),
        Line::styled("─".repeat(RULE_WIDTH), dim),
    ];

    let commands = console.filtered_commands();
    let rows = console.config().command_rows.max(1);
    let start = console.scroll_offset().min(commands.len());
    let end = (start + rows).min(commands.len());

    for (idx, command) in commands[start..end].iter().enumerate() {
        let selected = start + idx == console.selected_command();
        command_lines(&mut lines, command, selected);
    }

    if commands.is_empty() {
        lines.push(Line::styled("  No commands match", dim.add_modifier(Modifier::ITALIC)));
    } else if commands.len() > rows {
        lines.push(Line::default());
        lines.push(Line::styled(
            format!("  Showing {}-{} of {}", start + 1, end, commands.len()),
            dim,
        ));
    }

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Magenta))
        .title(" Protocol Information ");
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn search_bar(console: &Console) -> Line<'static> {
    let dim = Style::default().fg(Color::DarkGray);
    let key = Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD);

    let mut spans = if console.search_active() {
        let query = if console.search_query().is_empty() { "_" } else { console.search_query() };
        vec![
            Span::styled("Search: [", dim),
            Span::styled(
                query.to_string(),
                Style::default().fg(Color::White).bg(Color::Blue).add_modifier(Modifier::BOLD),
            ),
            Span::styled("]", dim),
        ]
    } else {
        vec![Span::styled("[/]", key), Span::styled(" Search", dim)]
    };

    spans.extend([
        Span::raw("    "),
        Span::styled("[j/k ↑↓]", key),
        Span::styled(" Navigate", dim),
        Span::raw("    "),
        Span::styled("[Enter]", key),
        Span::styled(" Details", dim),
    ]);
    Line::from(spans)
}

fn command_lines(lines: &mut Vec<Line<'static>>, command: &CommandInfo, selected: bool) {
    let dim = Style::default().fg(Color::DarkGray);
    let (marker, syntax_style, description_style) = if selected {
        (
            Span::styled("▶ ", Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)),
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
            Style::default().fg(Color::White),
        )
    } else {
        (Span::raw("  "), Style::default().fg(Color::Yellow), dim)
    };

    lines.push(Line::from(vec![
        marker,
        Span::styled(format!("{:<SYNTAX_WIDTH$}", command.syntax), syntax_style),
        Span::styled(format!(" {}", truncate(&command.description, DESCRIPTION_WIDTH)), description_style),
    ]));

    if !selected {
        return;
    }

    let response = command.response_display();
    if !response.is_empty() {
        lines.push(Line::from(vec![
            Span::styled("      Response: ", dim),
            Span::styled(response.to_string(), Style::default().fg(Color::Green)),
        ]));
    }

    for (key, value) in &command.state_changes {
        lines.push(Line::from(vec![
            Span::styled("      Sets: ", dim),
            Span::styled(key.clone(), Style::default().fg(Color::Cyan)),
            Span::styled(" = ", dim),
            Span::styled(value.clone(), Style::default().fg(Color::Magenta)),
        ]));
    }
}
