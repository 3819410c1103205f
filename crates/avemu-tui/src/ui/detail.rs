//! Detail popup
//!
//! Full description of one protocol command or one logged exchange.

use avemu_core::{CommandInfo, CommandLogEntry};
use ratatui::{
    Frame,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};

use crate::DetailPopup;

/// Characters per line before a value wraps.
const WRAP_WIDTH: usize = 60;
const CONTINUATION_MARKER: &str = "↳ ";

/// Render the detail popup.
pub fn render(frame: &mut Frame, popup: &DetailPopup, area: Rect) {
    let mut lines = match popup {
        DetailPopup::Command(command) => command_lines(command),
        DetailPopup::LogEntry { entry, suggestions } => entry_lines(entry, suggestions),
    };

    lines.push(Line::default());
    lines.push(Line::styled("[ESC] Close", Style::default().fg(Color::DarkGray)));

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(" Details ");
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn command_lines(command: &CommandInfo) -> Vec<Line<'static>> {
    let dim = Style::default().fg(Color::DarkGray);
    let bold = Style::default().add_modifier(Modifier::BOLD);

    let mut lines = vec![
        Line::from(vec![
            Span::styled(
                command.name.clone(),
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            ),
            Span::styled(" - Command Details", dim),
        ]),
        Line::styled("─".repeat(WRAP_WIDTH), dim),
    ];

    if !command.description.is_empty() {
        lines.push(Line::raw(format!("Description: {}", command.description)));
        lines.push(Line::default());
    }

    lines.push(Line::styled("Syntax:", bold));
    if !command.syntax.is_empty() {
        lines.push(Line::from(vec![
            Span::styled("  Send: ", dim),
            Span::styled(
                command.syntax.clone(),
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
            ),
        ]));
    }

    if !command.args.is_empty() {
        lines.push(Line::default());
        lines.push(Line::styled("Arguments:", bold));
        for arg in &command.args {
            let mut spans = vec![Span::styled(
                format!("  {}", arg.name),
                Style::default().fg(Color::Magenta).add_modifier(Modifier::BOLD),
            )];
            if let (Some(min), Some(max)) = (arg.min, arg.max) {
                spans.push(Span::styled(format!("  Range: {min} - {max}"), dim));
            }
            if !arg.kind.is_empty() {
                spans.push(Span::styled(format!("  Type: {}", arg.kind), dim));
            }
            if let Some(default) = &arg.default {
                spans.push(Span::styled(
                    format!("  Default: {default}"),
                    Style::default().fg(Color::Green),
                ));
            }
            lines.push(Line::from(spans));
        }
    }

    if !command.state_changes.is_empty() {
        lines.push(Line::default());
        lines.push(Line::styled("State Changes:", bold));
        for (key, value) in &command.state_changes {
            lines.push(Line::from(vec![
                Span::styled(format!("  {key}"), Style::default().fg(Color::Cyan)),
                Span::styled(" → ", dim),
                Span::styled(value.clone(), Style::default().fg(Color::Green)),
            ]));
        }
    }

    if !command.response_template.is_empty() || !command.response_pattern.is_empty() {
        lines.push(Line::default());
        lines.push(Line::styled("Response:", bold));
        if !command.response_template.is_empty() {
            lines.push(Line::from(vec![
                Span::styled("  Template: ", dim),
                Span::styled(command.response_template.clone(), Style::default().fg(Color::Green)),
            ]));
        }
        if !command.response_pattern.is_empty() {
            lines.push(Line::from(vec![
                Span::styled("  Pattern: ", dim),
                Span::styled(command.response_pattern.clone(), Style::default().fg(Color::Green)),
            ]));
        }
    }

    lines
}

fn entry_lines(entry: &CommandLogEntry, suggestions: &[String]) -> Vec<Line<'static>> {
    let dim = Style::default().fg(Color::DarkGray);

    let mut lines = vec![
        Line::from(vec![
            Span::styled(
                "Command Detail",
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            ),
            Span::raw("                    "),
            Span::styled("[ESC]", Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)),
            Span::styled(" Close", dim),
        ]),
        Line::styled("─".repeat(50), dim),
        Line::styled(format!("Time:     {}", entry.timestamp.format("%H:%M:%S")), dim),
        Line::styled(
            format!("Client:   {} ({})", entry.session.port(), entry.session.ip()),
            Style::default().fg(Color::Cyan),
        ),
    ];

    lines.extend(wrap_value("Command:  ", &entry.command, Style::default().fg(Color::Yellow)));

    let response_style = if entry.is_error {
        Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::Green)
    };
    lines.extend(wrap_value("Response: ", &entry.response, response_style));
    lines.push(Line::default());

    if entry.is_error {
        lines.push(Line::styled("Status:   ERROR", response_style));
        if !suggestions.is_empty() {
            lines.push(Line::default());
            lines.push(Line::styled("Similar valid commands:", Style::default().add_modifier(Modifier::BOLD)));
            for suggestion in suggestions {
                lines.push(Line::styled(format!("  • {suggestion}"), Style::default().fg(Color::Green)));
            }
        }
    } else {
        lines.push(Line::styled(
            "Status:   OK",
            Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
        ));
    }

    lines
}

/// Label plus value, continuing long values on indented lines.
fn wrap_value(label: &str, value: &str, style: Style) -> Vec<Line<'static>> {
    let chars: Vec<char> = value.chars().collect();
    let mut chunks = chars.chunks(WRAP_WIDTH).map(|chunk| chunk.iter().collect::<String>());
    let dim = Style::default().fg(Color::DarkGray);

    let first = chunks.next().unwrap_or_default();
    let mut lines =
        vec![Line::from(vec![Span::styled(label.to_string(), dim), Span::styled(first, style)])];

    let indent = " ".repeat(label.chars().count());
    for chunk in chunks {
        lines.push(Line::from(vec![
            Span::styled(format!("{indent}{CONTINUATION_MARKER}"), dim),
            Span::styled(chunk, style),
        ]));
    }
    lines
}
