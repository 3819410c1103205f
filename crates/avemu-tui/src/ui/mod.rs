//! UI rendering
//!
//! Rendering functions that project console state plus registry snapshots
//! onto the terminal using ratatui widgets. All functions are pure (no I/O,
//! no locks): the runtime gathers every input into a [`Dashboard`] first.

mod clients;
mod detail;
mod device;
mod footer;
mod header;
mod info;
mod log;

use std::net::Ipv4Addr;

use avemu_core::RegistrySnapshot;
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
};

use crate::{Console, Notice};

/// Everything one frame shows.
#[derive(Debug, Clone, Copy)]
pub struct Dashboard<'a> {
    /// View state.
    pub console: &'a Console,
    /// Sessions, log and counters.
    pub snapshot: &'a RegistrySnapshot,
    /// Last known device state.
    pub device_state: &'a [(String, String)],
    /// Port the server listens on.
    pub port: u16,
    /// Addresses clients can reach the host on.
    pub host_addresses: &'a [Ipv4Addr],
    /// Most recent operator warning.
    pub notice: Option<&'a Notice>,
}

/// Render the entire UI.
///
/// The detail popup takes the whole screen, then the info panel, otherwise
/// the dashboard.
pub fn render(frame: &mut Frame, view: &Dashboard<'_>) {
    let area = frame.area();

    if let Some(popup) = view.console.popup() {
        detail::render(frame, popup, area);
    } else if view.console.info_visible() {
        info::render(frame, view.console, area);
    } else {
        render_dashboard(frame, view, area);
    }
}

fn render_dashboard(frame: &mut Frame, view: &Dashboard<'_>, area: Rect) {
    const HEADER_HEIGHT: u16 = 3;
    const FOOTER_HEIGHT: u16 = 3;
    const MAIN_AREA_MIN_HEIGHT: u16 = 5;

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(HEADER_HEIGHT),
            Constraint::Min(MAIN_AREA_MIN_HEIGHT),
            Constraint::Length(FOOTER_HEIGHT),
        ])
        .split(area);

    let [header_area, main_area, footer_area] = chunks.as_ref() else {
        return;
    };

    header::render(frame, view, *header_area);
    render_main_area(frame, view, *main_area);
    footer::render(frame, view, *footer_area);
}

/// Render the main area (clients and device state beside the command log).
fn render_main_area(frame: &mut Frame, view: &Dashboard<'_>, area: Rect) {
    const DEVICE_MIN_HEIGHT: u16 = 3;

    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Ratio(1, 3), Constraint::Ratio(2, 3)])
        .split(area);

    let [left_area, log_area] = chunks.as_ref() else {
        return;
    };

    let left = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(clients::HEIGHT), Constraint::Min(DEVICE_MIN_HEIGHT)])
        .split(*left_area);

    let [clients_area, device_area] = left.as_ref() else {
        return;
    };

    clients::render(frame, &view.snapshot.sessions, *clients_area);
    device::render(frame, view.device_state, *device_area);
    log::render(frame, view, *log_area);
}

/// Cut `text` to `max` characters, marking the cut with `..`.
fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(max.saturating_sub(2)).collect();
    cut.push_str("..");
    cut
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::{net::SocketAddr, sync::Arc};

    use avemu_core::{
        ArgInfo, CommandInfo, CommandLogEntry, Counters, ProtocolMetadata, SessionId,
    };
    use chrono::Local;
    use ratatui::{Terminal, backend::TestBackend};

    use super::*;
    use crate::{ConsoleConfig, KeyInput};

    fn metadata() -> Arc<ProtocolMetadata> {
        let mut volume = CommandInfo::new("volume_set", "!VOL({volume})").with_description("Set level");
        volume.args.push(ArgInfo {
            name: "volume".to_string(),
            kind: "int".to_string(),
            min: Some(-999),
            max: Some(120),
            default: None,
        });
        volume.state_changes.push(("volume".to_string(), "{volume}".to_string()));
        volume.response_template = "!VOL({volume})".to_string();

        Arc::new(ProtocolMetadata {
            id: "lyngdorf/cd2".to_string(),
            device_name: "Lyngdorf CD-2".to_string(),
            default_port: Some(84),
            eol: "\r".to_string(),
            commands: vec![
                CommandInfo::new("power_on", "!ON").with_description("Wake up"),
                volume,
            ],
        })
    }

    fn entry(port: u16, command: &str, response: &str, is_error: bool) -> CommandLogEntry {
        let peer: SocketAddr = format!("10.0.0.7:{port}").parse().unwrap();
        CommandLogEntry {
            timestamp: Local::now(),
            session: SessionId::new(peer),
            command: command.to_string(),
            response: response.to_string(),
            is_error,
        }
    }

    fn snapshot() -> RegistrySnapshot {
        let sessions = (0..12u16)
            .map(|i| SessionId::new(format!("10.0.0.7:{}", 50000 + i).parse().unwrap()))
            .collect();
        RegistrySnapshot {
            sessions,
            log: vec![
                entry(50000, "!ON", "!ON", false),
                entry(50001, "!BADCMD", "ERROR: unknown command !BADCMD", true),
            ],
            counters: Counters { commands: 2, connections: 12, errors: 1 },
        }
    }

    fn draw(console: &Console, snapshot: &RegistrySnapshot) -> String {
        let state = vec![("power".to_string(), "on".to_string())];
        let hosts = [Ipv4Addr::new(192, 168, 1, 20)];
        let view = Dashboard {
            console,
            snapshot,
            device_state: &state,
            port: 84,
            host_addresses: &hosts,
            notice: None,
        };

        let mut terminal = Terminal::new(TestBackend::new(120, 40)).unwrap();
        terminal.draw(|frame| render(frame, &view)).unwrap();

        let buffer = terminal.backend().buffer();
        let width = buffer.area.width as usize;
        let symbols: Vec<&str> = buffer.content.iter().map(|cell| cell.symbol()).collect();
        symbols.chunks(width).map(|row| row.concat()).collect::<Vec<_>>().join("\n")
    }

    #[test]
    fn dashboard_shows_every_panel() {
        let console = Console::new(metadata(), ConsoleConfig::default());
        let screen = draw(&console, &snapshot());

        assert!(screen.contains("Lyngdorf CD-2"));
        assert!(screen.contains("port 84"));
        assert!(screen.contains("192.168.1.20"));
        assert!(screen.contains("Clients (12)"));
        assert!(screen.contains("... and 2 more"));
        assert!(screen.contains("power"));
        assert!(screen.contains("!BADCMD"));
        assert!(screen.contains("Commands: 2"));
        assert!(screen.contains("Errors: 1"));
    }

    #[test]
    fn selected_log_entry_is_marked() {
        let mut console = Console::new(metadata(), ConsoleConfig::default());
        let snapshot = snapshot();
        console.handle_key(KeyInput::Up, &snapshot.log);

        let screen = draw(&console, &snapshot);
        let marked = screen.lines().find(|line| line.contains('▶')).unwrap();
        assert!(marked.contains("!BADCMD"));
    }

    #[test]
    fn info_panel_lists_commands() {
        let mut console = Console::new(metadata(), ConsoleConfig::default());
        console.handle_key(KeyInput::Char('i'), &[]);
        console.handle_key(KeyInput::Down, &[]);

        let screen = draw(&console, &snapshot());
        assert!(screen.contains("Protocol: Lyngdorf CD-2"));
        assert!(screen.contains("!ON"));
        assert!(screen.contains("Response: !VOL({volume})"));
        assert!(screen.contains("Sets: volume = {volume}"));
    }

    #[test]
    fn command_popup_shows_arguments() {
        let mut console = Console::new(metadata(), ConsoleConfig::default());
        for key in [KeyInput::Char('i'), KeyInput::Down, KeyInput::Enter] {
            console.handle_key(key, &[]);
        }

        let screen = draw(&console, &snapshot());
        assert!(screen.contains("volume_set"));
        assert!(screen.contains("Range: -999 - 120"));
        assert!(screen.contains("Type: int"));
    }

    #[test]
    fn error_popup_shows_status_and_wrapped_response() {
        let mut console = Console::new(metadata(), ConsoleConfig::default());
        let mut snapshot = snapshot();
        let long = format!("ERROR: unknown command {}", "X".repeat(80));
        snapshot.log.push(entry(50002, "!VOLL(5)", &long, true));

        console.handle_key(KeyInput::Up, &snapshot.log);
        console.handle_key(KeyInput::Enter, &snapshot.log);

        let screen = draw(&console, &snapshot);
        assert!(screen.contains("Status:   ERROR"));
        assert!(screen.contains("↳"));
        assert!(screen.contains("Similar valid commands:"));
        assert!(screen.contains("!VOL({volume})"));
    }

    #[test]
    fn truncate_marks_cut() {
        assert_eq!(truncate("!ON", 25), "!ON");
        assert_eq!(truncate(&"A".repeat(30), 25), format!("{}..", "A".repeat(23)));
    }
}
