//! Async runtime
//!
//! Event loop that drives terminal I/O for the console. Uses
//! `tokio::select!` over terminal events, incoming connections, operator
//! notices and a periodic tick. The listener is shared with the server
//! crate: in console mode this loop performs the accepts, and every accepted
//! client still runs as its own session task.

use std::{
    io::{self, Stdout, stdout},
    net::Ipv4Addr,
    sync::Arc,
    time::Instant,
};

use avemu_core::{COMMAND_LOG_CAPACITY, ProtocolMetadata};
use avemu_server::ConnectionAcceptor;
use crossterm::{
    ExecutableCommand,
    event::{Event, EventStream, KeyEventKind},
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use futures::StreamExt;
use ratatui::{Terminal, backend::CrosstermBackend};
use thiserror::Error;
use tokio::{sync::mpsc::UnboundedReceiver, time::MissedTickBehavior};

use crate::{
    Console, ConsoleAction, ConsoleConfig, KeyInput, Notice,
    ui::{self, Dashboard},
};

/// Console errors.
#[derive(Debug, Error)]
pub enum ConsoleError {
    /// I/O error from terminal operations.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Interactive console.
///
/// Owns the terminal (raw mode, alternate screen) for its whole lifetime and
/// restores it on drop, including when the loop exits with an error.
pub struct ConsoleRuntime {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    console: Console,
    acceptor: ConnectionAcceptor,
    notices: Option<UnboundedReceiver<Notice>>,
    port: u16,
    host_addresses: Vec<Ipv4Addr>,
    device_state: Vec<(String, String)>,
    last_notice: Option<Notice>,
}

impl ConsoleRuntime {
    /// Take over the terminal.
    pub fn new(
        acceptor: ConnectionAcceptor,
        metadata: Arc<ProtocolMetadata>,
        config: ConsoleConfig,
    ) -> Result<Self, ConsoleError> {
        let port = acceptor.local_addr().map_or(0, |addr| addr.port());

        enable_raw_mode()?;
        let terminal = restore_on_error(
            || {
                stdout().execute(EnterAlternateScreen)?;
                Terminal::new(CrosstermBackend::new(stdout()))
            },
            restore_terminal,
        )?;

        Ok(Self {
            terminal,
            console: Console::new(metadata, config),
            acceptor,
            notices: None,
            port,
            host_addresses: Vec::new(),
            device_state: Vec::new(),
            last_notice: None,
        })
    }

    /// Show warnings and errors arriving on `notices` in the footer.
    #[must_use]
    pub fn with_notices(mut self, notices: UnboundedReceiver<Notice>) -> Self {
        self.notices = Some(notices);
        self
    }

    /// Host addresses shown in the header.
    #[must_use]
    pub fn with_host_addresses(mut self, addrs: Vec<Ipv4Addr>) -> Self {
        self.host_addresses = addrs;
        self
    }

    /// Run until the operator quits.
    pub async fn run(mut self) -> Result<(), ConsoleError> {
        self.render()?;

        let mut event_stream = EventStream::new();
        let mut tick_interval = tokio::time::interval(self.console.config().tick);
        tick_interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut last_render = Instant::now();

        loop {
            let should_quit = tokio::select! {
                // Terminal events
                maybe_event = event_stream.next() => {
                    match maybe_event {
                        Some(Ok(event)) => self.handle_terminal_event(event)?,
                        Some(Err(e)) => return Err(ConsoleError::Io(e)),
                        None => true,
                    }
                }

                // New clients
                accepted = self.acceptor.accept_one() => {
                    match accepted {
                        Ok(peer) => tracing::debug!(client = %peer, "Accepted connection"),
                        Err(e) => tracing::warn!("Accept error: {e}"),
                    }
                    false
                }

                // Operator notices
                Some(notice) = next_notice(&mut self.notices) => {
                    self.last_notice = Some(notice);
                    false
                }

                // Periodic redraw
                _ = tick_interval.tick() => {
                    if last_render.elapsed() >= self.console.config().redraw {
                        self.render()?;
                        last_render = Instant::now();
                    }
                    false
                }
            };

            if should_quit {
                break;
            }
        }

        Ok(())
    }

    /// Handle a terminal event and return whether to quit.
    fn handle_terminal_event(&mut self, event: Event) -> Result<bool, ConsoleError> {
        match event {
            Event::Key(key) if key.kind == KeyEventKind::Press => {
                let Some(input) = KeyInput::from_key_event(key) else {
                    return Ok(false);
                };
                let log = self.acceptor.context().registry().snapshot_log(COMMAND_LOG_CAPACITY);
                let actions = self.console.handle_key(input, &log);
                self.process_actions(actions)
            },
            Event::Resize(_, _) => {
                self.render()?;
                Ok(false)
            },
            _ => Ok(false),
        }
    }

    /// Process actions returned by the console. Returns true if should quit.
    fn process_actions(&mut self, actions: Vec<ConsoleAction>) -> Result<bool, ConsoleError> {
        for action in actions {
            match action {
                ConsoleAction::Render => self.render()?,
                ConsoleAction::Quit => return Ok(true),
            }
        }
        Ok(false)
    }

    /// Render the UI from fresh snapshots.
    fn render(&mut self) -> Result<(), ConsoleError> {
        let ctx = self.acceptor.context();
        let snapshot = ctx.registry().snapshot();

        // A busy device model keeps the previous values on screen
        if let Some(state) = ctx.gateway().try_state() {
            self.device_state = state;
        }

        let view = Dashboard {
            console: &self.console,
            snapshot: &snapshot,
            device_state: &self.device_state,
            port: self.port,
            host_addresses: &self.host_addresses,
            notice: self.last_notice.as_ref(),
        };

        self.terminal.draw(|frame| {
            ui::render(frame, &view);
        })?;
        Ok(())
    }
}

impl Drop for ConsoleRuntime {
    fn drop(&mut self) {
        restore_terminal();
    }
}

fn restore_terminal() {
    let _ = disable_raw_mode();
    let _ = stdout().execute(LeaveAlternateScreen);
}

/// Run the rest of terminal setup, undoing raw mode if it fails. No runtime
/// exists yet at that point, so `Drop` cannot do it.
fn restore_on_error<T>(
    setup: impl FnOnce() -> io::Result<T>,
    restore: impl FnOnce(),
) -> io::Result<T> {
    let result = setup();
    if result.is_err() {
        restore();
    }
    result
}

/// Next notice, or pending forever without a notice source.
async fn next_notice(notices: &mut Option<UnboundedReceiver<Notice>>) -> Option<Notice> {
    match notices {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}
