//! Console state types
//!
//! Tuning knobs and the pinned content of the detail popup.

use std::time::Duration;

use avemu_core::{CommandInfo, CommandLogEntry};

/// Loop timing and panel sizes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsoleConfig {
    /// Polling interval for keys, connections and notices.
    pub tick: Duration,
    /// Minimum time between periodic redraws.
    pub redraw: Duration,
    /// Command log rows shown in the main view.
    pub log_rows: usize,
    /// Protocol commands shown at once in the info panel.
    pub command_rows: usize,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            tick: Duration::from_millis(50),
            redraw: Duration::from_millis(250),
            log_rows: 15,
            command_rows: 12,
        }
    }
}

/// What the detail popup shows.
///
/// The content is copied when the popup opens, so later log traffic or
/// search edits never change what is on screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DetailPopup {
    /// A protocol command picked in the info panel.
    Command(CommandInfo),

    /// A command log entry picked in the main view.
    LogEntry {
        /// The exchange.
        entry: CommandLogEntry,
        /// Closest known commands, only computed for rejected commands.
        suggestions: Vec<String>,
    },
}
