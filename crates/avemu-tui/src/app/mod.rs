//! Console state machine
//!
//! Pure state machine that turns decoded keys into view changes, producing
//! actions for the runtime to execute. Completely decoupled from I/O: the
//! runtime hands in a snapshot of the command log with every key.
//!
//! # Modes
//!
//! - Normal: dashboard with the command log; `j`/`k` move a selection
//!   counted from the newest entry
//! - Info panel: browsable list of protocol commands with incremental search
//! - Search: every printable key, `j`, `k`, `i` and `/` included, edits the
//!   query; arrows still move the selection and `Esc` ends the search
//! - Detail popup: modal view of one command or one log entry; only `Esc`,
//!   `i` and Ctrl-C act while it is open

mod action;
mod state;

use std::sync::Arc;

pub use action::ConsoleAction;
use avemu_core::{CommandInfo, CommandLogEntry, ProtocolMetadata, similar_commands};
pub use state::{ConsoleConfig, DetailPopup};

use crate::KeyInput;

/// Console state machine.
///
/// Owns every piece of view state. Never shared between tasks, so it needs
/// no lock.
#[derive(Debug, Clone)]
pub struct Console {
    /// Immutable protocol snapshot.
    metadata: Arc<ProtocolMetadata>,
    /// Panel sizes.
    config: ConsoleConfig,
    /// Whether the protocol browser replaces the dashboard.
    info_visible: bool,
    /// Open detail popup.
    popup: Option<DetailPopup>,
    /// Whether typed characters edit the search query.
    search_active: bool,
    /// Filter applied to the protocol command list.
    search_query: String,
    /// First visible row of the filtered command list.
    scroll_offset: usize,
    /// Selected row of the filtered command list.
    selected_command: usize,
    /// Selected log entry, counted back from the newest. `None` if nothing
    /// is selected.
    selected_log: Option<usize>,
}

impl Console {
    /// Create a console in Normal mode.
    pub fn new(metadata: Arc<ProtocolMetadata>, config: ConsoleConfig) -> Self {
        Self {
            metadata,
            config,
            info_visible: false,
            popup: None,
            search_active: false,
            search_query: String::new(),
            scroll_offset: 0,
            selected_command: 0,
            selected_log: None,
        }
    }

    /// Process a key against the current command log (oldest first) and
    /// return actions for the runtime.
    pub fn handle_key(&mut self, key: KeyInput, log: &[CommandLogEntry]) -> Vec<ConsoleAction> {
        match key {
            KeyInput::Interrupt => return vec![ConsoleAction::Quit],
            KeyInput::Esc => return self.handle_escape(),
            _ => {},
        }

        if self.popup.is_some() {
            return if key == KeyInput::Char('i') {
                self.popup = None;
                vec![ConsoleAction::Render]
            } else {
                vec![]
            };
        }

        if self.search_active {
            match key {
                KeyInput::Char(c) => {
                    self.search_query.push(c);
                    self.clamp_command_selection();
                    return vec![ConsoleAction::Render];
                },
                KeyInput::Backspace => {
                    if self.search_query.pop().is_none() {
                        return vec![];
                    }
                    self.clamp_command_selection();
                    return vec![ConsoleAction::Render];
                },
                _ => {},
            }
        }

        if self.info_visible { self.handle_info_key(key) } else { self.handle_log_key(key, log) }
    }

    /// Undo exactly one layer: popup, then search, then info panel, then log
    /// selection.
    fn handle_escape(&mut self) -> Vec<ConsoleAction> {
        if self.popup.is_some() {
            self.popup = None;
        } else if self.search_active {
            self.search_active = false;
            self.search_query.clear();
            self.clamp_command_selection();
        } else if self.info_visible {
            self.info_visible = false;
        } else if self.selected_log.is_some() {
            self.selected_log = None;
        } else {
            return vec![];
        }
        vec![ConsoleAction::Render]
    }

    fn handle_info_key(&mut self, key: KeyInput) -> Vec<ConsoleAction> {
        match key {
            KeyInput::Char('i') => {
                self.info_visible = false;
            },
            KeyInput::Char('/') => {
                self.search_active = true;
                self.search_query.clear();
                self.clamp_command_selection();
            },
            KeyInput::Enter => {
                let Some(command) = self.selected_command_info() else {
                    return vec![];
                };
                self.popup = Some(DetailPopup::Command(command.clone()));
            },
            key if key.is_up() => {
                self.selected_command = self.selected_command.saturating_sub(1);
                self.clamp_command_selection();
            },
            key if key.is_down() => {
                self.selected_command = self.selected_command.saturating_add(1);
                self.clamp_command_selection();
            },
            _ => return vec![],
        }
        vec![ConsoleAction::Render]
    }

    fn handle_log_key(&mut self, key: KeyInput, log: &[CommandLogEntry]) -> Vec<ConsoleAction> {
        self.selected_log = self.selected_log.filter(|&idx| idx < log.len());

        match key {
            KeyInput::Char('i') => {
                self.info_visible = true;
                self.scroll_offset = 0;
                self.selected_command = 0;
            },
            KeyInput::Enter => {
                let Some(entry) = self.selected_log.and_then(|idx| log.iter().rev().nth(idx))
                else {
                    return vec![];
                };
                self.popup = Some(self.log_entry_popup(entry));
            },
            key if key.is_up() => {
                let next = self.selected_log.map_or(0, |idx| idx + 1);
                if next >= log.len() {
                    return vec![];
                }
                self.selected_log = Some(next);
            },
            key if key.is_down() => {
                let Some(idx) = self.selected_log else {
                    return vec![];
                };
                self.selected_log = idx.checked_sub(1);
            },
            _ => return vec![],
        }
        vec![ConsoleAction::Render]
    }

    fn log_entry_popup(&self, entry: &CommandLogEntry) -> DetailPopup {
        let suggestions = if entry.is_error {
            similar_commands(&entry.command, self.metadata.command_syntaxes())
        } else {
            Vec::new()
        };
        DetailPopup::LogEntry { entry: entry.clone(), suggestions }
    }

    /// Keep the command selection inside the filtered list and inside the
    /// scroll window.
    fn clamp_command_selection(&mut self) {
        let len = self.filtered_commands().len();
        let rows = self.config.command_rows.max(1);

        self.selected_command = self.selected_command.min(len.saturating_sub(1));
        if self.selected_command < self.scroll_offset {
            self.scroll_offset = self.selected_command;
        } else if self.selected_command >= self.scroll_offset + rows {
            self.scroll_offset = self.selected_command + 1 - rows;
        }
    }

    /// Protocol commands matching the current search query.
    pub fn filtered_commands(&self) -> Vec<&CommandInfo> {
        self.metadata.filter_commands(&self.search_query)
    }

    /// The highlighted command in the info panel.
    pub fn selected_command_info(&self) -> Option<&CommandInfo> {
        self.filtered_commands().get(self.selected_command).copied()
    }

    /// Protocol snapshot.
    pub fn metadata(&self) -> &ProtocolMetadata {
        &self.metadata
    }

    /// Panel sizes.
    pub fn config(&self) -> &ConsoleConfig {
        &self.config
    }

    /// Whether the info panel is shown.
    pub fn info_visible(&self) -> bool {
        self.info_visible
    }

    /// Open detail popup.
    pub fn popup(&self) -> Option<&DetailPopup> {
        self.popup.as_ref()
    }

    /// Whether search input is active.
    pub fn search_active(&self) -> bool {
        self.search_active
    }

    /// Current search query.
    pub fn search_query(&self) -> &str {
        &self.search_query
    }

    /// First visible row of the filtered command list.
    pub fn scroll_offset(&self) -> usize {
        self.scroll_offset
    }

    /// Selected row of the filtered command list.
    pub fn selected_command(&self) -> usize {
        self.selected_command
    }

    /// Selected log entry, counted back from the newest.
    pub fn selected_log(&self) -> Option<usize> {
        self.selected_log
    }
}
