//! Key decoding.
//!
//! Terminal key events are reduced to the closed set of inputs the console
//! state machine understands. Everything else is dropped here, so the state
//! machine never sees raw escape sequences or modifier combinations.

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

/// Key input consumed by [`crate::Console`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyInput {
    /// Printable character.
    Char(char),
    /// Up arrow.
    Up,
    /// Down arrow.
    Down,
    /// Enter/Return key.
    Enter,
    /// Escape key.
    Esc,
    /// Backspace key.
    Backspace,
    /// Ctrl-C.
    Interrupt,
}

impl KeyInput {
    /// Decode a crossterm key event. Key releases and unsupported keys yield
    /// `None`.
    pub fn from_key_event(event: KeyEvent) -> Option<Self> {
        if event.kind == KeyEventKind::Release {
            return None;
        }

        if event.modifiers.contains(KeyModifiers::CONTROL) {
            return match event.code {
                KeyCode::Char('c' | 'C') => Some(Self::Interrupt),
                _ => None,
            };
        }

        match event.code {
            KeyCode::Char(c) if !c.is_control() => Some(Self::Char(c)),
            KeyCode::Up => Some(Self::Up),
            KeyCode::Down => Some(Self::Down),
            KeyCode::Enter => Some(Self::Enter),
            KeyCode::Esc => Some(Self::Esc),
            KeyCode::Backspace => Some(Self::Backspace),
            _ => None,
        }
    }

    /// Whether this key moves a selection towards the top of a list.
    pub fn is_up(self) -> bool {
        matches!(self, Self::Up | Self::Char('k'))
    }

    /// Whether this key moves a selection towards the bottom of a list.
    pub fn is_down(self) -> bool {
        matches!(self, Self::Down | Self::Char('j'))
    }
}
