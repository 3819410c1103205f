//! Interactive console for the A/V emulator
//!
//! Live view of connected clients, device state and command traffic, plus a
//! browser over the loaded protocol's commands.
//!
//! # Architecture
//!
//! - [`KeyInput`]: closed set of keys decoded from crossterm events
//! - [`Console`]: pure state machine, key in, [`ConsoleAction`]s out
//! - [`ui`]: pure rendering of a [`ui::Dashboard`]
//! - [`ConsoleRuntime`]: owns the terminal and the listener, runs the loop
//! - [`NoticeLayer`]: routes warnings to the footer instead of stderr

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod app;
pub mod input;
mod notices;
mod runtime;
pub mod ui;

pub use app::{Console, ConsoleAction, ConsoleConfig, DetailPopup};
pub use input::KeyInput;
pub use notices::{Notice, NoticeLayer};
pub use runtime::{ConsoleError, ConsoleRuntime};
