//! TCP front end of the A/V emulator.
//!
//! Accepts raw TCP clients, runs one [`ClientSession`] task per connection and
//! funnels every command through the shared
//! [`avemu_core::EmulationGateway`].
//!
//! # Components
//!
//! - [`ConnectionAcceptor`]: listener with address reuse and a fixed backlog;
//!   either runs its own accept loop or hands out single accepts to a caller
//!   that owns the event loop (the console)
//! - [`ClientSession`]: read, dispatch, log, reply; deregisters on every exit
//!   path
//! - [`DemoTrafficGenerator`]: scripted background client
//!
//! # Failure isolation
//!
//! A failing session logs and closes; it never reaches the acceptor or other
//! sessions. Only bind and resolve failures surface as [`ServerError`].

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod acceptor;
mod config;
mod demo;
mod error;
mod host;
mod session;

pub use acceptor::ConnectionAcceptor;
pub use config::{DEFAULT_PORT, ServerConfig, resolve_port};
pub use demo::{DEMO_COMMANDS, DemoConfig, DemoTrafficGenerator};
pub use error::{ServerError, SessionError};
pub use host::host_ipv4_addresses;
pub use session::{ClientSession, SessionContext, SessionExit, decode_for_log};
