//! Shared observability state: connected sessions, recent commands, counters.
//!
//! One [`Registry`] is created at server start and shared by handle with every
//! session and the console. All state sits behind a single mutex so that a
//! registration, a log append and the matching counter increments are atomic
//! with respect to each other. Readers only ever receive copies.

use std::{
    collections::VecDeque,
    fmt,
    net::{IpAddr, SocketAddr},
    sync::{Mutex, MutexGuard, PoisonError},
};

use chrono::{DateTime, Local};

use crate::is_error_response;

/// Maximum number of entries kept in the command log.
pub const COMMAND_LOG_CAPACITY: usize = 100;

/// Identity of a client session: its remote address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(SocketAddr);

impl SessionId {
    /// Identify a session by its peer address.
    pub fn new(peer: SocketAddr) -> Self {
        Self(peer)
    }

    /// Remote IP address.
    pub fn ip(&self) -> IpAddr {
        self.0.ip()
    }

    /// Remote port.
    pub fn port(&self) -> u16 {
        self.0.port()
    }
}

impl From<SocketAddr> for SessionId {
    fn from(peer: SocketAddr) -> Self {
        Self(peer)
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.ip(), self.port())
    }
}

/// One completed command/response exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLogEntry {
    /// When the exchange completed.
    pub timestamp: DateTime<Local>,
    /// Session that sent the command.
    pub session: SessionId,
    /// Command as decoded for display.
    pub command: String,
    /// Response as decoded for display (empty if nothing was sent).
    pub response: String,
    /// Whether the response was classified as a device error.
    pub is_error: bool,
}

/// Monotonic activity counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Counters {
    /// Completed command exchanges.
    pub commands: u64,
    /// Sessions ever registered.
    pub connections: u64,
    /// Exchanges whose response was classified as an error.
    pub errors: u64,
}

/// Consistent copy of the whole registry taken under one lock acquisition.
#[derive(Debug, Clone, Default)]
pub struct RegistrySnapshot {
    /// Connected sessions in registration order.
    pub sessions: Vec<SessionId>,
    /// Command log, oldest first.
    pub log: Vec<CommandLogEntry>,
    /// Counters at the time of the snapshot.
    pub counters: Counters,
}

#[derive(Debug, Default)]
struct RegistryState {
    sessions: Vec<SessionId>,
    log: VecDeque<CommandLogEntry>,
    counters: Counters,
}

/// Thread-safe registry shared by all sessions and the console.
#[derive(Debug, Default)]
pub struct Registry {
    state: Mutex<RegistryState>,
}

impl Registry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry state never becomes inconsistent mid-update (every mutation
    /// is a handful of infallible pushes), so a poisoned lock is safe to reuse.
    fn lock(&self) -> MutexGuard<'_, RegistryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Add a connected session and count the connection.
    ///
    /// Returns `false` (and counts nothing) if the session is already listed.
    pub fn register(&self, session: SessionId) -> bool {
        let mut state = self.lock();
        if state.sessions.contains(&session) {
            return false;
        }

        state.sessions.push(session);
        state.counters.connections += 1;
        true
    }

    /// Remove a session. Returns `false` if it was not listed.
    pub fn deregister(&self, session: SessionId) -> bool {
        let mut state = self.lock();
        let before = state.sessions.len();
        state.sessions.retain(|s| *s != session);
        state.sessions.len() != before
    }

    /// Record a completed exchange.
    ///
    /// Classifies the response, appends to the bounded log (evicting the
    /// oldest entry once full) and bumps the counters. Returns whether the
    /// response was classified as an error.
    pub fn log_command(
        &self,
        session: SessionId,
        command: impl Into<String>,
        response: impl Into<String>,
    ) -> bool {
        let response = response.into();
        let is_error = is_error_response(&response);
        let entry = CommandLogEntry {
            timestamp: Local::now(),
            session,
            command: command.into(),
            response,
            is_error,
        };

        let mut state = self.lock();
        if state.log.len() == COMMAND_LOG_CAPACITY {
            state.log.pop_front();
        }
        state.log.push_back(entry);
        state.counters.commands += 1;
        if is_error {
            state.counters.errors += 1;
        }

        is_error
    }

    /// Connected sessions in registration order.
    pub fn snapshot_sessions(&self) -> Vec<SessionId> {
        self.lock().sessions.clone()
    }

    /// The last `n` log entries, oldest first.
    pub fn snapshot_log(&self, n: usize) -> Vec<CommandLogEntry> {
        let state = self.lock();
        let skip = state.log.len().saturating_sub(n);
        state.log.iter().skip(skip).cloned().collect()
    }

    /// Current counters.
    pub fn snapshot_counters(&self) -> Counters {
        self.lock().counters
    }

    /// Number of entries currently in the log.
    pub fn log_len(&self) -> usize {
        self.lock().log.len()
    }

    /// Sessions, full log and counters from a single lock acquisition.
    pub fn snapshot(&self) -> RegistrySnapshot {
        let state = self.lock();
        RegistrySnapshot {
            sessions: state.sessions.clone(),
            log: state.log.iter().cloned().collect(),
            counters: state.counters,
        }
    }
}
