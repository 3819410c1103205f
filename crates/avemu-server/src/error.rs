//! Server error types.

use std::io;

use avemu_core::EngineError;
use thiserror::Error;
use tokio::task::JoinError;

/// Errors that stop the server from starting or running.
#[derive(Debug, Error)]
pub enum ServerError {
    /// The listening socket could not be created or bound.
    ///
    /// Fatal at startup: usually the port is taken or needs privileges.
    #[error("failed to bind {addr}: {source}")]
    Bind {
        /// Attempted `host:port`.
        addr: String,
        /// Underlying socket error.
        #[source]
        source: io::Error,
    },

    /// The listen host did not resolve to any address.
    ///
    /// Fatal at startup. Fix the `--host` argument.
    #[error("cannot resolve listen address {addr}: {source}")]
    Resolve {
        /// Attempted `host:port`.
        addr: String,
        /// Resolver error.
        #[source]
        source: io::Error,
    },

    /// Any other I/O failure on the listener.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Unexpected failure inside one session.
///
/// Never escapes the session: it is logged and the connection is closed.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Socket error other than reset, broken pipe or timeout.
    #[error("socket error: {0}")]
    Io(#[from] io::Error),

    /// The device model could not produce an answer.
    #[error(transparent)]
    Engine(#[from] EngineError),

    /// The device-model call panicked or was cancelled.
    #[error("device model task failed: {0}")]
    Join(#[from] JoinError),
}
