//! One connected client.
//!
//! A session reads up to `read_chunk` bytes at a time and treats each read as
//! exactly one command: there is no reassembly of commands split across TCP
//! segments. Every read goes through the shared [`EmulationGateway`], is
//! logged in the [`Registry`], and the reply (if any) is written back
//! verbatim.
//!
//! Neither shared lock is held across socket I/O: the gateway call runs on
//! the blocking pool and returns before the write starts, and the registry is
//! only touched between awaits.

use std::{io, net::SocketAddr, sync::Arc, time::Duration};

use avemu_core::{EmulationGateway, Registry, SessionId};
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::TcpStream,
    task::JoinHandle,
};

use crate::{ServerConfig, SessionError};

/// Why a session ended.
#[derive(Debug)]
pub enum SessionExit {
    /// The client closed the connection.
    PeerClosed,
    /// Nothing was received for the configured idle timeout.
    IdleTimeout,
    /// The connection was reset or aborted by the peer.
    Reset,
    /// The peer went away while a reply was being written.
    BrokenPipe,
    /// Anything else. Reported to the operator.
    Failed(SessionError),
}

impl SessionExit {
    fn from_io(err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::ConnectionReset | io::ErrorKind::ConnectionAborted => Self::Reset,
            io::ErrorKind::BrokenPipe => Self::BrokenPipe,
            _ => Self::Failed(err.into()),
        }
    }

    /// Whether this is an ordinary way for a connection to end.
    pub fn is_expected(&self) -> bool {
        !matches!(self, Self::Failed(_))
    }
}

/// Handles shared by every session.
#[derive(Debug, Clone)]
pub struct SessionContext {
    registry: Arc<Registry>,
    gateway: Arc<EmulationGateway>,
    read_chunk: usize,
    idle_timeout: Duration,
}

impl SessionContext {
    /// Bundle the shared state with the per-session limits from `config`.
    pub fn new(
        registry: Arc<Registry>,
        gateway: Arc<EmulationGateway>,
        config: &ServerConfig,
    ) -> Self {
        Self {
            registry,
            gateway,
            read_chunk: config.read_chunk.max(1),
            idle_timeout: config.idle_timeout,
        }
    }

    /// Shared registry.
    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    /// Shared device gateway.
    pub fn gateway(&self) -> &Arc<EmulationGateway> {
        &self.gateway
    }

    /// Run a session for an accepted connection on its own task.
    pub fn spawn(&self, stream: TcpStream, peer: SocketAddr) -> JoinHandle<SessionExit> {
        let session = ClientSession::new(stream, peer, self.clone());
        tokio::spawn(session.run())
    }
}

/// Registry entry owned by a session, removed on drop.
///
/// Drop runs on every exit path, including a panic unwinding the task.
///
/// A session whose id was already listed owns nothing and leaves the earlier
/// entry alone.
struct Registration {
    registry: Arc<Registry>,
    id: SessionId,
    registered: bool,
}

impl Registration {
    fn new(registry: Arc<Registry>, id: SessionId) -> Self {
        let registered = registry.register(id);
        if !registered {
            tracing::warn!(client = %id, "session already registered");
        }
        Self { registry, id, registered }
    }
}

impl Drop for Registration {
    fn drop(&mut self) {
        if self.registered {
            self.registry.deregister(self.id);
        }
    }
}

/// Read/dispatch/reply loop for one connection.
pub struct ClientSession {
    stream: TcpStream,
    id: SessionId,
    ctx: SessionContext,
}

impl ClientSession {
    /// Wrap an accepted connection.
    pub fn new(stream: TcpStream, peer: SocketAddr, ctx: SessionContext) -> Self {
        Self { stream, id: SessionId::new(peer), ctx }
    }

    /// Serve the client until it leaves, then close and deregister.
    pub async fn run(mut self) -> SessionExit {
        let id = self.id;
        let _registration = Registration::new(Arc::clone(&self.ctx.registry), id);
        tracing::info!(client = %id, "client connected");

        let exit = self.serve().await;
        match &exit {
            SessionExit::Failed(err) => {
                tracing::error!(client = %id, "session failed: {err}");
            },
            reason => {
                tracing::debug!(client = %id, ?reason, "session ended");
            },
        }
        tracing::info!(client = %id, "client disconnected");

        exit
    }

    async fn serve(&mut self) -> SessionExit {
        let mut buf = vec![0u8; self.ctx.read_chunk];

        loop {
            let read = tokio::time::timeout(self.ctx.idle_timeout, self.stream.read(&mut buf)).await;
            let n = match read {
                Err(_elapsed) => return SessionExit::IdleTimeout,
                Ok(Err(e)) => return SessionExit::from_io(e),
                Ok(Ok(0)) => return SessionExit::PeerClosed,
                Ok(Ok(n)) => n,
            };

            if let Err(exit) = self.exchange(buf[..n].to_vec()).await {
                return exit;
            }
        }
    }

    /// Process one command and send the reply.
    async fn exchange(&mut self, command: Vec<u8>) -> Result<(), SessionExit> {
        let command_text = decode_for_log(&command);

        let gateway = Arc::clone(&self.ctx.gateway);
        let response = tokio::task::spawn_blocking(move || gateway.process(&command))
            .await
            .map_err(|e| SessionExit::Failed(e.into()))?
            .map_err(|e| SessionExit::Failed(e.into()))?;

        let response_text = decode_for_log(&response);
        let is_error = self.ctx.registry.log_command(self.id, command_text.as_str(), response_text);
        tracing::debug!(client = %self.id, command = %command_text, is_error, "processed");

        if !response.is_empty() {
            self.stream.write_all(&response).await.map_err(SessionExit::from_io)?;
        }

        Ok(())
    }
}

/// Lossy text form of a wire buffer with framing stripped, for display.
pub fn decode_for_log(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes)
        .trim_matches(|c: char| c.is_whitespace() || c.is_control())
        .to_string()
}
