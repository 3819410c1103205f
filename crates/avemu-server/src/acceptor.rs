//! Listening socket and the plain accept loop.

use std::{future::Future, io, net::SocketAddr, time::Duration};

use tokio::net::{TcpListener, TcpSocket};

use crate::{ServerConfig, ServerError, SessionContext};

/// Pause after a failed accept so a persistent error does not spin.
const ACCEPT_RETRY_DELAY: Duration = Duration::from_millis(100);

/// Owns the listener and spawns a session per connection.
///
/// Connections are not capped: every accepted client gets its own task.
#[derive(Debug)]
pub struct ConnectionAcceptor {
    listener: TcpListener,
    ctx: SessionContext,
}

impl ConnectionAcceptor {
    /// Resolve `config.host`, bind with address reuse and start listening.
    pub async fn bind(config: &ServerConfig, ctx: SessionContext) -> Result<Self, ServerError> {
        let target = config.bind_target();

        let addr = tokio::net::lookup_host(&target)
            .await
            .and_then(|mut addrs| {
                addrs.next().ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "no addresses"))
            })
            .map_err(|source| ServerError::Resolve { addr: target.clone(), source })?;

        let bind_err = |source: io::Error| ServerError::Bind { addr: target.clone(), source };
        let socket = if addr.is_ipv4() { TcpSocket::new_v4() } else { TcpSocket::new_v6() };
        let socket = socket.map_err(bind_err)?;
        socket.set_reuseaddr(true).map_err(bind_err)?;
        socket.bind(addr).map_err(bind_err)?;
        let listener = socket.listen(config.backlog).map_err(bind_err)?;

        tracing::info!("Listening on {}", listener.local_addr()?);
        Ok(Self { listener, ctx })
    }

    /// Address actually bound (resolves port 0).
    pub fn local_addr(&self) -> Result<SocketAddr, ServerError> {
        Ok(self.listener.local_addr()?)
    }

    /// Shared session state.
    pub fn context(&self) -> &SessionContext {
        &self.ctx
    }

    /// Wait for one connection and start its session.
    ///
    /// Cancel-safe: dropping the future before a connection arrives loses
    /// nothing, so it can sit in a `select!` next to other event sources.
    pub async fn accept_one(&self) -> io::Result<SocketAddr> {
        let (stream, peer) = self.listener.accept().await?;
        if let Err(e) = stream.set_nodelay(true) {
            tracing::debug!(client = %peer, "set_nodelay failed: {e}");
        }
        self.ctx.spawn(stream, peer);
        Ok(peer)
    }

    /// Accept until `shutdown` completes, then close the listener.
    ///
    /// Accept failures are logged and retried; they never end the loop.
    /// Sessions already running are left to finish on their own.
    pub async fn run(self, shutdown: impl Future<Output = ()>) -> Result<(), ServerError> {
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                () = &mut shutdown => {
                    tracing::info!("Shutting down listener");
                    return Ok(());
                },
                accepted = self.accept_one() => {
                    if let Err(e) = accepted {
                        tracing::warn!("Accept error: {e}");
                        tokio::time::sleep(ACCEPT_RETRY_DELAY).await;
                    }
                },
            }
        }
    }
}
