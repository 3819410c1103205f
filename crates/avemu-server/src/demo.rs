//! Synthetic client traffic for screen recordings.
//!
//! Opens one short-lived connection per scripted command, holds it open long
//! enough to show up in the console, then moves on. Failures are retried a
//! few times and otherwise ignored; the generator never affects the server.

use std::{
    io,
    net::{Ipv4Addr, Ipv6Addr, SocketAddr},
    time::Duration,
};

use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::TcpStream,
    task::JoinHandle,
};

/// Commands sent by default, including a couple of deliberate mistakes.
pub const DEMO_COMMANDS: [&str; 8] =
    ["!ON", "!PLAY", "!BADCMD", "!STATE?", "!VOL(999)", "!PAUSE", "!STOP", "!OFF"];

/// Pacing of the demo client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DemoConfig {
    /// Wait before the first connection.
    pub startup_delay: Duration,
    /// How long each connection stays open after its reply.
    pub hold: Duration,
    /// Pause between connections.
    pub gap: Duration,
    /// Pause after a failed attempt.
    pub retry_backoff: Duration,
    /// Attempts per command before skipping it.
    pub max_attempts: u32,
    /// Connect and reply timeout.
    pub io_timeout: Duration,
    /// Appended to every command.
    pub terminator: String,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            startup_delay: Duration::from_secs(2),
            hold: Duration::from_millis(800),
            gap: Duration::from_millis(200),
            retry_backoff: Duration::from_millis(500),
            max_attempts: 3,
            io_timeout: Duration::from_secs(2),
            terminator: "\r".to_string(),
        }
    }
}

/// Background demo client.
#[derive(Debug, Clone)]
pub struct DemoTrafficGenerator {
    target: SocketAddr,
    commands: Vec<String>,
    config: DemoConfig,
}

impl DemoTrafficGenerator {
    /// Target the server listening on `listen`. A wildcard listen address is
    /// reached over loopback.
    pub fn new(listen: SocketAddr) -> Self {
        let mut target = listen;
        if target.ip().is_unspecified() {
            target.set_ip(match listen {
                SocketAddr::V4(_) => Ipv4Addr::LOCALHOST.into(),
                SocketAddr::V6(_) => Ipv6Addr::LOCALHOST.into(),
            });
        }

        Self {
            target,
            commands: DEMO_COMMANDS.iter().map(ToString::to_string).collect(),
            config: DemoConfig::default(),
        }
    }

    /// Replace the scripted commands.
    #[must_use]
    pub fn with_commands(mut self, commands: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.commands = commands.into_iter().map(Into::into).collect();
        self
    }

    /// Replace the pacing.
    #[must_use]
    pub fn with_config(mut self, config: DemoConfig) -> Self {
        self.config = config;
        self
    }

    /// Address the generator connects to.
    pub fn target(&self) -> SocketAddr {
        self.target
    }

    /// Run on a background task.
    pub fn spawn(self) -> JoinHandle<usize> {
        tokio::spawn(self.run())
    }

    /// Send the whole script once. Returns how many commands were delivered.
    pub async fn run(self) -> usize {
        tokio::time::sleep(self.config.startup_delay).await;

        let mut delivered = 0;
        for command in &self.commands {
            for attempt in 1..=self.config.max_attempts.max(1) {
                match self.send(command).await {
                    Ok(()) => {
                        delivered += 1;
                        break;
                    },
                    Err(e) => {
                        tracing::debug!(command = %command, attempt, "demo send failed: {e}");
                        tokio::time::sleep(self.config.retry_backoff).await;
                    },
                }
            }
            tokio::time::sleep(self.config.gap).await;
        }

        tracing::debug!(delivered, "demo traffic finished");
        delivered
    }

    async fn send(&self, command: &str) -> io::Result<()> {
        let timeout = self.config.io_timeout;
        let mut stream = tokio::time::timeout(timeout, TcpStream::connect(self.target))
            .await
            .map_err(|_| io::Error::from(io::ErrorKind::TimedOut))??;

        let line = format!("{command}{}", self.config.terminator);
        stream.write_all(line.as_bytes()).await?;

        // Silent protocols never answer, so a missing reply is not a failure
        let mut reply = [0u8; 1024];
        let _ = tokio::time::timeout(timeout, stream.read(&mut reply)).await;

        tokio::time::sleep(self.config.hold).await;
        Ok(())
    }
}
