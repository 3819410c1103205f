//! Listener and session settings.

use std::{net::Ipv6Addr, time::Duration};

/// Port used when neither the operator nor the protocol names one.
pub const DEFAULT_PORT: u16 = 4999;

/// Server configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Interface to listen on; `0.0.0.0` for all.
    pub host: String,
    /// TCP port.
    pub port: u16,
    /// Listen backlog.
    pub backlog: u32,
    /// Largest single read; each read is treated as one command.
    pub read_chunk: usize,
    /// Sessions idle for this long are closed.
    pub idle_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
            backlog: 5,
            read_chunk: 1024,
            idle_timeout: Duration::from_secs(300),
        }
    }
}

impl ServerConfig {
    /// `host:port` suitable for address resolution, bracketing IPv6 literals.
    pub fn bind_target(&self) -> String {
        if self.host.parse::<Ipv6Addr>().is_ok() {
            format!("[{}]:{}", self.host, self.port)
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }

    /// Whether the listener covers every interface.
    pub fn listens_on_all_interfaces(&self) -> bool {
        matches!(self.host.as_str(), "0.0.0.0" | "::" | "")
    }
}

/// Port to listen on: explicit choice, else the protocol's declared port,
/// else [`DEFAULT_PORT`].
pub fn resolve_port(explicit: Option<u16>, declared: Option<u16>) -> u16 {
    explicit.or(declared).unwrap_or(DEFAULT_PORT)
}
