//! Subscriber setup.

use avemu_tui::NoticeLayer;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Where log events go.
pub enum LogOutput {
    /// Plain log lines on stderr.
    Stderr,
    /// The console footer; nothing is written to the terminal.
    Console(NoticeLayer),
}

/// Default level when `RUST_LOG` is unset.
pub fn default_level(debug: bool, quiet: bool) -> &'static str {
    if quiet {
        "warn"
    } else if debug {
        "debug"
    } else {
        "info"
    }
}

/// Install the global subscriber. `RUST_LOG` wins over `level`.
pub fn init(level: &str, output: LogOutput) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let registry = tracing_subscriber::registry().with(filter);

    match output {
        LogOutput::Stderr => registry.with(fmt::layer().with_writer(std::io::stderr)).init(),
        LogOutput::Console(layer) => registry.with(layer).init(),
    }
}
