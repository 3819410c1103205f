//! avemu binary.
//!
//! # Usage
//!
//! ```bash
//! # List bundled device models
//! avemu --supported
//!
//! # Emulate a CD player on its declared default port
//! avemu --model lyngdorf/cd2
//!
//! # Interactive console with scripted demo traffic
//! avemu --model lyngdorf_cd2 --port 4999 --tui --demo
//! ```

mod listing;
mod logging;

use std::{
    io::{self, IsTerminal, Write},
    process::ExitCode,
    sync::Arc,
};

use avemu_core::{EmulationGateway, Registry};
use avemu_protocol::{
    DeviceEmulator, ProtocolDefinition, ProtocolLibrary, extract_metadata, normalize_protocol_id,
};
use avemu_server::{
    ConnectionAcceptor, DemoTrafficGenerator, ServerConfig, SessionContext, host_ipv4_addresses,
    resolve_port,
};
use avemu_tui::{ConsoleConfig, ConsoleRuntime, Notice, NoticeLayer};
use clap::Parser;
use logging::LogOutput;
use tokio::sync::mpsc::UnboundedReceiver;

/// A/V device protocol emulator
#[derive(Parser, Debug)]
#[command(name = "avemu")]
#[command(about = "Test server that emulates A/V device control protocols")]
#[command(version)]
struct Args {
    /// Port to listen on (default: the device's declared port, else 4999)
    #[arg(long)]
    port: Option<u16>,

    /// Device model, e.g. mcintosh/mx160 or mcintosh_mx160
    #[arg(long, required_unless_present = "supported")]
    model: Option<String>,

    /// List supported models and exit
    #[arg(long)]
    supported: bool,

    /// Listener host
    #[arg(long, default_value = "0.0.0.0")]
    host: String,

    /// Verbose logging
    #[arg(short, long)]
    debug: bool,

    /// Warnings and errors only
    #[arg(short, long)]
    quiet: bool,

    /// Interactive status console (requires a terminal, ignored with -q)
    #[arg(long)]
    tui: bool,

    /// Generate scripted demo traffic
    #[arg(long)]
    demo: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    let console_mode = console_enabled(&args, io::stdout().is_terminal());
    let (output, notices) = if console_mode {
        let (layer, rx) = NoticeLayer::channel();
        (LogOutput::Console(layer), Some(rx))
    } else {
        (LogOutput::Stderr, None)
    };

    logging::init(logging::default_level(args.debug, args.quiet), output);

    if args.tui && !console_mode {
        tracing::warn!("--tui needs a terminal on stdout and no -q, running without console");
    }

    let library = ProtocolLibrary::bundled();

    if args.supported {
        return match listing::write_supported(&mut io::stdout().lock(), &library) {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => fatal(console_mode, &format!("cannot write model list: {e}")),
        };
    }

    let Some(model) = args.model.clone() else {
        return fatal(console_mode, "--model is required unless using --supported");
    };

    let protocol_id = normalize_protocol_id(&model);
    let definition = match library.load(&protocol_id) {
        Ok(definition) => definition,
        Err(e) => {
            return fatal(
                console_mode,
                &format!(
                    "failed to load protocol '{model}': {e}\nUse --supported to list available models"
                ),
            );
        },
    };

    match serve(&args, &protocol_id, &definition, notices).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => fatal(console_mode, &e.to_string()),
    }
}

async fn serve(
    args: &Args,
    protocol_id: &str,
    definition: &ProtocolDefinition,
    notices: Option<UnboundedReceiver<Notice>>,
) -> Result<(), Box<dyn std::error::Error>> {
    let metadata = Arc::new(extract_metadata(protocol_id, definition));
    let emulator = DeviceEmulator::new(definition)?;
    tracing::info!("Loaded protocol: {} ({})", metadata.device_name, protocol_id);

    let port = resolve_port(args.port, metadata.default_port);
    if args.port.is_none() && metadata.default_port.is_some() {
        tracing::info!("Using device default port {}", port);
    }

    let config = ServerConfig { host: args.host.clone(), port, ..ServerConfig::default() };
    let registry = Arc::new(Registry::new());
    let gateway = Arc::new(EmulationGateway::new(emulator));
    let ctx = SessionContext::new(registry, gateway, &config);

    let acceptor = ConnectionAcceptor::bind(&config, ctx).await?;
    let local_addr = acceptor.local_addr()?;

    let host_addresses =
        if config.listens_on_all_interfaces() { host_ipv4_addresses() } else { Vec::new() };
    let also_on = if host_addresses.is_empty() {
        String::new()
    } else {
        let addrs: Vec<String> = host_addresses.iter().map(ToString::to_string).collect();
        format!(" (also on {})", addrs.join(","))
    };
    tracing::info!("Emulating {} on socket://{}{}", protocol_id, local_addr, also_on);

    if args.demo {
        let demo = DemoTrafficGenerator::new(local_addr);
        tracing::info!("Demo traffic to {}", demo.target());
        demo.spawn();
    }

    match notices {
        Some(notices) => {
            ConsoleRuntime::new(acceptor, metadata, ConsoleConfig::default())?
                .with_notices(notices)
                .with_host_addresses(host_addresses)
                .run()
                .await?;
        },
        None => acceptor.run(shutdown_signal()).await?,
    }

    Ok(())
}

/// The console runs only when asked for, not silenced by `-q`, and stdout is
/// a terminal.
fn console_enabled(args: &Args, stdout_is_terminal: bool) -> bool {
    args.tui && !args.quiet && stdout_is_terminal
}

/// Resolves on Ctrl-C.
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Cannot listen for Ctrl-C: {e}");
        std::future::pending::<()>().await;
    }
}

/// Report a startup failure and pick the exit code.
///
/// In console mode log events never reach the terminal, so the message is
/// written to stderr directly.
fn fatal(console_mode: bool, message: &str) -> ExitCode {
    if console_mode {
        let _ = writeln!(io::stderr().lock(), "\nError: {message}\n");
    } else {
        tracing::error!("{message}");
    }
    ExitCode::FAILURE
}
