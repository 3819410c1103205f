//! Socket-level session behavior against an ephemeral listener.

use std::{
    collections::HashMap,
    net::SocketAddr,
    sync::Arc,
    time::{Duration, Instant},
};

use avemu_core::{EmulationGateway, EngineError, ProtocolEngine, Registry};
use avemu_protocol::{DeviceEmulator, ProtocolLibrary};
use avemu_server::{
    ConnectionAcceptor, DEMO_COMMANDS, DemoConfig, DemoTrafficGenerator, ServerConfig,
    ServerError, SessionContext,
};
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::TcpStream,
    sync::oneshot,
    task::JoinHandle,
};

struct TestServer {
    addr: SocketAddr,
    registry: Arc<Registry>,
    shutdown: Option<oneshot::Sender<()>>,
    task: JoinHandle<Result<(), ServerError>>,
}

impl TestServer {
    async fn start(engine: impl ProtocolEngine + 'static, config: ServerConfig) -> Self {
        let registry = Arc::new(Registry::new());
        let gateway = Arc::new(EmulationGateway::new(engine));
        let ctx = SessionContext::new(Arc::clone(&registry), gateway, &config);

        let acceptor = ConnectionAcceptor::bind(&config, ctx).await.unwrap();
        let addr = acceptor.local_addr().unwrap();

        let (tx, rx) = oneshot::channel::<()>();
        let task = tokio::spawn(acceptor.run(async move {
            let _ = rx.await;
        }));

        Self { addr, registry, shutdown: Some(tx), task }
    }

    async fn with_protocol(id: &str) -> Self {
        let definition = ProtocolLibrary::bundled().load(id).unwrap();
        Self::start(DeviceEmulator::new(&definition).unwrap(), local_config()).await
    }

    async fn stop(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        self.task.await.unwrap().unwrap();
    }
}

fn local_config() -> ServerConfig {
    ServerConfig { host: "127.0.0.1".to_string(), port: 0, ..ServerConfig::default() }
}

async fn read_reply(stream: &mut TcpStream) -> Vec<u8> {
    let mut buf = [0u8; 1024];
    let n = tokio::time::timeout(Duration::from_secs(2), stream.read(&mut buf))
        .await
        .expect("reply timed out")
        .unwrap();
    buf[..n].to_vec()
}

async fn eventually(what: &str, condition: impl Fn() -> bool) {
    let deadline = Instant::now() + Duration::from_secs(3);
    while !condition() {
        assert!(Instant::now() < deadline, "timed out waiting for {what}");
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

/// Echoes input, fails on `BOOM`, panics on `PANIC`.
struct Tripwire;

impl ProtocolEngine for Tripwire {
    fn process(&mut self, command: &[u8]) -> Result<Vec<u8>, EngineError> {
        match command {
            b"BOOM" => Err(EngineError::Other("tripped".to_string())),
            b"PANIC" => panic!("device model panicked"),
            other => Ok(other.to_vec()),
        }
    }
}

#[tokio::test]
async fn acknowledged_command_round_trips() {
    let server = TestServer::with_protocol("lyngdorf/cd2").await;
    let mut client = TcpStream::connect(server.addr).await.unwrap();

    client.write_all(b"!ON\r").await.unwrap();
    let reply = read_reply(&mut client).await;
    assert_eq!(reply, b"!ON\r");

    client.write_all(b"!BADCMD\r").await.unwrap();
    let reply = read_reply(&mut client).await;
    assert!(reply.starts_with(b"ERROR"));
    assert!(reply.ends_with(b"\r"));

    let snapshot = server.registry.snapshot();
    assert_eq!(snapshot.log.len(), 2);
    assert_eq!(snapshot.log[0].command, "!ON");
    assert_eq!(snapshot.log[0].response, "!ON");
    assert!(!snapshot.log[0].is_error);
    assert!(snapshot.log[1].is_error);
    assert_eq!(snapshot.counters.errors, 1);

    drop(client);
    server.stop().await;
}

#[tokio::test]
async fn empty_response_sends_nothing() {
    let server = TestServer::with_protocol("mcintosh/mx160").await;
    let mut client = TcpStream::connect(server.addr).await.unwrap();

    client.write_all(b"!ON\r").await.unwrap();
    let mut buf = [0u8; 64];
    let silent = tokio::time::timeout(Duration::from_millis(200), client.read(&mut buf)).await;
    assert!(silent.is_err(), "ignoring protocol must not reply");

    // Connection is still usable afterwards
    client.write_all(b"(PON)\r").await.unwrap();
    assert_eq!(read_reply(&mut client).await, b"(PON)\r");

    let log = server.registry.snapshot_log(10);
    assert_eq!(log.len(), 2);
    assert_eq!(log[0].response, "");

    drop(client);
    server.stop().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_sessions_are_all_counted() {
    const SESSIONS: usize = 5;
    const COMMANDS: usize = 10;

    let server = TestServer::with_protocol("lyngdorf/cd2").await;

    let clients: Vec<_> = (0..SESSIONS)
        .map(|_| {
            let addr = server.addr;
            tokio::spawn(async move {
                let mut client = TcpStream::connect(addr).await.unwrap();
                let port = client.local_addr().unwrap().port();
                for i in 0..COMMANDS {
                    let command: &[u8] = if i % 2 == 0 { b"!PLAY\r" } else { b"!STOP\r" };
                    client.write_all(command).await.unwrap();
                    // Lockstep so each read carries exactly one command
                    let reply = read_reply(&mut client).await;
                    assert_eq!(reply, command);
                }
                port
            })
        })
        .collect();

    let mut ports = Vec::new();
    for client in clients {
        ports.push(client.await.unwrap());
    }

    let snapshot = server.registry.snapshot();
    assert_eq!(snapshot.counters.commands, (SESSIONS * COMMANDS) as u64);
    assert_eq!(snapshot.counters.connections, SESSIONS as u64);

    let mut per_session: HashMap<u16, usize> = HashMap::new();
    for entry in &snapshot.log {
        *per_session.entry(entry.session.port()).or_default() += 1;
    }
    for port in ports {
        assert_eq!(per_session.get(&port), Some(&COMMANDS));
    }
    assert_eq!(per_session.values().sum::<usize>(), SESSIONS * COMMANDS);

    server.stop().await;
}

#[tokio::test]
async fn closed_sessions_are_deregistered() {
    let server = TestServer::with_protocol("lyngdorf/cd2").await;
    let registry = Arc::clone(&server.registry);

    let client = TcpStream::connect(server.addr).await.unwrap();
    let port = client.local_addr().unwrap().port();
    eventually("registration", || {
        registry.snapshot_sessions().iter().any(|s| s.port() == port)
    })
    .await;

    drop(client);
    eventually("deregistration", || registry.snapshot_sessions().is_empty()).await;
    assert_eq!(registry.snapshot_counters().connections, 1);

    server.stop().await;
}

#[tokio::test]
async fn idle_sessions_time_out() {
    let config = ServerConfig { idle_timeout: Duration::from_millis(150), ..local_config() };
    let server = TestServer::start(Tripwire, config).await;
    let registry = Arc::clone(&server.registry);

    let mut client = TcpStream::connect(server.addr).await.unwrap();
    eventually("registration", || registry.snapshot_sessions().len() == 1).await;

    // Server closes the socket: the client sees EOF
    let mut buf = [0u8; 8];
    let n = tokio::time::timeout(Duration::from_secs(2), client.read(&mut buf))
        .await
        .unwrap()
        .unwrap_or(0);
    assert_eq!(n, 0);
    eventually("deregistration", || registry.snapshot_sessions().is_empty()).await;

    server.stop().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn engine_failure_closes_only_that_session() {
    let server = TestServer::start(Tripwire, local_config()).await;
    let registry = Arc::clone(&server.registry);

    let mut healthy = TcpStream::connect(server.addr).await.unwrap();
    healthy.write_all(b"HELLO").await.unwrap();
    assert_eq!(read_reply(&mut healthy).await, b"HELLO");

    for poison in [&b"BOOM"[..], &b"PANIC"[..]] {
        let mut doomed = TcpStream::connect(server.addr).await.unwrap();
        doomed.write_all(poison).await.unwrap();

        let mut buf = [0u8; 8];
        let n = tokio::time::timeout(Duration::from_secs(2), doomed.read(&mut buf))
            .await
            .unwrap()
            .unwrap_or(0);
        assert_eq!(n, 0, "failed session must be closed");
    }

    eventually("failed sessions removed", || registry.snapshot_sessions().len() == 1).await;

    // The surviving session and the device model keep working
    healthy.write_all(b"AGAIN").await.unwrap();
    assert_eq!(read_reply(&mut healthy).await, b"AGAIN");

    let commands: Vec<_> = registry.snapshot_log(10).into_iter().map(|e| e.command).collect();
    assert_eq!(commands, vec!["HELLO", "AGAIN"]);

    drop(healthy);
    server.stop().await;
}

#[tokio::test]
async fn bind_conflict_is_reported_with_address() {
    let occupied = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = occupied.local_addr().unwrap().port();

    let config = ServerConfig { port, ..local_config() };
    let ctx = SessionContext::new(
        Arc::new(Registry::new()),
        Arc::new(EmulationGateway::new(Tripwire)),
        &config,
    );

    let err = ConnectionAcceptor::bind(&config, ctx).await.unwrap_err();
    match err {
        ServerError::Bind { addr, .. } => assert_eq!(addr, format!("127.0.0.1:{port}")),
        other => panic!("expected bind error, got {other}"),
    }
}

#[tokio::test]
async fn demo_script_reaches_the_server_in_order() {
    let server = TestServer::with_protocol("lyngdorf/cd2").await;

    let fast = DemoConfig {
        startup_delay: Duration::ZERO,
        hold: Duration::ZERO,
        gap: Duration::ZERO,
        retry_backoff: Duration::from_millis(10),
        io_timeout: Duration::from_millis(500),
        ..DemoConfig::default()
    };
    let delivered = DemoTrafficGenerator::new(server.addr).with_config(fast).run().await;
    assert_eq!(delivered, DEMO_COMMANDS.len());

    // Every demo session logs before its reply goes out
    let commands: Vec<String> =
        server.registry.snapshot().log.into_iter().map(|entry| entry.command).collect();
    assert_eq!(commands, DEMO_COMMANDS);
    assert_eq!(server.registry.snapshot_counters().connections, DEMO_COMMANDS.len() as u64);

    server.stop().await;
}
