//! Concurrency tests for the registry and gateway working together.
//!
//! Each worker thread plays the part of a client session: register, run `k`
//! exchanges through the gateway, log each one, deregister. The oracle checks
//! that nothing is lost or duplicated and that the two locks never interfere.

use std::{
    collections::HashMap,
    net::{Ipv4Addr, SocketAddr, SocketAddrV4},
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
    thread,
    time::Duration,
};

use avemu_core::{
    COMMAND_LOG_CAPACITY, EmulationGateway, EngineError, ProtocolEngine, Registry, SessionId,
};

/// Counts power toggles; replies with an error for anything unknown.
struct ToggleEngine {
    power: bool,
    processed: usize,
    inside: Arc<AtomicUsize>,
}

impl ProtocolEngine for ToggleEngine {
    fn process(&mut self, command: &[u8]) -> Result<Vec<u8>, EngineError> {
        assert_eq!(self.inside.fetch_add(1, Ordering::SeqCst), 0, "engine entered concurrently");
        thread::sleep(Duration::from_micros(200));
        self.processed += 1;

        let reply = match command {
            b"ON" => {
                self.power = true;
                b"ON\r".to_vec()
            },
            b"OFF" => {
                self.power = false;
                b"OFF\r".to_vec()
            },
            b"QUIET" => Vec::new(),
            _ => b"ERROR\r".to_vec(),
        };

        self.inside.fetch_sub(1, Ordering::SeqCst);
        Ok(reply)
    }

    fn state(&self) -> Vec<(String, String)> {
        vec![
            ("power".to_string(), if self.power { "on" } else { "off" }.to_string()),
            ("processed".to_string(), self.processed.to_string()),
        ]
    }
}

fn session(port: u16) -> SessionId {
    SessionId::new(SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::LOCALHOST, port)))
}

#[test]
fn concurrent_sessions_lose_nothing() {
    const SESSIONS: u16 = 6;
    const COMMANDS_PER_SESSION: usize = 15;

    let registry = Arc::new(Registry::new());
    let gateway = Arc::new(EmulationGateway::new(ToggleEngine {
        power: false,
        processed: 0,
        inside: Arc::new(AtomicUsize::new(0)),
    }));

    let workers: Vec<_> = (0..SESSIONS)
        .map(|n| {
            let registry = Arc::clone(&registry);
            let gateway = Arc::clone(&gateway);
            thread::spawn(move || {
                let id = session(40_000 + n);
                assert!(registry.register(id));

                for i in 0..COMMANDS_PER_SESSION {
                    let command: &[u8] = match i % 4 {
                        0 => b"ON",
                        1 => b"OFF",
                        2 => b"QUIET",
                        _ => b"BOGUS",
                    };
                    let response = gateway.process(command).unwrap();
                    registry.log_command(
                        id,
                        String::from_utf8_lossy(command),
                        String::from_utf8_lossy(&response).trim(),
                    );
                }

                assert!(registry.deregister(id));
            })
        })
        .collect();

    for worker in workers {
        worker.join().unwrap();
    }

    let total = usize::from(SESSIONS) * COMMANDS_PER_SESSION;
    let snapshot = registry.snapshot();

    // Oracle: every exchange counted exactly once
    assert_eq!(snapshot.counters.commands, total as u64);
    assert_eq!(snapshot.counters.connections, u64::from(SESSIONS));
    assert!(snapshot.sessions.is_empty());

    // Oracle: errors match the BOGUS share of traffic
    let bogus_per_session = (0..COMMANDS_PER_SESSION).filter(|i| i % 4 == 3).count();
    assert_eq!(snapshot.counters.errors, (bogus_per_session * usize::from(SESSIONS)) as u64);

    // Oracle: the log holds the most recent window, never more than capacity
    assert_eq!(snapshot.log.len(), total.min(COMMAND_LOG_CAPACITY));

    // Oracle: device saw every command
    let state: HashMap<_, _> = gateway.try_state().unwrap().into_iter().collect();
    assert_eq!(state["processed"], total.to_string());
}

#[test]
fn per_session_log_counts_sum_to_total() {
    const SESSIONS: u16 = 4;
    const COMMANDS_PER_SESSION: usize = 20;

    let registry = Arc::new(Registry::new());
    let gateway = Arc::new(EmulationGateway::new(ToggleEngine {
        power: false,
        processed: 0,
        inside: Arc::new(AtomicUsize::new(0)),
    }));

    let workers: Vec<_> = (0..SESSIONS)
        .map(|n| {
            let registry = Arc::clone(&registry);
            let gateway = Arc::clone(&gateway);
            thread::spawn(move || {
                let id = session(41_000 + n);
                registry.register(id);
                for _ in 0..COMMANDS_PER_SESSION {
                    let response = gateway.process(b"ON").unwrap();
                    registry.log_command(id, "ON", String::from_utf8_lossy(&response).trim());
                }
                registry.deregister(id);
            })
        })
        .collect();

    for worker in workers {
        worker.join().unwrap();
    }

    let log = registry.snapshot_log(usize::MAX);
    let mut per_session: HashMap<SessionId, usize> = HashMap::new();
    for entry in &log {
        *per_session.entry(entry.session).or_default() += 1;
    }

    assert_eq!(per_session.len(), usize::from(SESSIONS));
    assert!(per_session.values().all(|&n| n == COMMANDS_PER_SESSION));
    assert_eq!(per_session.values().sum::<usize>() as u64, registry.snapshot_counters().commands);
}
