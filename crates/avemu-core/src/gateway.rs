//! Serialized access to the device model.
//!
//! The emulated device is one shared mutable object. Every session funnels its
//! commands through the same [`EmulationGateway`], so at most one call is ever
//! inside the engine. Ordering among sessions is whatever order they win the
//! lock in.

use std::{
    fmt,
    sync::{Mutex, PoisonError, TryLockError},
};

use crate::{EngineError, ProtocolEngine};

/// Exclusive gateway into the protocol engine.
///
/// The lock is held for exactly the duration of one engine call. Callers must
/// not perform socket I/O or take the registry lock while a call is in flight;
/// the gateway API makes that impossible by never handing out the guard.
pub struct EmulationGateway {
    engine: Mutex<Box<dyn ProtocolEngine>>,
}

impl EmulationGateway {
    /// Wrap an engine.
    pub fn new<E: ProtocolEngine + 'static>(engine: E) -> Self {
        Self { engine: Mutex::new(Box::new(engine)) }
    }

    /// Process one command buffer under the device lock.
    ///
    /// Engine errors are returned unchanged. A poisoned lock (an earlier call
    /// panicked) is recovered: the device keeps whatever state it had.
    pub fn process(&self, command: &[u8]) -> Result<Vec<u8>, EngineError> {
        let mut engine = self.engine.lock().unwrap_or_else(|poisoned| {
            tracing::warn!("device model lock poisoned by an earlier panic, recovering");
            PoisonError::into_inner(poisoned)
        });
        engine.process(command)
    }

    /// Tracked device state, if the device is not busy.
    ///
    /// Returns `None` when a command is currently being processed, so that
    /// display code never waits on the device model.
    pub fn try_state(&self) -> Option<Vec<(String, String)>> {
        match self.engine.try_lock() {
            Ok(engine) => Some(engine.state()),
            Err(TryLockError::Poisoned(poisoned)) => Some(poisoned.into_inner().state()),
            Err(TryLockError::WouldBlock) => None,
        }
    }
}

impl fmt::Debug for EmulationGateway {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EmulationGateway").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::{
        sync::{
            Arc,
            atomic::{AtomicUsize, Ordering},
        },
        thread,
        time::Duration,
    };

    use super::*;

    /// Engine that records how many callers are inside `process` at once.
    struct InstrumentedEngine {
        inside: Arc<AtomicUsize>,
        max_inside: Arc<AtomicUsize>,
        calls: usize,
    }

    impl ProtocolEngine for InstrumentedEngine {
        fn process(&mut self, command: &[u8]) -> Result<Vec<u8>, EngineError> {
            let now = self.inside.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_inside.fetch_max(now, Ordering::SeqCst);
            thread::sleep(Duration::from_millis(2));
            self.calls += 1;
            self.inside.fetch_sub(1, Ordering::SeqCst);
            Ok(command.to_vec())
        }

        fn state(&self) -> Vec<(String, String)> {
            vec![("calls".to_string(), self.calls.to_string())]
        }
    }

    struct FailingEngine;

    impl ProtocolEngine for FailingEngine {
        fn process(&mut self, _command: &[u8]) -> Result<Vec<u8>, EngineError> {
            Err(EngineError::Other("device model exploded".to_string()))
        }
    }

    #[test]
    fn never_more_than_one_call_inside_engine() {
        let inside = Arc::new(AtomicUsize::new(0));
        let max_inside = Arc::new(AtomicUsize::new(0));
        let gateway = Arc::new(EmulationGateway::new(InstrumentedEngine {
            inside: Arc::clone(&inside),
            max_inside: Arc::clone(&max_inside),
            calls: 0,
        }));

        let workers: Vec<_> = (0..8)
            .map(|worker| {
                let gateway = Arc::clone(&gateway);
                thread::spawn(move || {
                    for i in 0..5 {
                        let cmd = format!("W{worker}C{i}");
                        let response = gateway.process(cmd.as_bytes()).unwrap();
                        assert_eq!(response, cmd.as_bytes());
                    }
                })
            })
            .collect();

        for worker in workers {
            worker.join().unwrap();
        }

        assert_eq!(max_inside.load(Ordering::SeqCst), 1);
        assert_eq!(gateway.try_state(), Some(vec![("calls".to_string(), "40".to_string())]));
    }

    #[test]
    fn engine_errors_propagate_unchanged() {
        let gateway = EmulationGateway::new(FailingEngine);

        let err = gateway.process(b"!ON\r").unwrap_err();
        assert!(matches!(err, EngineError::Other(ref msg) if msg == "device model exploded"));
    }

    #[test]
    fn default_state_is_empty() {
        let gateway = EmulationGateway::new(FailingEngine);
        assert_eq!(gateway.try_state(), Some(Vec::new()));
    }
}
