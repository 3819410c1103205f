//! Device-model seam.
//!
//! The emulator core never interprets command payloads. It hands raw bytes to
//! a [`ProtocolEngine`] and forwards whatever comes back.

use thiserror::Error;

/// Failure raised by a protocol engine while processing a command.
///
/// Engine failures are not device rejections: a device that rejects a command
/// answers with a (possibly empty) response. These errors mean the engine
/// itself could not produce an answer.
#[derive(Debug, Error)]
pub enum EngineError {
    /// A response or state template referenced a value that does not exist.
    #[error("cannot render template '{template}': no value for '{placeholder}'")]
    Render {
        /// Template being rendered.
        template: String,
        /// Placeholder without a value.
        placeholder: String,
    },

    /// Any other engine-specific failure.
    #[error("engine failure: {0}")]
    Other(String),
}

/// A stateful device model driven by raw command buffers.
///
/// One instance represents the single emulated device for the whole process.
/// Implementations do not need interior locking; callers go through
/// [`crate::EmulationGateway`], which guarantees exclusive access.
pub trait ProtocolEngine: Send {
    /// Process one command buffer and return the raw response.
    ///
    /// An empty response means the protocol defines no reply for this input
    /// and nothing must be sent back.
    fn process(&mut self, command: &[u8]) -> Result<Vec<u8>, EngineError>;

    /// Tracked device state as ordered key/value pairs, for display only.
    fn state(&self) -> Vec<(String, String)> {
        Vec::new()
    }
}

impl<E: ProtocolEngine + ?Sized> ProtocolEngine for Box<E> {
    fn process(&mut self, command: &[u8]) -> Result<Vec<u8>, EngineError> {
        (**self).process(command)
    }

    fn state(&self) -> Vec<(String, String)> {
        (**self).state()
    }
}
