//! Core of the A/V device emulator.
//!
//! Everything the emulator shares between connections lives here. The device
//! model itself is an external collaborator reached through the
//! [`ProtocolEngine`] trait; this crate only decides *how* it is reached.
//!
//! # Components
//!
//! - [`Registry`]: connected sessions, the bounded command log and counters,
//!   all behind one lock
//! - [`EmulationGateway`]: serializes every call into the device model
//! - [`is_error_response`]: best-effort classification of device replies
//! - [`ProtocolMetadata`]: read-only description of the loaded protocol, used
//!   by the console
//! - [`similar_commands`]: approximate matching of a rejected command against
//!   the protocol's known commands
//!
//! # Locking
//!
//! The registry and the gateway each own a separate mutex. Nothing in this
//! crate takes one while holding the other, and neither is held across I/O.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod classifier;
mod engine;
mod gateway;
mod metadata;
mod registry;
mod suggest;

pub use classifier::is_error_response;
pub use engine::{EngineError, ProtocolEngine};
pub use gateway::EmulationGateway;
pub use metadata::{ArgInfo, CommandInfo, ProtocolMetadata};
pub use registry::{
    COMMAND_LOG_CAPACITY, CommandLogEntry, Counters, Registry, RegistrySnapshot, SessionId,
};
pub use suggest::{MAX_SUGGESTIONS, SIMILARITY_CUTOFF, base_command, similar_commands};
