//! Built-in protocol engine for the A/V emulator.
//!
//! Devices are described declaratively in JSON: framing, commands with
//! `{placeholder}` templates, argument ranges, state updates and reply
//! templates. [`ProtocolLibrary`] ships a set of definitions inside the
//! binary, [`DeviceEmulator`] turns one into a [`avemu_core::ProtocolEngine`],
//! and [`extract_metadata`] flattens one for the console.
//!
//! # Example
//!
//! ```
//! use avemu_core::ProtocolEngine;
//! use avemu_protocol::{DeviceEmulator, ProtocolLibrary};
//!
//! let definition = ProtocolLibrary::bundled().load("lyngdorf_cd2")?;
//! let mut device = DeviceEmulator::new(&definition)?;
//!
//! assert_eq!(device.process(b"!ON\r")?, b"!ON\r");
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod emulator;
mod error;
mod library;
mod metadata;
pub mod schema;
mod template;

pub use emulator::DeviceEmulator;
pub use error::ProtocolError;
pub use library::{ProtocolLibrary, normalize_protocol_id};
pub use metadata::extract_metadata;
pub use schema::ProtocolDefinition;
pub use template::Template;
