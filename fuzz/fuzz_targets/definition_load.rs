//! Fuzz target for protocol definition loading
//!
//! Loads arbitrary text as a protocol definition and, when it parses,
//! compiles it into a device model and sends it one buffer.
//!
//! # Invariants
//!
//! - Malformed JSON returns `ProtocolError::Invalid`, never panics
//! - Bad templates return `ProtocolError::Template`, never panic
//! - A compiled model never panics on input

#![no_main]

use avemu_core::ProtocolEngine;
use avemu_protocol::{DeviceEmulator, ProtocolLibrary, extract_metadata};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: (&str, &[u8])| {
    let (json, input) = data;
    let library = ProtocolLibrary::default().with_definition("fuzz/device", json);

    let Ok(definition) = library.load("fuzz/device") else {
        return;
    };
    let _ = extract_metadata("fuzz/device", &definition);

    let Ok(mut emulator) = DeviceEmulator::new(&definition) else {
        return;
    };
    let _ = emulator.process(input);
});
