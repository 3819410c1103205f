//! Fuzz target for DeviceEmulator::process
//!
//! Replays sequences of client buffers against every bundled protocol.
//!
//! # Strategy
//!
//! - Random bytes: arbitrary buffers, including invalid UTF-8
//! - Known command: a real command syntax with fuzzed argument text
//! - Framing: known commands wrapped in stray whitespace, control bytes and
//!   doubled EOL markers
//!
//! # Invariants
//!
//! - `process` never panics and never returns `Err` for bundled protocols
//! - A non-empty reply ends with the protocol's EOL marker

#![no_main]

use arbitrary::Arbitrary;
use avemu_core::{ProtocolEngine, ProtocolMetadata};
use avemu_protocol::{DeviceEmulator, ProtocolLibrary, extract_metadata};
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Clone, Arbitrary)]
struct Session {
    protocol: u8,
    inputs: Vec<Input>,
}

#[derive(Debug, Clone, Arbitrary)]
enum Input {
    RandomBytes(Vec<u8>),
    KnownCommand { command: u8, arg: String },
    Framed { command: u8, prefix: Vec<u8>, eol_repeats: u8 },
}

fuzz_target!(|session: Session| {
    let library = ProtocolLibrary::bundled();
    let ids = library.list_protocols();
    let id = ids[usize::from(session.protocol) % ids.len()];

    let Ok(definition) = library.load(id) else {
        panic!("bundled protocol {id} must load");
    };
    let Ok(mut emulator) = DeviceEmulator::new(&definition) else {
        panic!("bundled protocol {id} must compile");
    };
    let metadata = extract_metadata(id, &definition);
    let eol = emulator.eol().to_string();

    for input in session.inputs.into_iter().take(64) {
        let buffer = match input {
            Input::RandomBytes(bytes) => bytes,
            Input::KnownCommand { command, arg } => {
                let filled = fill_placeholders(syntax(&metadata, command), &arg);
                format!("{filled}{eol}").into_bytes()
            },
            Input::Framed { command, prefix, eol_repeats } => {
                let mut bytes = prefix;
                bytes.extend_from_slice(fill_placeholders(syntax(&metadata, command), "1").as_bytes());
                for _ in 0..(eol_repeats % 4) {
                    bytes.extend_from_slice(eol.as_bytes());
                }
                bytes
            },
        };

        let reply = match emulator.process(&buffer) {
            Ok(reply) => reply,
            Err(e) => panic!("bundled protocol {id} failed: {e}"),
        };

        if !reply.is_empty() && !eol.is_empty() {
            assert!(reply.ends_with(eol.as_bytes()), "reply must end with EOL");
        }
    }
});

/// Syntax of the command at `idx`, wrapping around the command list.
fn syntax(metadata: &ProtocolMetadata, idx: u8) -> &str {
    let commands = &metadata.commands;
    &commands[usize::from(idx) % commands.len()].syntax
}

/// Replace every `{name}` in `syntax` with `value`.
fn fill_placeholders(syntax: &str, value: &str) -> String {
    let mut out = String::with_capacity(syntax.len());
    let mut rest = syntax;
    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        match rest[start..].find('}') {
            Some(end) => {
                out.push_str(value);
                rest = &rest[start + end + 1..];
            },
            None => {
                rest = &rest[start..];
                break;
            },
        }
    }
    out.push_str(rest);
    out
}
