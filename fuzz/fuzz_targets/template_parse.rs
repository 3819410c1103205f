//! Fuzz target for Template::parse
//!
//! Feeds arbitrary strings to the template parser, then renders and compiles
//! whatever parses.
//!
//! # Invariants
//!
//! - Parsing never panics, malformed templates return `Err`
//! - A parsed template renders with every placeholder resolved and no braces
//!   left from placeholders
//! - Building a matcher never panics, whatever the argument types

#![no_main]

use std::collections::BTreeMap;

use avemu_protocol::{
    Template,
    schema::{ArgDef, ArgKind},
};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &str| {
    let Ok(template) = Template::parse(data) else {
        return;
    };

    let rendered = template.render(|name| Some(format!("<{name}>")));
    assert!(rendered.is_ok(), "every placeholder was resolvable");

    let args: BTreeMap<String, ArgDef> = template
        .placeholders()
        .enumerate()
        .map(|(i, name)| {
            let kind = if i % 2 == 0 { ArgKind::Int } else { ArgKind::String };
            (name.to_string(), ArgDef { kind, min: None, max: None, default: None })
        })
        .collect();

    let _ = template.matcher(&args);
});
