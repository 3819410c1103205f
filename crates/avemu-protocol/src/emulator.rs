//! Stateful device model driven by a [`ProtocolDefinition`].

use std::collections::BTreeMap;

use avemu_core::{EngineError, ProtocolEngine};
use regex::{Captures, Regex};

use crate::{
    ProtocolError,
    schema::{ArgDef, ArgKind, CommandDef, ProtocolDefinition},
    template::{Template, is_framing},
};

/// A command compiled for matching.
#[derive(Debug)]
struct CompiledCommand {
    name: String,
    matcher: Regex,
    args: BTreeMap<String, ArgDef>,
    state_change: Vec<(String, Template)>,
    response: Option<Template>,
}

impl CompiledCommand {
    fn compile(name: &str, def: &CommandDef) -> Result<Self, ProtocolError> {
        let bad = |template: &str, reason: String| ProtocolError::Template {
            command: name.to_string(),
            template: template.to_string(),
            reason,
        };

        let command = Template::parse(&def.command).map_err(|r| bad(&def.command, r))?;
        let matcher = command.matcher(&def.args).map_err(|r| bad(&def.command, r))?;

        let mut state_change = Vec::with_capacity(def.state_change.len());
        for (key, value) in &def.state_change {
            let template = Template::parse(value).map_err(|r| bad(value, r))?;
            state_change.push((key.clone(), template));
        }

        let response = match def.response.as_ref().and_then(|r| r.template.as_deref()) {
            Some(text) => Some(Template::parse(text).map_err(|r| bad(text, r))?),
            None => None,
        };

        Ok(Self { name: name.to_string(), matcher, args: def.args.clone(), state_change, response })
    }

    /// Argument values from a match, or `None` if an integer is out of range.
    fn bind(&self, caps: &Captures<'_>) -> Option<BTreeMap<String, String>> {
        let mut values = BTreeMap::new();

        for (name, arg) in &self.args {
            match caps.name(name) {
                Some(m) if arg.kind == ArgKind::Int => {
                    let value: i64 = m.as_str().parse().ok()?;
                    if !arg.in_range(value) {
                        return None;
                    }
                    values.insert(name.clone(), value.to_string());
                },
                Some(m) => {
                    values.insert(name.clone(), m.as_str().to_string());
                },
                None => {
                    if let Some(default) = &arg.default {
                        values.insert(name.clone(), default.to_string());
                    }
                },
            }
        }

        // Placeholders without a declared arg are free-form strings
        for name in self.matcher.capture_names().flatten() {
            if values.contains_key(name) {
                continue;
            }
            if let Some(m) = caps.name(name) {
                values.insert(name.to_string(), m.as_str().to_string());
            }
        }

        Some(values)
    }
}

/// Outcome of matching one input against the command table.
enum Dispatch {
    /// Index of the command and its bound argument values.
    Matched(usize, BTreeMap<String, String>),
    Rejected,
}

/// The built-in protocol engine.
///
/// Holds the tracked device state and answers commands according to the
/// definition it was built from.
#[derive(Debug)]
pub struct DeviceEmulator {
    eol: String,
    invalid: Option<Template>,
    commands: Vec<CompiledCommand>,
    state: BTreeMap<String, String>,
}

impl DeviceEmulator {
    /// Compile `definition` and start from its initial state.
    pub fn new(definition: &ProtocolDefinition) -> Result<Self, ProtocolError> {
        let commands = definition
            .commands
            .iter()
            .map(|(name, def)| CompiledCommand::compile(name, def))
            .collect::<Result<Vec<_>, _>>()?;

        let invalid = match &definition.errors.invalid {
            Some(text) => Some(Template::parse(text).map_err(|reason| ProtocolError::Template {
                command: "errors.invalid".to_string(),
                template: text.clone(),
                reason,
            })?),
            None => None,
        };

        let state = definition
            .initial_state
            .iter()
            .map(|(key, value)| (key.clone(), value.to_string()))
            .collect();

        Ok(Self { eol: definition.protocol.eol.clone(), invalid, commands, state })
    }

    /// End-of-line marker appended to replies.
    pub fn eol(&self) -> &str {
        &self.eol
    }

    /// Name of the command `input` would run, if any.
    pub fn match_command(&self, input: &[u8]) -> Option<&str> {
        let text = String::from_utf8_lossy(input);
        match self.dispatch(self.strip(&text)) {
            Dispatch::Matched(index, _) => Some(&self.commands[index].name),
            Dispatch::Rejected => None,
        }
    }

    /// Current value of a tracked state key.
    pub fn state_value(&self, key: &str) -> Option<&str> {
        self.state.get(key).map(String::as_str)
    }

    /// Input with surrounding framing and the protocol EOL removed.
    fn strip<'t>(&self, text: &'t str) -> &'t str {
        let text = text.trim_matches(is_framing);
        let text = match self.eol.as_str() {
            "" => text,
            eol => text.strip_suffix(eol).unwrap_or(text),
        };
        text.trim_matches(is_framing)
    }

    fn dispatch(&self, text: &str) -> Dispatch {
        for (index, cmd) in self.commands.iter().enumerate() {
            if let Some(caps) = cmd.matcher.captures(text) {
                return match cmd.bind(&caps) {
                    Some(values) => Dispatch::Matched(index, values),
                    None => Dispatch::Rejected,
                };
            }
        }
        Dispatch::Rejected
    }

    fn lookup(&self, values: &BTreeMap<String, String>, name: &str) -> Option<String> {
        values.get(name).or_else(|| self.state.get(name)).cloned()
    }

    fn terminate(&self, mut reply: String) -> Vec<u8> {
        reply.push_str(&self.eol);
        reply.into_bytes()
    }
}

impl ProtocolEngine for DeviceEmulator {
    fn process(&mut self, command: &[u8]) -> Result<Vec<u8>, EngineError> {
        let text = String::from_utf8_lossy(command);
        let text = self.strip(&text);

        let (index, values) = match self.dispatch(text) {
            Dispatch::Matched(index, values) => (index, values),
            Dispatch::Rejected => {
                tracing::debug!(command = %text, "no matching command");
                let Some(invalid) = &self.invalid else {
                    return Ok(Vec::new());
                };
                let reply = invalid.render(|name| (name == "command").then(|| text.to_string()))?;
                return Ok(self.terminate(reply));
            },
        };

        let cmd = &self.commands[index];
        let mut updates = Vec::with_capacity(cmd.state_change.len());
        for (key, template) in &cmd.state_change {
            updates.push((key.clone(), template.render(|n| self.lookup(&values, n))?));
        }
        tracing::debug!(command = %cmd.name, "matched");

        // Replies see the state after this command's updates
        self.state.extend(updates);

        match &self.commands[index].response {
            Some(template) => {
                let reply = template.render(|n| self.lookup(&values, n))?;
                Ok(self.terminate(reply))
            },
            None => Ok(Vec::new()),
        }
    }

    fn state(&self) -> Vec<(String, String)> {
        self.state.iter().map(|(k, v)| (k.clone(), v.clone())).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn definition(json: &str) -> ProtocolDefinition {
        serde_json::from_str(json).unwrap()
    }

    fn amp() -> DeviceEmulator {
        DeviceEmulator::new(&definition(
            r#"{
                "device": {"manufacturer": "Acme", "model": "Amp"},
                "protocol": {"eol": "\r"},
                "errors": {"invalid": "ERROR {command}"},
                "initial_state": {"power": "off", "volume": 10},
                "commands": {
                    "power_on": {
                        "command": "!ON",
                        "state_change": {"power": "on"},
                        "response": {"template": "!ON"}
                    },
                    "volume_set": {
                        "command": "!VOL({volume})",
                        "args": {"volume": {"type": "int", "min": 0, "max": 50}},
                        "state_change": {"volume": "{volume}"},
                        "response": {"template": "!VOL({volume})"}
                    },
                    "state_query": {
                        "command": "!STATE?",
                        "response": {"template": "!STATE({power},{volume})"}
                    },
                    "silent": {"command": "!QUIET"}
                }
            }"#,
        ))
        .unwrap()
    }

    #[test]
    fn matched_command_updates_state_and_replies() {
        let mut emu = amp();

        assert_eq!(emu.process(b"!ON\r").unwrap(), b"!ON\r");
        assert_eq!(emu.state_value("power"), Some("on"));

        assert_eq!(emu.process(b"!VOL(25)\r\n").unwrap(), b"!VOL(25)\r");
        assert_eq!(emu.process(b"!STATE?").unwrap(), b"!STATE(on,25)\r");
    }

    #[test]
    fn out_of_range_renders_invalid_reply() {
        let mut emu = amp();

        assert_eq!(emu.process(b"!VOL(999)\r").unwrap(), b"ERROR !VOL(999)\r");
        assert_eq!(emu.state_value("volume"), Some("10"));
    }

    #[test]
    fn unknown_command_renders_invalid_reply() {
        let mut emu = amp();
        assert_eq!(emu.process(b"!BADCMD\r").unwrap(), b"ERROR !BADCMD\r");
    }

    #[test]
    fn command_without_response_is_silent() {
        let mut emu = amp();
        assert!(emu.process(b"!QUIET\r").unwrap().is_empty());
    }

    #[test]
    fn ignores_invalid_input_without_error_template() {
        let mut emu = DeviceEmulator::new(&definition(
            r#"{
                "device": {"manufacturer": "Acme", "model": "Quiet"},
                "commands": {"on": {"command": "PWON", "response": {"template": "PWON"}}}
            }"#,
        ))
        .unwrap();

        assert!(emu.process(b"NONSENSE\r").unwrap().is_empty());
        assert!(emu.process(b"\r").unwrap().is_empty());
        assert_eq!(emu.process(b"PWON\r").unwrap(), b"PWON\r");
    }

    #[test]
    fn custom_eol_is_stripped_and_appended() {
        let mut emu = DeviceEmulator::new(&definition(
            r#"{
                "device": {"manufacturer": "Acme", "model": "Semi"},
                "protocol": {"eol": ";"},
                "commands": {"on": {"command": "Z1POW1", "response": {"template": "Z1POW1"}}}
            }"#,
        ))
        .unwrap();

        assert_eq!(emu.process(b"Z1POW1;").unwrap(), b"Z1POW1;");
        assert_eq!(emu.match_command(b"Z1POW1;\r\n"), Some("on"));
    }

    #[test]
    fn missing_state_value_is_an_engine_error() {
        let mut emu = DeviceEmulator::new(&definition(
            r#"{
                "device": {"manufacturer": "Acme", "model": "Broken"},
                "commands": {"q": {"command": "Q?", "response": {"template": "Q{nothing}"}}}
            }"#,
        ))
        .unwrap();

        assert!(matches!(emu.process(b"Q?").unwrap_err(), EngineError::Render { .. }));
    }

    #[test]
    fn bad_template_fails_construction() {
        let err = DeviceEmulator::new(&definition(
            r#"{
                "device": {"manufacturer": "Acme", "model": "Broken"},
                "commands": {"vol": {"command": "VOL{volume"}}
            }"#,
        ))
        .unwrap_err();

        assert!(matches!(err, ProtocolError::Template { ref command, .. } if command == "vol"));
    }

    #[test]
    fn state_snapshot_is_sorted_by_key() {
        let emu = amp();
        assert_eq!(
            emu.state(),
            vec![("power".to_string(), "off".to_string()), ("volume".to_string(), "10".to_string())]
        );
    }
}
