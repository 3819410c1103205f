//! Serde model of a protocol definition file.
//!
//! Definitions are plain JSON. Every section except `device` and `commands`
//! may be omitted; defaults describe a device that terminates lines with a
//! carriage return and ignores input it does not understand.

use std::{collections::BTreeMap, fmt};

use serde::Deserialize;

/// A complete device protocol.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ProtocolDefinition {
    /// Who makes the device and what it is called.
    pub device: DeviceInfo,
    /// Line framing.
    #[serde(default)]
    pub protocol: Framing,
    /// Network settings declared by the vendor.
    #[serde(default)]
    pub connection: Option<Connection>,
    /// Replies for input the device rejects.
    #[serde(default)]
    pub errors: ErrorReplies,
    /// Tracked state before any command arrives.
    #[serde(default)]
    pub initial_state: BTreeMap<String, Scalar>,
    /// Commands keyed by name.
    pub commands: BTreeMap<String, CommandDef>,
}

impl ProtocolDefinition {
    /// Manufacturer and model joined for display.
    pub fn device_name(&self) -> String {
        format!("{} {}", self.device.manufacturer, self.device.model)
    }

    /// TCP port declared in `connection.ip.port`, if any.
    pub fn default_port(&self) -> Option<u16> {
        self.connection.as_ref()?.ip.as_ref().map(|ip| ip.port)
    }
}

/// Device identity.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DeviceInfo {
    /// Manufacturer name.
    pub manufacturer: String,
    /// Model name.
    pub model: String,
}

/// Line framing of the wire protocol.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Framing {
    /// End-of-line marker appended to every reply. Empty when templates carry
    /// their own terminator.
    #[serde(default = "default_eol")]
    pub eol: String,
}

impl Default for Framing {
    fn default() -> Self {
        Self { eol: default_eol() }
    }
}

fn default_eol() -> String {
    "\r".to_string()
}

/// `connection` section.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Connection {
    /// IP transport settings.
    #[serde(default)]
    pub ip: Option<IpSettings>,
}

/// `connection.ip` section.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct IpSettings {
    /// Vendor default TCP port.
    pub port: u16,
}

/// `errors` section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ErrorReplies {
    /// Template sent for unmatched or out-of-range input. `{command}` expands
    /// to the offending input. Absent means the device stays silent.
    #[serde(default)]
    pub invalid: Option<String>,
}

/// One command of the device.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CommandDef {
    /// Human description.
    #[serde(default)]
    pub description: String,
    /// Grouping label.
    #[serde(default)]
    pub category: String,
    /// Wire syntax with `{arg}` placeholders.
    pub command: String,
    /// Argument constraints keyed by placeholder name.
    #[serde(default)]
    pub args: BTreeMap<String, ArgDef>,
    /// State updates applied when the command matches. Values are templates.
    #[serde(default)]
    pub state_change: BTreeMap<String, String>,
    /// Reply definition. Absent means the command is acknowledged silently.
    #[serde(default)]
    pub response: Option<ResponseDef>,
}

/// Constraints for one argument.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ArgDef {
    /// Value type.
    #[serde(rename = "type", default)]
    pub kind: ArgKind,
    /// Inclusive lower bound for integers.
    #[serde(default)]
    pub min: Option<i64>,
    /// Inclusive upper bound for integers.
    #[serde(default)]
    pub max: Option<i64>,
    /// Value used by state templates when the argument is not in the command.
    #[serde(default)]
    pub default: Option<Scalar>,
}

impl ArgDef {
    /// Whether `value` satisfies the declared bounds.
    pub fn in_range(&self, value: i64) -> bool {
        self.min.is_none_or(|min| value >= min) && self.max.is_none_or(|max| value <= max)
    }
}

/// Argument value type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArgKind {
    /// Optionally signed decimal integer.
    Int,
    /// Any non-empty text.
    #[default]
    String,
}

impl fmt::Display for ArgKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int => f.write_str("int"),
            Self::String => f.write_str("string"),
        }
    }
}

/// `response` section of a command.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ResponseDef {
    /// Reply template, rendered from arguments and state.
    #[serde(default)]
    pub template: Option<String>,
    /// Regex describing the reply, for documentation.
    #[serde(default)]
    pub pattern: Option<String>,
}

/// A JSON scalar used for state values and defaults.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    /// Integer value.
    Int(i64),
    /// Boolean value, rendered as `on`/`off`.
    Bool(bool),
    /// Text value.
    Text(String),
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(n) => write!(f, "{n}"),
            Self::Bool(true) => f.write_str("on"),
            Self::Bool(false) => f.write_str("off"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_definition_uses_defaults() {
        let def: ProtocolDefinition = serde_json::from_str(
            r#"{
                "device": {"manufacturer": "Acme", "model": "A1"},
                "commands": {"on": {"command": "ON"}}
            }"#,
        )
        .unwrap();

        assert_eq!(def.protocol.eol, "\r");
        assert_eq!(def.default_port(), None);
        assert_eq!(def.errors.invalid, None);
        assert_eq!(def.device_name(), "Acme A1");
        assert_eq!(def.commands["on"].response, None);
    }

    #[test]
    fn scalars_render_for_the_wire() {
        let state: BTreeMap<String, Scalar> =
            serde_json::from_str(r#"{"a": 5, "b": true, "c": "HDMI1", "d": -30}"#).unwrap();

        let rendered: Vec<_> = state.values().map(ToString::to_string).collect();
        assert_eq!(rendered, vec!["5", "on", "HDMI1", "-30"]);
    }

    #[test]
    fn range_bounds_are_inclusive() {
        let arg = ArgDef { kind: ArgKind::Int, min: Some(0), max: Some(10), default: None };

        assert!(arg.in_range(0));
        assert!(arg.in_range(10));
        assert!(!arg.in_range(-1));
        assert!(!arg.in_range(11));
    }

    #[test]
    fn declared_port_is_exposed() {
        let def: ProtocolDefinition = serde_json::from_str(
            r#"{
                "device": {"manufacturer": "Acme", "model": "A1"},
                "connection": {"ip": {"port": 84}},
                "commands": {}
            }"#,
        )
        .unwrap();

        assert_eq!(def.default_port(), Some(84));
    }
}
