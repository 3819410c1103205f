//! Read-only description of the loaded protocol.
//!
//! Extracted once from the protocol definition at startup and never mutated
//! afterwards; the console browses it and suggestion matching ranks against
//! it.

/// One argument of a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArgInfo {
    /// Argument name as used in the command template.
    pub name: String,
    /// Declared type (`int`, `string`, ...).
    pub kind: String,
    /// Inclusive lower bound, if declared.
    pub min: Option<i64>,
    /// Inclusive upper bound, if declared.
    pub max: Option<i64>,
    /// Default value, rendered for display.
    pub default: Option<String>,
}

/// One command of the protocol, flattened for display.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandInfo {
    /// Command name (key in the protocol definition).
    pub name: String,
    /// Human description.
    pub description: String,
    /// Grouping label.
    pub category: String,
    /// Wire syntax with placeholders, e.g. `!VOL({volume})`.
    pub syntax: String,
    /// Arguments in declaration order.
    pub args: Vec<ArgInfo>,
    /// State keys this command sets, with the value template.
    pub state_changes: Vec<(String, String)>,
    /// Regex-style pattern of the reply, if declared.
    pub response_pattern: String,
    /// Template of the reply, if declared.
    pub response_template: String,
}

impl CommandInfo {
    /// Create a command with only a name and syntax.
    pub fn new(name: impl Into<String>, syntax: impl Into<String>) -> Self {
        Self { name: name.into(), syntax: syntax.into(), ..Self::default() }
    }

    /// Set the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Whether the name or description contains `query`, ignoring case.
    ///
    /// `query` must already be lowercase.
    pub fn matches_query(&self, query: &str) -> bool {
        self.name.to_lowercase().contains(query) || self.description.to_lowercase().contains(query)
    }

    /// The reply shown in listings: template if present, else pattern.
    pub fn response_display(&self) -> &str {
        if self.response_template.is_empty() {
            &self.response_pattern
        } else {
            &self.response_template
        }
    }
}

/// Immutable protocol snapshot handed to the console.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProtocolMetadata {
    /// Protocol identifier (`manufacturer/model`).
    pub id: String,
    /// Display name of the device.
    pub device_name: String,
    /// Default TCP port declared by the protocol.
    pub default_port: Option<u16>,
    /// End-of-line marker appended to replies.
    pub eol: String,
    /// Commands sorted by name.
    pub commands: Vec<CommandInfo>,
}

impl ProtocolMetadata {
    /// Commands whose name or description contains `query`, ignoring case.
    ///
    /// An empty query returns every command.
    pub fn filter_commands(&self, query: &str) -> Vec<&CommandInfo> {
        if query.is_empty() {
            return self.commands.iter().collect();
        }

        let query = query.to_lowercase();
        self.commands.iter().filter(|cmd| cmd.matches_query(&query)).collect()
    }

    /// Every command name and raw syntax, for suggestion matching.
    pub fn command_syntaxes(&self) -> Vec<&str> {
        let mut syntaxes = Vec::with_capacity(self.commands.len() * 2);
        for cmd in &self.commands {
            syntaxes.push(cmd.name.as_str());
            if !cmd.syntax.is_empty() {
                syntaxes.push(cmd.syntax.as_str());
            }
        }
        syntaxes
    }
}
