//! `{placeholder}` templates.
//!
//! The same template text is used two ways: compiled into an anchored regex to
//! recognise incoming commands, and rendered with values to build replies and
//! state updates.

use std::collections::BTreeMap;

use avemu_core::EngineError;
use regex::Regex;

use crate::schema::{ArgDef, ArgKind};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Placeholder(String),
}

/// A parsed template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    source: String,
    segments: Vec<Segment>,
}

impl Template {
    /// Parse `source`. Fails on an unclosed `{` or a placeholder name that is
    /// not an identifier.
    pub fn parse(source: &str) -> Result<Self, String> {
        let mut segments = Vec::new();
        let mut rest = source;

        while let Some(open) = rest.find('{') {
            if open > 0 {
                segments.push(Segment::Literal(rest[..open].to_string()));
            }

            let after = &rest[open + 1..];
            let Some(close) = after.find('}') else {
                return Err(format!("unclosed '{{' at offset {}", source.len() - rest.len() + open));
            };

            let name = &after[..close];
            if !is_identifier(name) {
                return Err(format!("invalid placeholder name '{name}'"));
            }
            segments.push(Segment::Placeholder(name.to_string()));
            rest = &after[close + 1..];
        }

        if !rest.is_empty() {
            segments.push(Segment::Literal(rest.to_string()));
        }

        Ok(Self { source: source.to_string(), segments })
    }

    /// Original template text.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Placeholder names in order of appearance.
    pub fn placeholders(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|segment| match segment {
            Segment::Placeholder(name) => Some(name.as_str()),
            Segment::Literal(_) => None,
        })
    }

    /// Substitute every placeholder through `lookup`.
    pub fn render(&self, lookup: impl Fn(&str) -> Option<String>) -> Result<String, EngineError> {
        let mut out = String::with_capacity(self.source.len());
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Placeholder(name) => {
                    let value = lookup(name).ok_or_else(|| EngineError::Render {
                        template: self.source.clone(),
                        placeholder: name.clone(),
                    })?;
                    out.push_str(&value);
                },
            }
        }
        Ok(out)
    }

    /// Anchored regex recognising this template as a command.
    ///
    /// Integer arguments capture an optionally signed decimal; everything else
    /// captures a non-empty run. Framing characters (whitespace and control
    /// bytes) at either end of the template are not part of the match, since
    /// incoming commands are stripped of them before matching.
    pub fn matcher(&self, args: &BTreeMap<String, ArgDef>) -> Result<Regex, String> {
        let last = self.segments.len().saturating_sub(1);
        let mut pattern = String::from("^");

        for (i, segment) in self.segments.iter().enumerate() {
            match segment {
                Segment::Literal(text) => {
                    let mut text = text.as_str();
                    if i == 0 {
                        text = text.trim_start_matches(is_framing);
                    }
                    if i == last {
                        text = text.trim_end_matches(is_framing);
                    }
                    pattern.push_str(&regex::escape(text));
                },
                Segment::Placeholder(name) => {
                    let kind = args.get(name).map(|arg| arg.kind).unwrap_or_default();
                    let body = match kind {
                        ArgKind::Int => r"-?\d+",
                        ArgKind::String => ".+?",
                    };
                    pattern.push_str(&format!("(?P<{name}>{body})"));
                },
            }
        }

        pattern.push('$');
        Regex::new(&pattern).map_err(|e| e.to_string())
    }
}

/// Whitespace or control character surrounding a command on the wire.
pub fn is_framing(c: char) -> bool {
    c.is_whitespace() || c.is_control()
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    chars.next().is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
