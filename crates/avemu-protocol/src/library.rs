//! Bundled protocol definitions.

use std::{borrow::Cow, collections::BTreeMap};

use crate::{ProtocolError, schema::ProtocolDefinition};

/// Definitions compiled into the binary, keyed by `manufacturer/model`.
const BUNDLED: &[(&str, &str)] = &[
    ("anthem/mrx", include_str!("../protocols/anthem/mrx.json")),
    ("denon/avr", include_str!("../protocols/denon/avr.json")),
    ("lyngdorf/cd2", include_str!("../protocols/lyngdorf/cd2.json")),
    ("mcintosh/mx160", include_str!("../protocols/mcintosh/mx160.json")),
];

/// Accept `manufacturer_model` as well as `manufacturer/model`.
pub fn normalize_protocol_id(id: &str) -> String {
    id.replace('_', "/")
}

/// Lookup table of protocol definitions.
#[derive(Debug, Clone)]
pub struct ProtocolLibrary {
    sources: BTreeMap<String, Cow<'static, str>>,
}

impl Default for ProtocolLibrary {
    fn default() -> Self {
        Self::bundled()
    }
}

impl ProtocolLibrary {
    /// Library holding every bundled definition.
    pub fn bundled() -> Self {
        let sources =
            BUNDLED.iter().map(|(id, json)| ((*id).to_string(), Cow::Borrowed(*json))).collect();
        Self { sources }
    }

    /// Add or replace a definition from JSON text.
    #[must_use]
    pub fn with_definition(mut self, id: impl Into<String>, json: impl Into<String>) -> Self {
        self.sources.insert(id.into(), Cow::Owned(json.into()));
        self
    }

    /// Every known identifier in `manufacturer/model` form, sorted.
    pub fn list_protocols(&self) -> Vec<&str> {
        self.sources.keys().map(String::as_str).collect()
    }

    /// Parse the definition for `id` (either id form).
    pub fn load(&self, id: &str) -> Result<ProtocolDefinition, ProtocolError> {
        let id = normalize_protocol_id(id);
        let json = self.sources.get(&id).ok_or_else(|| ProtocolError::NotFound(id.clone()))?;

        serde_json::from_str(json).map_err(|source| ProtocolError::Invalid { id, source })
    }
}
