//! Protocol loading errors.

use thiserror::Error;

/// Errors raised while loading or compiling a protocol definition.
///
/// All of these are fatal at startup: the emulator cannot run without a
/// usable device model.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// No bundled definition has this identifier.
    #[error("unknown protocol '{0}'")]
    NotFound(String),

    /// The definition exists but is not valid JSON for the schema.
    #[error("invalid protocol definition '{id}': {source}")]
    Invalid {
        /// Protocol identifier.
        id: String,
        /// Parse failure.
        #[source]
        source: serde_json::Error,
    },

    /// A command template cannot be compiled.
    #[error("bad template '{template}' in command '{command}': {reason}")]
    Template {
        /// Command name.
        command: String,
        /// Offending template.
        template: String,
        /// What is wrong with it.
        reason: String,
    },
}
