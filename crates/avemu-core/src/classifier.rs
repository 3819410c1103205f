//! Response classification.
//!
//! Devices report rejected commands in many shapes (`ERROR`, `!E(..)`, `NAK`,
//! free text). The classifier only feeds the console and the error counter;
//! a flagged response is still a valid emulated reply.

/// How a pattern is tested against the uppercased response.
#[derive(Debug, Clone, Copy)]
enum ErrorPattern {
    Prefix(&'static str),
    Contains(&'static str),
}

impl ErrorPattern {
    fn matches(self, upper: &str) -> bool {
        match self {
            Self::Prefix(p) => upper.starts_with(p),
            Self::Contains(p) => upper.contains(p),
        }
    }
}

const ERROR_PATTERNS: [ErrorPattern; 6] = [
    ErrorPattern::Prefix("ERROR"),
    ErrorPattern::Contains("ERR"),
    ErrorPattern::Prefix("!E("),
    ErrorPattern::Contains("INVALID"),
    ErrorPattern::Contains("UNKNOWN"),
    ErrorPattern::Prefix("NAK"),
];

/// Whether a decoded response looks like a device-side rejection.
///
/// Case-insensitive. The empty response is never an error.
pub fn is_error_response(response: &str) -> bool {
    if response.is_empty() {
        return false;
    }

    let upper = response.to_uppercase();
    ERROR_PATTERNS.iter().any(|pattern| pattern.matches(&upper))
}
