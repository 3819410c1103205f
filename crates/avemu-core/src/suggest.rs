//! Approximate command suggestions.
//!
//! When a client sends something the device rejects, the console offers the
//! closest known commands. Arguments are ignored on both sides: `!VOLL(5)` is
//! compared as `!VOLL` against `!VOL({volume})` compared as `!VOL`.

use std::cmp::Ordering;

/// Most suggestions returned for one command.
pub const MAX_SUGGESTIONS: usize = 3;

/// Minimum normalized similarity for a candidate to be suggested.
pub const SIMILARITY_CUTOFF: f64 = 0.4;

/// The command name without arguments: everything before the first `(`,
/// `{` or digit, trimmed.
pub fn base_command(command: &str) -> &str {
    let end = command.find(|c: char| c == '(' || c == '{' || c.is_ascii_digit());
    end.map_or(command, |end| &command[..end]).trim()
}

/// Up to [`MAX_SUGGESTIONS`] candidates closest to `command`, best first.
///
/// Candidates scoring below [`SIMILARITY_CUTOFF`] are dropped; ties keep
/// candidate order; duplicates are reported once.
pub fn similar_commands<'a>(
    command: &str,
    candidates: impl IntoIterator<Item = &'a str>,
) -> Vec<String> {
    let base = base_command(command);
    if base.is_empty() {
        return Vec::new();
    }

    let mut scored: Vec<(f64, &str)> = Vec::new();
    for candidate in candidates {
        if scored.iter().any(|(_, seen)| *seen == candidate) {
            continue;
        }

        let score = strsim::normalized_levenshtein(base, base_command(candidate))
            .max(strsim::normalized_levenshtein(base, candidate));
        if score >= SIMILARITY_CUTOFF {
            scored.push((score, candidate));
        }
    }

    scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(Ordering::Equal));
    scored.into_iter().take(MAX_SUGGESTIONS).map(|(_, candidate)| candidate.to_string()).collect()
}
