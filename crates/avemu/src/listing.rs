//! `--supported` output.

use std::io::{self, Write};

use avemu_protocol::ProtocolLibrary;

/// Width of one listing column.
const COLUMN_WIDTH: usize = 30;

/// Width assumed when stdout is not a terminal.
const FALLBACK_WIDTH: usize = 80;

/// Lay `entries` out left to right in fixed-width columns filling `width`.
pub fn format_columns(entries: &[String], width: usize) -> String {
    let per_row = (width / COLUMN_WIDTH).max(1);

    entries
        .chunks(per_row)
        .map(|row| row.iter().map(|entry| format!("{entry:<COLUMN_WIDTH$}")).collect::<String>())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Every supported id in both `a/b` and `a_b` spelling, sorted.
pub fn display_ids(library: &ProtocolLibrary) -> Vec<String> {
    let mut ids: Vec<String> = library
        .list_protocols()
        .into_iter()
        .flat_map(|id| [id.to_string(), id.replace('/', "_")])
        .collect();
    ids.sort();
    ids.dedup();
    ids
}

/// Print the supported models to `out`.
pub fn write_supported(out: &mut impl Write, library: &ProtocolLibrary) -> io::Result<()> {
    let width = crossterm::terminal::size().map_or(FALLBACK_WIDTH, |(cols, _)| usize::from(cols));

    writeln!(out, "\nModels supported by avemu:\n")?;
    writeln!(out, "{}", format_columns(&display_ids(library), width))?;
    writeln!(out, "\nUse either format: mcintosh/mx160 or mcintosh_mx160\n")?;
    out.flush()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(names: &[&str]) -> Vec<String> {
        names.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn empty_listing_is_empty() {
        assert_eq!(format_columns(&[], 80), "");
    }

    #[test]
    fn fills_rows_by_terminal_width() {
        let out = format_columns(&ids(&["a", "b", "c", "d", "e"]), 80);
        let lines: Vec<_> = out.lines().collect();

        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], format!("{:<30}{:<30}", "a", "b"));
        assert_eq!(lines[2], format!("{:<30}", "e"));
    }

    #[test]
    fn narrow_terminal_still_gets_one_column() {
        let out = format_columns(&ids(&["a", "b"]), 10);
        assert_eq!(out.lines().count(), 2);
    }

    #[test]
    fn lists_both_spellings() {
        let ids = display_ids(&ProtocolLibrary::bundled());
        assert!(ids.contains(&"lyngdorf/cd2".to_string()));
        assert!(ids.contains(&"lyngdorf_cd2".to_string()));

        let mut sorted = ids.clone();
        sorted.sort();
        assert_eq!(ids, sorted);
    }
}
