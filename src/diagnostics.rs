use std::path::Path;

use crate::config::CONFIG_FILE;
use crate::error::Error;

/// ANSI bold.
const BOLD: &str = "\x1b[1m";
/// ANSI reset.
const RESET: &str = "\x1b[0m";

/// Render an error as valid markdown with bold headings and print to stderr.
pub fn print_error(e: &Error) {
    let md = render_error(e);
    for line in md.lines() {
        if line.starts_with('#') {
            eprintln!("{BOLD}{line}{RESET}");
        } else {
            eprintln!("{line}");
        }
    }
}

/// Render an error as a structured markdown diagnostic.
///
/// Each variant produces a block with what happened and, where there is
/// one, how to fix it.
pub fn render_error(e: &Error) -> String {
    return match e {
        Error::ConfigInvalid { path, reason } => render_config_invalid(path, reason),
        Error::ConfigNotFound { path } => format!(
            "\
# Error: Config Not Found

`{}` does not exist.

## Fix

Pass an existing file to `--config`, or drop the flag to read `{CONFIG_FILE}`
from the metadata directory.
",
            path.display()
        ),
        Error::Io(e) => format!(
            "\
# Error: I/O

{e}
"
        ),
        Error::Json(e) => format!(
            "\
# Error: Invalid Snapshot JSON

{e}

## Fix

Rebuild the snapshot:

    symref index <dir>
"
        ),
        Error::Pattern { pattern, reason } => format!(
            "\
# Error: Invalid Source-Unit Pattern

`{pattern}` is not a valid glob: {reason}

## Fix

Correct `index.pattern` in `{CONFIG_FILE}`, e.g. `pattern = \"*.xml\"`.
"
        ),
        Error::SnapshotCorrupt { reason } => format!(
            "\
# Error: Snapshot Corrupt

{reason}

## Fix

Rebuild the snapshot:

    symref index <dir>
"
        ),
        Error::SnapshotNotFound { path } => format!(
            "\
# Error: Snapshot Not Found

`{}` does not exist.

## Fix

Index the metadata directory first:

    symref index <dir>
",
            path.display()
        ),
        Error::SourceUnitInvalid { path, reason } => render_source_unit(path, "Invalid Source Unit", reason),
        Error::SourceUnitMalformed { path, reason } => render_source_unit(path, "Malformed Source Unit", reason),
        Error::SourceUnitUnreadable { path, source } => {
            render_source_unit(path, "Unreadable Source Unit", &source.to_string())
        },
        Error::Unsupported { operation } => format!(
            "\
# Error: Unsupported Operation

`{operation}` is not supported: dictionary entries are never removed.
"
        ),
        Error::WorkerPool { reason } => format!(
            "\
# Error: Loader Failure

{reason}

## Fix

Retry with a single worker to isolate the failing unit:

    [index]
    workers = 1
"
        ),
    };
}

/// Config parse failure with the expected switch shape.
fn render_config_invalid(path: &Path, reason: &str) -> String {
    return format!(
        "\
# Error: Invalid Config

`{}` could not be read:

{reason}

## Fix

Every switch under `[visibility]` is a table with a boolean `expose`:

    [visibility]
    privates = {{ expose = false }}
",
        path.display()
    );
}

/// Any build-fatal source-unit failure.
fn render_source_unit(path: &Path, heading: &str, reason: &str) -> String {
    return format!(
        "\
# Error: {heading}

`{}`: {reason}

## Fix

Source-unit errors abort the whole build: a partial index produces wrong
cross-references. Regenerate or remove the unit, or exclude it with
`index.allow` in `{CONFIG_FILE}`.
",
        path.display()
    );
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    #[test]
    fn config_errors_show_location_and_fix() {
        let md = render_error(&Error::ConfigInvalid {
            path: PathBuf::from(".symref.toml"),
            reason: "TOML parse error at line 2, column 12".to_string(),
        });
        assert!(md.starts_with("# Error: Invalid Config"));
        assert!(md.contains("line 2, column 12"));
        assert!(md.contains("privates = { expose = false }"));
    }

    #[test]
    fn source_unit_errors_name_the_unit() {
        let md = render_error(&Error::SourceUnitMalformed {
            path: PathBuf::from("meta/N.xml"),
            reason: "unexpected end".to_string(),
        });
        assert!(md.contains("# Error: Malformed Source Unit"));
        assert!(md.contains("`meta/N.xml`: unexpected end"));
    }

    #[test]
    fn missing_snapshot_suggests_indexing() {
        let md = render_error(&Error::SnapshotNotFound {
            path: PathBuf::from("meta/symref.snapshot.json"),
        });
        assert!(md.contains("symref index <dir>"));
    }
}
