//! Snapshot persistence: a loaded dictionary written as JSON, with ordering
//! enforcement on read.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::dictionary::TargetDictionary;
use crate::error::Error;
use crate::target::Target;

/// Default snapshot file name inside a metadata directory.
pub const SNAPSHOT_FILE: &str = "symref.snapshot.json";

/// A dictionary at rest. Targets are sorted by identifier and unique; unit
/// keys are sorted and unique. Constructed only via `Snapshot::new()`,
/// `Snapshot::capture()` or `Snapshot::parse()`, which all enforce this.
#[derive(Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Stored targets.
    pub targets: Vec<Target>,
    /// Claimed unit keys (`N:<stem>`).
    pub units: Vec<String>,
}

impl Snapshot {
    /// Build from unsorted parts. Sorts and deduplicates; for duplicate
    /// identifiers the last one given wins.
    pub fn new(mut targets: Vec<Target>, mut units: Vec<String>) -> Self {
        targets.reverse();
        targets.sort_by(|a, b| return a.id.cmp(&b.id));
        targets.dedup_by(|later, earlier| return later.id == earlier.id);
        units.sort();
        units.dedup();
        return Self { targets, units };
    }

    /// Capture the current contents of `dictionary`.
    pub fn capture(dictionary: &TargetDictionary) -> Self {
        return Self::new(dictionary.sorted_targets(), dictionary.claimed_units());
    }

    /// Insert every target and claim every unit key, so a later bulk load
    /// skips the units this snapshot covers.
    pub fn restore(self, dictionary: &TargetDictionary) {
        for unit in &self.units {
            let _claimed = dictionary.claim(unit);
        }
        for target in self.targets {
            dictionary.insert(target);
        }
    }

    /// Parse a snapshot from JSON.
    ///
    /// # Errors
    ///
    /// Returns `Error::Json` if the content is not a valid snapshot,
    /// or `Error::SnapshotCorrupt` if targets or units are not strictly sorted.
    pub fn parse(content: &str) -> Result<Self, Error> {
        let snapshot: Self = serde_json::from_str(content)?;
        enforce_strict_order(snapshot.targets.iter().map(|t| return t.id.as_str()), "target")?;
        enforce_strict_order(snapshot.units.iter().map(String::as_str), "unit")?;
        return Ok(snapshot);
    }

    /// Read and parse a snapshot from disk.
    ///
    /// # Errors
    ///
    /// Returns `Error::SnapshotNotFound` if the file doesn't exist,
    /// `Error::Io` for other read failures, and the errors of
    /// [`Snapshot::parse`] otherwise.
    pub fn read(path: &Path) -> Result<Self, Error> {
        let content = match std::fs::read_to_string(path) {
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(Error::SnapshotNotFound { path: path.to_path_buf() });
            },
            Err(e) => return Err(Error::Io(e)),
            Ok(c) => c,
        };
        return Self::parse(&content);
    }

    /// Write the snapshot to disk as pretty JSON.
    ///
    /// # Errors
    ///
    /// Returns `Error::Json` if serialization fails,
    /// or `Error::Io` if the file cannot be written.
    pub fn write(&self, path: &Path) -> Result<(), Error> {
        let mut content = serde_json::to_string_pretty(self)?;
        content.push('\n');
        std::fs::write(path, content)?;
        return Ok(());
    }
}

/// Validate that keys are strictly increasing.
///
/// # Errors
///
/// Returns `Error::SnapshotCorrupt` naming the first out-of-order pair.
fn enforce_strict_order<'a>(keys: impl Iterator<Item = &'a str>, what: &str) -> Result<(), Error> {
    let mut previous: Option<&str> = None;
    for key in keys {
        if let Some(prev) = previous.filter(|prev| return *prev >= key) {
            return Err(Error::SnapshotCorrupt {
                reason: format!("{what} entries not sorted: `{prev}` >= `{key}`"),
            });
        }
        previous = Some(key);
    }
    return Ok(());
}
