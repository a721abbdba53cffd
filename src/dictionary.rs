//! Target dictionary: a concurrent identifier → target store with bulk,
//! parallel loading from source units.
//!
//! ```text
//! load_all(dir)
//!   ├── enumerate units matching the pattern (sorted)
//!   ├── queue ── worker ─┬─ allow-list?       no  → skipped_filtered
//!   │          worker ─┤ ├─ claim "N:<stem>"  taken → skipped_present
//!   │          worker ─┘ └─ parse + insert    → loaded
//!   └── first error aborts the remaining queue
//! ```
//!
//! The allow-list and the claim are both checked before a unit is read.
//! Claims go through a `DashSet`, so two workers can never parse the same
//! unit name.

use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use dashmap::{DashMap, DashSet};
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::error::Error;
use crate::source_unit::read_source_unit;
use crate::target::Target;

/// Bulk-load settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadOptions {
    /// Unit file names (or stems) to load; empty loads every unit.
    pub allow: Vec<String>,
    /// Glob matched against unit file names.
    pub pattern: String,
    /// Worker count; 0 uses the available parallelism.
    pub workers: usize,
}

impl Default for LoadOptions {
    fn default() -> Self {
        return Self {
            allow: Vec::new(),
            pattern: "*.xml".to_string(),
            workers: 0,
        };
    }
}

/// Outcome of one bulk load.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadReport {
    /// Units parsed.
    pub loaded: usize,
    /// Units skipped because their key was already present.
    pub skipped_present: usize,
    /// Units skipped by the allow-list.
    pub skipped_filtered: usize,
    /// Targets inserted.
    pub targets: usize,
}

/// Lookup counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Entries stored.
    pub entries: usize,
    /// Lookups that found a target.
    pub hits: u64,
    /// Lookups that found nothing.
    pub misses: u64,
}

/// Per-unit result inside the worker pool.
enum UnitOutcome {
    /// Excluded by the allow-list.
    Filtered,
    /// Parsed; carries the number of inserted targets.
    Loaded(usize),
    /// Already claimed or present.
    Present,
}

/// Identifier → target store. Targets are shared as `Arc` and never mutated
/// after insertion.
#[derive(Debug, Default)]
pub struct TargetDictionary {
    /// Unit keys claimed by a loader.
    claimed: DashSet<String>,
    /// Successful lookups.
    hits: AtomicU64,
    /// Failed lookups.
    misses: AtomicU64,
    /// Stored targets.
    targets: DashMap<String, Arc<Target>>,
}

impl TargetDictionary {
    /// Empty dictionary.
    pub fn new() -> Self {
        return Self::default();
    }

    /// Store `target` under its identifier. A duplicate identifier replaces
    /// the previous entry.
    pub fn insert(&self, target: Target) {
        let _previous = self.targets.insert(target.id.clone(), Arc::new(target));
    }

    /// Target stored under `id`.
    pub fn get(&self, id: &str) -> Option<Arc<Target>> {
        let found = self.targets.get(id).map(|entry| return Arc::clone(entry.value()));
        let counter = if found.is_some() { &self.hits } else { &self.misses };
        counter.fetch_add(1, Ordering::Relaxed);
        return found;
    }

    /// Stored target with the smallest identifier starting with `prefix`.
    /// Counts as one lookup.
    pub fn first_with_prefix(&self, prefix: &str) -> Option<Arc<Target>> {
        let found = self
            .targets
            .iter()
            .filter(|entry| return entry.key().starts_with(prefix))
            .map(|entry| return (entry.key().clone(), Arc::clone(entry.value())))
            .min_by(|a, b| return a.0.cmp(&b.0))
            .map(|(_, target)| return target);
        let counter = if found.is_some() { &self.hits } else { &self.misses };
        counter.fetch_add(1, Ordering::Relaxed);
        return found;
    }

    /// Whether `id` is stored. Does not touch the counters.
    pub fn contains(&self, id: &str) -> bool {
        return self.targets.contains_key(id);
    }

    /// Number of stored targets.
    pub fn len(&self) -> usize {
        return self.targets.len();
    }

    /// Whether nothing is stored.
    pub fn is_empty(&self) -> bool {
        return self.targets.is_empty();
    }

    /// Removal is not part of the dictionary contract.
    ///
    /// # Errors
    ///
    /// Always returns `Error::Unsupported`.
    pub fn remove(&self, id: &str) -> Result<(), Error> {
        debug!(id, present = self.contains(id), "rejected removal");
        return Err(Error::Unsupported { operation: "remove" });
    }

    /// Claim a unit key. Returns `false` if it was already claimed or the key
    /// is a stored identifier.
    pub fn claim(&self, key: &str) -> bool {
        if self.targets.contains_key(key) {
            return false;
        }
        return self.claimed.insert(key.to_string());
    }

    /// Claimed unit keys, sorted.
    pub fn claimed_units(&self) -> Vec<String> {
        let mut units: Vec<String> = self.claimed.iter().map(|key| return key.key().clone()).collect();
        units.sort();
        return units;
    }

    /// Stored targets sorted by identifier.
    pub fn sorted_targets(&self) -> Vec<Target> {
        let mut targets: Vec<Target> = self.targets.iter().map(|entry| return entry.value().as_ref().clone()).collect();
        targets.sort_by(|a, b| return a.id.cmp(&b.id));
        return targets;
    }

    /// Lookup counters so far.
    pub fn stats(&self) -> CacheStats {
        return CacheStats {
            entries: self.len(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        };
    }

    /// Load every source unit in `dir` matching `options.pattern`.
    ///
    /// # Errors
    ///
    /// Returns `Error::Pattern` for an invalid glob, `Error::Io` if `dir`
    /// cannot be listed, the first source-unit error any worker hits, or
    /// `Error::WorkerPool` if a worker panics. Targets inserted before the
    /// failure stay in the dictionary.
    pub fn load_all(&self, dir: &Path, options: &LoadOptions) -> Result<LoadReport, Error> {
        let units = enumerate_units(dir, &options.pattern)?;
        let workers = worker_count(options.workers, units.len());
        info!(units = units.len(), workers, "loading source units");

        let (tx, rx) = crossbeam_channel::unbounded::<PathBuf>();
        for unit in units {
            tx.send(unit).map_err(|e| {
                return Error::WorkerPool { reason: e.to_string() };
            })?;
        }
        drop(tx);

        let loaded = AtomicUsize::new(0);
        let present = AtomicUsize::new(0);
        let filtered = AtomicUsize::new(0);
        let inserted = AtomicUsize::new(0);
        let stop = AtomicBool::new(false);
        let first_error: Mutex<Option<Error>> = Mutex::new(None);

        let joined: Vec<std::thread::Result<()>> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..workers)
                .map(|_| {
                    let rx = rx.clone();
                    return scope.spawn(|| {
                        for unit in rx {
                            if stop.load(Ordering::Relaxed) {
                                break;
                            }
                            match self.load_unit(&unit, &options.allow) {
                                Ok(UnitOutcome::Filtered) => {
                                    filtered.fetch_add(1, Ordering::Relaxed);
                                },
                                Ok(UnitOutcome::Loaded(count)) => {
                                    loaded.fetch_add(1, Ordering::Relaxed);
                                    inserted.fetch_add(count, Ordering::Relaxed);
                                },
                                Ok(UnitOutcome::Present) => {
                                    present.fetch_add(1, Ordering::Relaxed);
                                },
                                Err(e) => {
                                    stop.store(true, Ordering::Relaxed);
                                    if let Ok(mut slot) = first_error.lock() {
                                        let _first = slot.get_or_insert(e);
                                    }
                                    break;
                                },
                            }
                        }
                    });
                })
                .collect();
            return handles.into_iter().map(std::thread::ScopedJoinHandle::join).collect();
        });

        if joined.iter().any(std::result::Result::is_err) {
            return Err(Error::WorkerPool {
                reason: "a loader worker panicked".to_string(),
            });
        }
        let failure = first_error
            .into_inner()
            .map_err(|e| return Error::WorkerPool { reason: e.to_string() })?;
        if let Some(e) = failure {
            return Err(e);
        }

        let report = LoadReport {
            loaded: loaded.into_inner(),
            skipped_filtered: filtered.into_inner(),
            skipped_present: present.into_inner(),
            targets: inserted.into_inner(),
        };
        info!(
            loaded = report.loaded,
            skipped_present = report.skipped_present,
            skipped_filtered = report.skipped_filtered,
            targets = report.targets,
            "source units loaded"
        );
        return Ok(report);
    }

    /// Filter, claim, then parse one unit.
    fn load_unit(&self, path: &Path, allow: &[String]) -> Result<UnitOutcome, Error> {
        let file_name = path.file_name().and_then(|n| return n.to_str()).unwrap_or_default();
        let stem = path.file_stem().and_then(|n| return n.to_str()).unwrap_or_default();

        if !allow.is_empty() && !allow.iter().any(|a| return a == file_name || a == stem) {
            debug!(unit = file_name, "unit not in allow-list");
            return Ok(UnitOutcome::Filtered);
        }
        if !self.claim(&format!("N:{stem}")) {
            debug!(unit = file_name, "unit already present");
            return Ok(UnitOutcome::Present);
        }

        let targets = read_source_unit(path)?;
        let count = targets.len();
        for target in targets {
            self.insert(target);
        }
        debug!(unit = file_name, targets = count, "parsed source unit");
        return Ok(UnitOutcome::Loaded(count));
    }
}

/// Files directly inside `dir` whose names match `pattern`, sorted.
fn enumerate_units(dir: &Path, pattern: &str) -> Result<Vec<PathBuf>, Error> {
    let matcher = glob::Pattern::new(pattern).map_err(|e| {
        return Error::Pattern {
            pattern: pattern.to_string(),
            reason: e.to_string(),
        };
    })?;
    let mut units = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1) {
        let entry = entry.map_err(std::io::Error::from)?;
        if !entry.file_type().is_file() {
            continue;
        }
        if entry.file_name().to_str().is_some_and(|name| return matcher.matches(name)) {
            units.push(entry.into_path());
        }
    }
    units.sort();
    return Ok(units);
}

/// Requested worker count, bounded by the number of units.
fn worker_count(requested: usize, units: usize) -> usize {
    let available = if requested == 0 {
        std::thread::available_parallelism().map_or(1, NonZeroUsize::get)
    } else {
        requested
    };
    return available.min(units).max(1);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::target::TargetKind;

    fn unit(namespace: &str, types: &[&str]) -> String {
        let mut xml = format!(
            "<reflection><apis><api id=\"N:{namespace}\"><apidata name=\"{namespace}\" group=\"namespace\" /></api>"
        );
        for name in types {
            xml.push_str(&format!(
                "<api id=\"T:{namespace}.{name}\"><apidata name=\"{name}\" group=\"type\" subgroup=\"class\" />\
                 <containers><library assembly=\"Lib\" /><namespace api=\"N:{namespace}\" /></containers></api>"
            ));
        }
        xml.push_str("</apis></reflection>");
        return xml;
    }

    fn write_units(dir: &Path) {
        std::fs::write(dir.join("Alpha.xml"), unit("Alpha", &["One", "Two"])).unwrap();
        std::fs::write(dir.join("Beta.xml"), unit("Beta", &["Three"])).unwrap();
        std::fs::write(dir.join("notes.txt"), "not a unit").unwrap();
    }

    #[test]
    fn loads_every_matching_unit() {
        let dir = tempfile::tempdir().unwrap();
        write_units(dir.path());
        let dictionary = TargetDictionary::new();
        let report = dictionary.load_all(dir.path(), &LoadOptions::default()).unwrap();
        assert_eq!(report.loaded, 2);
        assert_eq!(report.targets, 5);
        assert_eq!(dictionary.len(), 5);
        assert!(dictionary.contains("T:Alpha.Two"));
        assert_eq!(dictionary.get("T:Beta.Three").unwrap().container, "Lib");
    }

    #[test]
    fn second_load_short_circuits_without_parsing() {
        let dir = tempfile::tempdir().unwrap();
        write_units(dir.path());
        let dictionary = TargetDictionary::new();
        dictionary.load_all(dir.path(), &LoadOptions::default()).unwrap();
        let before = dictionary.sorted_targets();

        // Corrupt a unit: a re-parse would fail.
        std::fs::write(dir.path().join("Alpha.xml"), "<broken").unwrap();
        let report = dictionary.load_all(dir.path(), &LoadOptions::default()).unwrap();
        assert_eq!(report.loaded, 0);
        assert_eq!(report.skipped_present, 2);
        assert_eq!(dictionary.sorted_targets(), before);
    }

    #[test]
    fn allow_list_filters_before_reading() {
        let dir = tempfile::tempdir().unwrap();
        write_units(dir.path());
        std::fs::write(dir.path().join("Gamma.xml"), "<broken").unwrap();
        let options = LoadOptions {
            allow: vec!["Alpha.xml".to_string(), "Beta".to_string()],
            ..LoadOptions::default()
        };
        let dictionary = TargetDictionary::new();
        let report = dictionary.load_all(dir.path(), &options).unwrap();
        assert_eq!(report.loaded, 2);
        assert_eq!(report.skipped_filtered, 1);
    }

    #[test]
    fn malformed_unit_aborts_the_build() {
        let dir = tempfile::tempdir().unwrap();
        write_units(dir.path());
        std::fs::write(dir.path().join("Gamma.xml"), "<reflection><api id=").unwrap();
        let dictionary = TargetDictionary::new();
        let err = dictionary
            .load_all(
                dir.path(),
                &LoadOptions {
                    workers: 1,
                    ..LoadOptions::default()
                },
            )
            .unwrap_err();
        assert!(matches!(err, Error::SourceUnitMalformed { .. }));
    }

    #[test]
    fn invalid_pattern_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let options = LoadOptions {
            pattern: "[".to_string(),
            ..LoadOptions::default()
        };
        let err = TargetDictionary::new().load_all(dir.path(), &options).unwrap_err();
        assert!(matches!(err, Error::Pattern { .. }));
    }

    #[test]
    fn removal_is_unsupported() {
        let dictionary = TargetDictionary::new();
        dictionary.insert(Target::new("N:N", "", TargetKind::Marker));
        assert!(matches!(
            dictionary.remove("N:N"),
            Err(Error::Unsupported { operation: "remove" })
        ));
        assert!(dictionary.contains("N:N"));
    }

    #[test]
    fn duplicate_insert_replaces_and_lookups_are_counted() {
        let dictionary = TargetDictionary::new();
        dictionary.insert(Target::new("T:N.A", "First", TargetKind::Marker));
        dictionary.insert(Target::new("T:N.A", "Second", TargetKind::Marker));
        assert_eq!(dictionary.len(), 1);
        assert_eq!(dictionary.get("T:N.A").unwrap().container, "Second");
        assert!(dictionary.get("T:N.Missing").is_none());
        let stats = dictionary.stats();
        assert_eq!((stats.entries, stats.hits, stats.misses), (1, 1, 1));
    }

    #[test]
    fn prefix_lookup_picks_the_smallest_identifier() {
        let dictionary = TargetDictionary::new();
        dictionary.insert(Target::new("M:N.A.op_Implicit(N.B)~N.A", "", TargetKind::Marker));
        dictionary.insert(Target::new("M:N.A.op_Implicit(N.B)~N.A`1", "", TargetKind::Marker));
        dictionary.insert(Target::new("M:N.A.op_Implicit(N.C)~N.A", "", TargetKind::Marker));
        let found = dictionary.first_with_prefix("M:N.A.op_Implicit(N.B)~").unwrap();
        assert_eq!(found.id, "M:N.A.op_Implicit(N.B)~N.A");
        assert!(dictionary.first_with_prefix("M:N.A.op_Explicit(").is_none());
        assert_eq!((dictionary.stats().hits, dictionary.stats().misses), (1, 1));
    }

    #[test]
    fn claims_are_exclusive() {
        let dictionary = TargetDictionary::new();
        assert!(dictionary.claim("N:Alpha"));
        assert!(!dictionary.claim("N:Alpha"));
        dictionary.insert(Target::new("N:Beta", "", TargetKind::Marker));
        assert!(!dictionary.claim("N:Beta"));
        assert_eq!(dictionary.claimed_units(), ["N:Alpha"]);
    }

    #[test]
    fn worker_count_is_bounded() {
        assert_eq!(worker_count(8, 3), 3);
        assert_eq!(worker_count(2, 10), 2);
        assert_eq!(worker_count(4, 0), 1);
        assert!(worker_count(0, 100) >= 1);
    }
}
