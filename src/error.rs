/// Crate-level error types for symref diagnostics.
use std::path::PathBuf;

/// Build-fatal failures. Each variant names the file, identifier, or reason
/// so the driver can print a useful diagnostic without a debugger.
///
/// Grammar failures are deliberately absent: an identifier that does not
/// parse becomes `Reference::Invalid` and renders literally.
#[allow(clippy::error_impl_error, reason = "crate-level error type re-exported by the library")]
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The filter configuration exists but cannot be understood.
    #[error("invalid config {}: {reason}", path.display())]
    ConfigInvalid {
        /// Config file that failed to parse.
        path: PathBuf,
        /// Parser message, including the offending line and key.
        reason: String,
    },

    /// An explicitly requested config file does not exist on disk.
    #[error("config not found: {}", path.display())]
    ConfigNotFound {
        /// Path to the missing config file.
        path: PathBuf,
    },

    /// Underlying I/O error from the filesystem.
    #[error("io: {0}")]
    Io(
        /// The wrapped I/O error.
        #[from]
        std::io::Error,
    ),

    /// JSON (de)serialization of a snapshot failed.
    #[error("json: {0}")]
    Json(
        /// The wrapped serde_json error.
        #[from]
        serde_json::Error,
    ),

    /// The configured source-unit pattern is not a valid glob.
    #[error("invalid source-unit pattern `{pattern}`: {reason}")]
    Pattern {
        /// Glob pattern as written in the config.
        pattern: String,
        /// Description of the pattern error.
        reason: String,
    },

    /// Snapshot exists but its entries are not in canonical order.
    #[error("snapshot corrupt: {reason}")]
    SnapshotCorrupt {
        /// Description of the corruption.
        reason: String,
    },

    /// Expected snapshot does not exist on disk.
    #[error("snapshot not found: {}", path.display())]
    SnapshotNotFound {
        /// Path to the missing snapshot.
        path: PathBuf,
    },

    /// A source unit is well-formed XML but violates the metadata schema.
    #[error("invalid source unit {}: {reason}", path.display())]
    SourceUnitInvalid {
        /// Source unit that violated the schema.
        path: PathBuf,
        /// What was missing or unexpected.
        reason: String,
    },

    /// A source unit is not well-formed XML.
    #[error("malformed source unit {}: {reason}", path.display())]
    SourceUnitMalformed {
        /// Source unit that failed to parse.
        path: PathBuf,
        /// Parser message with line and column.
        reason: String,
    },

    /// A source unit could not be read.
    #[error("unreadable source unit {}: {source}", path.display())]
    SourceUnitUnreadable {
        /// Source unit that could not be read.
        path: PathBuf,
        /// The wrapped I/O error.
        source: std::io::Error,
    },

    /// The operation is outside the dictionary contract.
    #[error("unsupported operation: {operation}")]
    Unsupported {
        /// Name of the rejected operation.
        operation: &'static str,
    },

    /// A loader worker thread died without reporting a result.
    #[error("worker pool failure: {reason}")]
    WorkerPool {
        /// Description of the failure.
        reason: String,
    },
}
