/// Error types for the scanning engine.
///
/// Only failures to *begin* a scan (and loss of the root itself) surface to
/// the caller as errors. Per-entry failures are absorbed into the report as
/// issues and never abort traversal.
use crate::scanner::ScanState;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by [`ScanEngine`](crate::scanner::ScanEngine) and its parts.
#[derive(Debug, Error)]
pub enum ScanError {
    /// The root path does not exist or is not a directory.
    #[error("invalid scan root {path}: {reason}")]
    InvalidRoot { path: PathBuf, reason: String },

    /// A scan is already running (or stopping) on this engine.
    #[error("a scan is already running on this engine")]
    AlreadyRunning,

    /// The previous scan finished but the engine was not reset.
    #[error("engine is in terminal state {state:?}; call reset() before starting a new scan")]
    NotReset { state: ScanState },

    /// A single entry could not be stat'ed or listed.
    #[error("cannot access {path}: {source}")]
    EntryInaccessible {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The scan root disappeared between `start` and the beginning of traversal.
    #[error("scan root vanished: {path}")]
    RootVanished { path: PathBuf },

    /// Scan options failed validation.
    #[error("invalid scan options: {message}")]
    InvalidOptions { message: String },

    /// The background scan thread or its worker pool could not be created.
    #[error("failed to spawn scan workers: {source}")]
    Spawn {
        #[source]
        source: std::io::Error,
    },

    /// The background scan thread panicked before producing a report.
    #[error("scan thread panicked")]
    WorkerPanicked,
}

impl ScanError {
    /// Wrap an I/O failure on a single entry.
    pub fn inaccessible(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::EntryInaccessible {
            path: path.into(),
            source,
        }
    }

    /// Build an `InvalidRoot` error with a human-readable reason.
    pub fn invalid_root(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::InvalidRoot {
            path: path.into(),
            reason: reason.into(),
        }
    }
}
