/// Scan options — worker count, progress cadence, symlink policy.
///
/// Every field has a default so a partial JSON file (or none at all) yields
/// a usable configuration.
use crate::error::ScanError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default capacity of the event channel between the scan thread and the caller.
pub const DEFAULT_EVENT_BUFFER: usize = 4_096;

/// Default number of classified entries between two progress events.
pub const DEFAULT_PROGRESS_INTERVAL: u64 = 1_000;

/// Upper bound on the default worker count.
const MAX_DEFAULT_WORKERS: usize = 16;

/// Options recognised by [`ScanEngine::start`](crate::scanner::ScanEngine::start).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanOptions {
    /// Maximum number of directories listed concurrently.
    pub max_workers: usize,
    /// Emit one progress event per this many classified entries.
    pub progress_interval_entries: u64,
    /// Classify symlinks by their target. Symlinked directories are never
    /// traversed either way.
    pub follow_symlinks: bool,
    /// Bounded capacity of the event channel.
    pub event_buffer: usize,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            max_workers: default_workers(),
            progress_interval_entries: DEFAULT_PROGRESS_INTERVAL,
            follow_symlinks: false,
            event_buffer: DEFAULT_EVENT_BUFFER,
        }
    }
}

fn default_workers() -> usize {
    (num_cpus::get() * 2).clamp(1, MAX_DEFAULT_WORKERS)
}

impl ScanOptions {
    /// Reject values that would stall or disable the engine.
    pub fn validate(&self) -> Result<(), ScanError> {
        if self.max_workers == 0 {
            return Err(invalid("max_workers must be at least 1"));
        }
        if self.progress_interval_entries == 0 {
            return Err(invalid("progress_interval_entries must be at least 1"));
        }
        if self.event_buffer == 0 {
            return Err(invalid("event_buffer must be at least 1"));
        }
        Ok(())
    }

    /// Load options from a JSON file. Missing fields take their defaults.
    pub fn from_json_file(path: &Path) -> Result<Self, ScanError> {
        let text = std::fs::read_to_string(path).map_err(|e| ScanError::InvalidOptions {
            message: format!("cannot read {}: {e}", path.display()),
        })?;
        let options: Self = serde_json::from_str(&text).map_err(|e| ScanError::InvalidOptions {
            message: format!("cannot parse {}: {e}", path.display()),
        })?;
        options.validate()?;
        Ok(options)
    }
}

fn invalid(message: &str) -> ScanError {
    ScanError::InvalidOptions {
        message: message.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_are_valid() {
        let options = ScanOptions::default();
        assert!(options.validate().is_ok());
        assert!(options.max_workers >= 1 && options.max_workers <= MAX_DEFAULT_WORKERS);
        assert!(!options.follow_symlinks);
    }

    #[test]
    fn test_zero_workers_rejected() {
        let options = ScanOptions {
            max_workers: 0,
            ..ScanOptions::default()
        };
        assert!(matches!(
            options.validate(),
            Err(ScanError::InvalidOptions { .. })
        ));
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "max_workers": 3, "follow_symlinks": true }}"#).unwrap();

        let options = ScanOptions::from_json_file(file.path()).unwrap();
        assert_eq!(options.max_workers, 3);
        assert!(options.follow_symlinks);
        assert_eq!(options.progress_interval_entries, DEFAULT_PROGRESS_INTERVAL);
        assert_eq!(options.event_buffer, DEFAULT_EVENT_BUFFER);
    }

    #[test]
    fn test_invalid_json_file_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "progress_interval_entries": 0 }}"#).unwrap();
        assert!(ScanOptions::from_json_file(file.path()).is_err());
    }
}
