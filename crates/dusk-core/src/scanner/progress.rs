/// Scan events — lightweight messages sent from the scan workers to the
/// caller via a bounded crossbeam channel.
use crate::report::ScanReport;
use crate::scanner::classify::Entry;
use crate::model::NodeKind;
use crossbeam_channel::Sender;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Running totals at the moment a progress event was produced.
///
/// Byte and entry counts are lower bounds of the final totals; only the
/// completion report is authoritative.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanProgress {
    pub current_path: PathBuf,
    pub bytes_so_far: u64,
    pub entries_so_far: u64,
    pub elapsed: Duration,
}

/// Messages delivered to the caller, in the order they were produced.
#[derive(Debug, Clone)]
pub enum ScanEvent {
    /// Periodic update, batched every `progress_interval_entries` entries.
    Progress(ScanProgress),
    /// Sent exactly once per scan, always last.
    Complete(Arc<ScanReport>),
}

/// Shared progress counter. The walker holds it behind its own mutex so
/// events leave in the same order their counts were taken.
pub(crate) struct ProgressTracker {
    start: Instant,
    interval: u64,
    entries: u64,
    bytes: u64,
    events_tx: Sender<ScanEvent>,
}

impl ProgressTracker {
    pub(crate) fn new(start: Instant, interval: u64, events_tx: Sender<ScanEvent>) -> Self {
        Self {
            start,
            interval: interval.max(1),
            entries: 0,
            bytes: 0,
            events_tx,
        }
    }

    /// Count one classified entry, emitting a progress event on the cadence.
    ///
    /// Blocks if the channel is full: a slow caller throttles the workers
    /// instead of growing the queue without bound.
    pub(crate) fn record(&mut self, entry: &Entry) {
        self.entries += 1;
        if entry.kind == NodeKind::File {
            self.bytes += entry.size;
        }
        if self.entries % self.interval == 0 {
            // A dropped receiver just means nobody is listening.
            let _ = self.events_tx.send(ScanEvent::Progress(self.snapshot(&entry.path)));
        }
    }

    pub(crate) fn snapshot(&self, current_path: &std::path::Path) -> ScanProgress {
        ScanProgress {
            current_path: current_path.to_path_buf(),
            bytes_so_far: self.bytes,
            entries_so_far: self.entries,
            elapsed: self.start.elapsed(),
        }
    }
}
