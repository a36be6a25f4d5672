/// Scanner module — the scan engine and its background execution.
///
/// [`ScanEngine::start`] validates the root, moves the engine from `Idle` to
/// `Running`, and hands traversal to a dedicated background thread so the
/// caller never blocks. The caller receives a [`ScanHandle`] carrying the
/// event channel (progress, then exactly one completion) and the cancel
/// flag used by [`ScanEngine::stop`].
///
/// ```text
/// Idle ──start──▶ Running ──────────────▶ Done
///                    │   └──root gone───▶ Failed
///                   stop
///                    ▼
///                 Stopping ─────────────▶ Stopped
/// ```
pub mod accumulator;
pub mod classify;
pub mod progress;
mod walker;

use crate::config::ScanOptions;
use crate::error::ScanError;
use crate::report::{ScanReport, ScanStatus, ScanTiming};
use accumulator::TreeAccumulator;
use progress::ScanEvent;

use chrono::{DateTime, Utc};
use crossbeam_channel::{Receiver, Sender};
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Lifecycle of one engine. Only `Idle` accepts a new scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanState {
    Idle,
    Running,
    Stopping,
    Done,
    Stopped,
    Failed,
}

impl ScanState {
    /// `Done`, `Stopped` and `Failed` are terminal until `reset`.
    pub fn is_terminal(self) -> bool {
        matches!(self, ScanState::Done | ScanState::Stopped | ScanState::Failed)
    }

    fn from_status(status: ScanStatus) -> Self {
        match status {
            ScanStatus::Completed => ScanState::Done,
            ScanStatus::Stopped => ScanState::Stopped,
            ScanStatus::Failed => ScanState::Failed,
        }
    }
}

/// Engine state shared with the scan thread and every handle.
///
/// `generation` increases with each `start`, so a handle left over from an
/// earlier scan can never act on the current one.
#[derive(Debug)]
struct EngineState {
    state: ScanState,
    generation: u64,
}

type SharedState = Arc<Mutex<EngineState>>;

/// Scans at most one root at a time.
#[derive(Debug)]
pub struct ScanEngine {
    state: SharedState,
}

impl Default for ScanEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl ScanEngine {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(EngineState {
                state: ScanState::Idle,
                generation: 0,
            })),
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ScanState {
        self.state.lock().state
    }

    /// Start scanning `root_path` on a background thread.
    ///
    /// Fails without any state change or event if the engine is busy, the
    /// options are invalid, or the root is missing or not a directory.
    pub fn start(
        &self,
        root_path: impl AsRef<Path>,
        options: ScanOptions,
    ) -> Result<ScanHandle, ScanError> {
        options.validate()?;

        let mut shared = self.state.lock();
        match shared.state {
            ScanState::Idle => {}
            ScanState::Running | ScanState::Stopping => return Err(ScanError::AlreadyRunning),
            terminal => return Err(ScanError::NotReset { state: terminal }),
        }

        let root_path = validate_root(root_path.as_ref())?;

        let (events_tx, events_rx) = crossbeam_channel::bounded::<ScanEvent>(options.event_buffer);
        let cancel_flag = Arc::new(AtomicBool::new(false));

        // The thread's final transition needs this lock, so it cannot
        // overtake the `Running` we set here.
        shared.state = ScanState::Running;
        shared.generation += 1;
        let scan = ScanIdentity {
            shared: self.state.clone(),
            generation: shared.generation,
        };
        let spawned = {
            let root_path = root_path.clone();
            let cancel_flag = cancel_flag.clone();
            let scan = scan.clone();
            thread::Builder::new()
                .name("dusk-scanner".into())
                .spawn(move || run_scan(root_path, options, cancel_flag, scan, events_tx))
        };

        let thread = match spawned {
            Ok(thread) => thread,
            Err(source) => {
                shared.state = ScanState::Idle;
                return Err(ScanError::Spawn { source });
            }
        };

        Ok(ScanHandle {
            events_rx,
            cancel_flag,
            scan,
            root_path,
            thread: Some(thread),
        })
    }

    /// Request cooperative cancellation of the scan behind `handle`.
    ///
    /// Idempotent: does nothing once the scan is stopping or finished, or if
    /// `handle` belongs to an earlier scan of this engine.
    pub fn stop(&self, handle: &ScanHandle) {
        if !Arc::ptr_eq(&self.state, &handle.scan.shared) {
            warn!("Ignoring stop for a scan started by another engine");
            return;
        }
        handle.stop();
    }

    /// Return a finished engine to `Idle` so it can scan again.
    pub fn reset(&self) -> Result<(), ScanError> {
        let mut shared = self.state.lock();
        match shared.state {
            ScanState::Running | ScanState::Stopping => Err(ScanError::AlreadyRunning),
            _ => {
                shared.state = ScanState::Idle;
                Ok(())
            }
        }
    }
}

/// Which scan of which engine: the shared state plus the generation `start`
/// assigned.
#[derive(Clone)]
struct ScanIdentity {
    shared: SharedState,
    generation: u64,
}

impl ScanIdentity {
    /// Lock the engine state if this scan is still the engine's current one.
    fn lock_current(&self) -> Option<parking_lot::MutexGuard<'_, EngineState>> {
        let shared = self.shared.lock();
        (shared.generation == self.generation).then_some(shared)
    }
}

/// Handle to a running or completed scan.
///
/// `stop` only ever affects the scan this handle was returned for.
pub struct ScanHandle {
    events_rx: Receiver<ScanEvent>,
    cancel_flag: Arc<AtomicBool>,
    scan: ScanIdentity,
    root_path: PathBuf,
    thread: Option<thread::JoinHandle<Arc<ScanReport>>>,
}

impl ScanHandle {
    /// Progress events followed by exactly one `Complete`.
    pub fn events(&self) -> &Receiver<ScanEvent> {
        &self.events_rx
    }

    /// Canonical root being scanned.
    pub fn root_path(&self) -> &Path {
        &self.root_path
    }

    /// Request the scan to stop at the next directory boundary.
    pub fn stop(&self) {
        let Some(mut shared) = self.scan.lock_current() else {
            debug!(
                "Ignoring stop for an earlier scan of {}",
                self.root_path.display()
            );
            return;
        };
        if shared.state == ScanState::Running {
            shared.state = ScanState::Stopping;
            self.cancel_flag.store(true, Ordering::Relaxed);
            info!("Stop requested for {}", self.root_path.display());
        }
    }

    /// Check whether cancellation has been requested.
    pub fn is_stop_requested(&self) -> bool {
        self.cancel_flag.load(Ordering::Relaxed)
    }

    /// Wait for the scan to finish and return its report.
    ///
    /// Events not yet received are discarded: the receiver is dropped first
    /// so a full channel can never block the scan thread.
    pub fn join(mut self) -> Result<Arc<ScanReport>, ScanError> {
        let thread = self.thread.take();
        drop(self);
        match thread {
            Some(thread) => thread.join().map_err(|_| ScanError::WorkerPanicked),
            None => Err(ScanError::WorkerPanicked),
        }
    }
}

/// Canonicalise the root and require an existing directory.
fn validate_root(path: &Path) -> Result<PathBuf, ScanError> {
    let root = path
        .canonicalize()
        .map_err(|e| ScanError::invalid_root(path, e.to_string()))?;
    let meta = std::fs::metadata(&root).map_err(|e| ScanError::invalid_root(&root, e.to_string()))?;
    if !meta.is_dir() {
        return Err(ScanError::invalid_root(root, "not a directory"));
    }
    Ok(root)
}

/// Finishes the scan as `Failed` if the scan thread unwinds before sending
/// its completion event: moves the engine to `Failed` and still delivers one
/// `Complete`.
struct PanicGuard {
    scan: ScanIdentity,
    root_path: PathBuf,
    started_at: DateTime<Utc>,
    start: Instant,
    events_tx: Sender<ScanEvent>,
    completed: bool,
}

impl Drop for PanicGuard {
    fn drop(&mut self) {
        if self.completed {
            return;
        }
        warn!("Scan thread for {} unwound", self.root_path.display());

        let (tree, issues) = TreeAccumulator::new(self.root_path.clone()).finish();
        let report = {
            let current = self.scan.lock_current();
            if let Some(mut shared) = current {
                if !shared.state.is_terminal() {
                    shared.state = ScanState::Failed;
                }
            }
            let timing = ScanTiming {
                started_at: self.started_at,
                finished_at: Utc::now(),
                elapsed: self.start.elapsed(),
            };
            ScanReport::assemble(
                tree,
                ScanStatus::Failed,
                issues,
                timing,
                Some(ScanError::WorkerPanicked.to_string()),
            )
        };
        let _ = self.events_tx.send(ScanEvent::Complete(Arc::new(report)));
    }
}

/// Body of the background scan thread.
fn run_scan(
    root_path: PathBuf,
    options: ScanOptions,
    cancel_flag: Arc<AtomicBool>,
    scan: ScanIdentity,
    events_tx: Sender<ScanEvent>,
) -> Arc<ScanReport> {
    let started_at = Utc::now();
    let start = Instant::now();
    let mut guard = PanicGuard {
        scan: scan.clone(),
        root_path: root_path.clone(),
        started_at,
        start,
        events_tx: events_tx.clone(),
        completed: false,
    };
    info!("Starting scan of {}", root_path.display());

    // Re-check the root: it may have vanished since `start` validated it.
    let walked = if std::fs::metadata(&root_path).is_ok_and(|m| m.is_dir()) {
        walker::walk(
            root_path.clone(),
            &options,
            cancel_flag.clone(),
            events_tx.clone(),
            start,
        )
    } else {
        Err(ScanError::RootVanished {
            path: root_path.clone(),
        })
    };

    let (tree, issues, failure) = match walked {
        Ok((tree, issues)) => (tree, issues, None),
        Err(err) => {
            warn!("Scan of {} failed: {err}", root_path.display());
            let mut acc = TreeAccumulator::new(root_path.clone());
            if matches!(err, ScanError::RootVanished { .. }) {
                let root = acc.root();
                acc.mark_unreadable(root, &root_path, &err);
            }
            let (tree, issues) = acc.finish();
            (tree, issues, Some(err.to_string()))
        }
    };

    let report = {
        // `reset` refuses while this scan is live, so it is still current here.
        let mut current = scan.lock_current();
        let stopping = current
            .as_ref()
            .is_some_and(|shared| shared.state == ScanState::Stopping);
        let status = if failure.is_some() {
            ScanStatus::Failed
        } else if stopping || cancel_flag.load(Ordering::Relaxed) {
            ScanStatus::Stopped
        } else {
            ScanStatus::Completed
        };
        if let Some(shared) = current.as_mut() {
            shared.state = ScanState::from_status(status);
        }

        let timing = ScanTiming {
            started_at,
            finished_at: Utc::now(),
            elapsed: start.elapsed(),
        };
        Arc::new(ScanReport::assemble(tree, status, issues, timing, failure))
    };

    info!(
        "Scan of {} {:?}: {} files, {} dirs, {} bytes, {} errors in {:?}",
        root_path.display(),
        report.status,
        report.summary.file_count,
        report.summary.directory_count,
        report.summary.total_bytes,
        report.summary.error_count,
        report.summary.elapsed
    );
    debug_assert!(
        report.status != ScanStatus::Completed || report.tree.check_aggregates().is_ok(),
        "aggregation invariant broken in a completed scan"
    );

    // A dropped receiver just means nobody is listening.
    let _ = events_tx.send(ScanEvent::Complete(report.clone()));
    guard.completed = true;
    report
}
