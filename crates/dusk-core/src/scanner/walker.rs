/// Bounded parallel directory walker.
///
/// Depth-first over a `rayon` pool sized by `max_workers`: the worker that
/// lists a directory classifies its children one by one and spawns each
/// subdirectory as a new task. Independent subtrees therefore overlap their
/// I/O latency, while one directory's listing stays sequential and keeps the
/// filesystem's order.
///
/// # Shared state
///
/// Two `parking_lot` mutexes, never held at the same time:
/// - the `TreeAccumulator` (arena, path map, issues), locked briefly per entry;
/// - the `ProgressTracker`, which also sends the event so progress leaves in
///   the order it was counted.
///
/// # Cancellation
///
/// Cooperative. Every task checks the cancel flag before listing its
/// directory and unwinds without visiting it; a listing already in flight
/// runs to the end.
use crate::config::ScanOptions;
use crate::error::ScanError;
use crate::model::{FileTree, NodeIndex, NodeKind};
use crate::report::{IssueKind, ScanIssue};
use crate::scanner::accumulator::TreeAccumulator;
use crate::scanner::classify::PathClassifier;
use crate::scanner::progress::{ProgressTracker, ScanEvent};
use crossbeam_channel::Sender;
use parking_lot::Mutex;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

struct WalkContext {
    classifier: PathClassifier,
    accumulator: Mutex<TreeAccumulator>,
    progress: Mutex<ProgressTracker>,
    cancel_flag: Arc<AtomicBool>,
}

impl WalkContext {
    #[inline]
    fn is_cancelled(&self) -> bool {
        self.cancel_flag.load(Ordering::Relaxed)
    }
}

/// Walk the tree under `root_path` and return the frozen tree and its issues.
///
/// Blocks the calling thread until every spawned task has finished (or
/// unwound after cancellation). Fails only if the worker pool cannot be built.
pub(crate) fn walk(
    root_path: PathBuf,
    options: &ScanOptions,
    cancel_flag: Arc<AtomicBool>,
    events_tx: Sender<ScanEvent>,
    start: Instant,
) -> Result<(FileTree, Vec<ScanIssue>), ScanError> {
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(options.max_workers)
        .thread_name(|i| format!("dusk-walker-{i}"))
        .build()
        .map_err(|e| ScanError::Spawn {
            source: std::io::Error::other(e.to_string()),
        })?;

    let ctx = WalkContext {
        classifier: PathClassifier::new(options.follow_symlinks),
        accumulator: Mutex::new(TreeAccumulator::new(root_path.clone())),
        progress: Mutex::new(ProgressTracker::new(
            start,
            options.progress_interval_entries,
            events_tx,
        )),
        cancel_flag,
    };

    let root_idx = ctx.accumulator.lock().root();
    pool.scope(|scope| walk_dir(scope, &ctx, root_path, root_idx));

    debug!(
        "Walk finished in {:?} ({} workers, cancelled: {})",
        start.elapsed(),
        options.max_workers,
        ctx.is_cancelled()
    );

    Ok(ctx.accumulator.into_inner().finish())
}

/// List one directory, attach its children, and spawn its subdirectories.
fn walk_dir<'scope>(
    scope: &rayon::Scope<'scope>,
    ctx: &'scope WalkContext,
    dir: PathBuf,
    index: NodeIndex,
) {
    if ctx.is_cancelled() {
        return;
    }

    let listing = match std::fs::read_dir(&dir) {
        Ok(listing) => listing,
        Err(e) => {
            let err = ScanError::inaccessible(&dir, e);
            warn!("{err}");
            ctx.accumulator.lock().mark_unreadable(index, &dir, &err);
            return;
        }
    };

    for dirent in listing {
        let path = match dirent {
            Ok(dirent) => dirent.path(),
            Err(e) => {
                let err = ScanError::inaccessible(&dir, e);
                warn!("{err}");
                ctx.accumulator
                    .lock()
                    .record_issue(dir.clone(), IssueKind::Listing, err.to_string());
                continue;
            }
        };

        // Stat outside any lock — this is the expensive syscall.
        let entry = ctx.classifier.classify(&path);
        if let Some(message) = &entry.error {
            warn!("{message}");
        }
        let is_dir = entry.kind == NodeKind::Directory;

        let child = ctx.accumulator.lock().add_child(&dir, entry.clone());
        ctx.progress.lock().record(&entry);

        if let (true, Some(child)) = (is_dir, child) {
            scope.spawn(move |scope| walk_dir(scope, ctx, path, child));
        }
    }

    ctx.accumulator.lock().mark_listed(index);
}
