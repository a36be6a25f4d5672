/// Final, immutable scan snapshot.
///
/// A report is assembled exactly once per scan attempt, at its terminal
/// transition, from the frozen tree plus counters computed in one pass
/// over the arena.
use crate::model::{FileTree, NodeIndex, NodeKind};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// How a scan ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanStatus {
    /// Every reachable path was visited.
    Completed,
    /// `stop` was requested; totals cover only what was visited.
    Stopped,
    /// The root was unreachable when traversal began.
    Failed,
}

/// What went wrong for one recorded issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    /// Metadata for an entry could not be read.
    Stat,
    /// A directory could not be listed (or a listing broke off).
    Listing,
    /// The scan root disappeared before traversal.
    RootVanished,
}

/// A non-fatal problem recorded during the scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanIssue {
    pub path: PathBuf,
    pub kind: IssueKind,
    pub message: String,
}

/// Summary counters of one scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportSummary {
    /// Bytes of every accessible file under the root.
    pub total_bytes: u64,
    pub file_count: u64,
    /// Includes the root itself.
    pub directory_count: u64,
    pub symlink_count: u64,
    /// Number of recorded issues. Inaccessible entries are never in the totals.
    pub error_count: u64,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub elapsed: Duration,
}

/// Everything a consumer (renderer, exporter) needs from one scan.
#[derive(Debug, Clone)]
pub struct ScanReport {
    pub status: ScanStatus,
    pub summary: ReportSummary,
    pub tree: FileTree,
    pub issues: Vec<ScanIssue>,
    /// Set when `status == Failed`.
    pub failure: Option<String>,
}

/// Timing of one scan attempt, captured by the engine.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ScanTiming {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub elapsed: Duration,
}

impl ScanReport {
    /// Freeze a tree into a report, computing counters in a single pass.
    pub(crate) fn assemble(
        tree: FileTree,
        status: ScanStatus,
        issues: Vec<ScanIssue>,
        timing: ScanTiming,
        failure: Option<String>,
    ) -> Self {
        let mut file_count = 0;
        let mut directory_count = 0;
        let mut symlink_count = 0;
        for node in tree.nodes() {
            match node.kind {
                NodeKind::File => file_count += 1,
                NodeKind::Directory => directory_count += 1,
                NodeKind::Symlink => symlink_count += 1,
                NodeKind::Inaccessible => {}
            }
        }

        let summary = ReportSummary {
            total_bytes: tree.node(tree.root()).contributed_size(),
            file_count,
            directory_count,
            symlink_count,
            error_count: issues.len() as u64,
            started_at: timing.started_at,
            finished_at: timing.finished_at,
            elapsed: timing.elapsed,
        };

        Self {
            status,
            summary,
            tree,
            issues,
            failure,
        }
    }

    pub fn root_path(&self) -> &Path {
        self.tree.root_path()
    }

    /// Top-N largest files as `(absolute path, size)`.
    pub fn largest_files(&self, n: usize) -> Vec<(PathBuf, u64)> {
        self.tree
            .largest_files(n)
            .into_iter()
            .map(|idx: NodeIndex| (self.tree.full_path(idx), self.tree.node(idx).size))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::accumulator::TreeAccumulator;
    use crate::scanner::classify::Entry;

    fn timing() -> ScanTiming {
        let now = Utc::now();
        ScanTiming {
            started_at: now,
            finished_at: now,
            elapsed: Duration::ZERO,
        }
    }

    fn entry(path: &str, kind: NodeKind, size: u64) -> Entry {
        Entry {
            path: PathBuf::from(path),
            kind,
            size,
            modified: None,
            error: (kind == NodeKind::Inaccessible).then(|| "denied".to_string()),
        }
    }

    #[test]
    fn test_summary_counts_each_kind() {
        let mut acc = TreeAccumulator::new(PathBuf::from("/r"));
        let root = Path::new("/r");
        acc.add_child(root, entry("/r/a", NodeKind::File, 100));
        acc.add_child(root, entry("/r/sub", NodeKind::Directory, 0));
        acc.add_child(Path::new("/r/sub"), entry("/r/sub/b", NodeKind::File, 200));
        acc.add_child(root, entry("/r/link", NodeKind::Symlink, 7));
        acc.add_child(root, entry("/r/bad", NodeKind::Inaccessible, 0));

        let (tree, issues) = acc.finish();
        let report = ScanReport::assemble(tree, ScanStatus::Completed, issues, timing(), None);

        assert_eq!(report.summary.total_bytes, 300);
        assert_eq!(report.summary.file_count, 2);
        assert_eq!(report.summary.directory_count, 2);
        assert_eq!(report.summary.symlink_count, 1);
        assert_eq!(report.summary.error_count, 1);
        assert_eq!(
            report.largest_files(1),
            vec![(PathBuf::from("/r/sub/b"), 200)]
        );
    }
}
