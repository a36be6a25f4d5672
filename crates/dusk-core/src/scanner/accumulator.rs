/// Incrementally-built scan tree shared by the traversal workers.
///
/// Nodes are appended to a flat arena as they are discovered. Directory
/// nodes are registered in a path → `NodeIndex` map so a worker can attach
/// children in O(1) no matter which order subdirectories complete in.
///
/// Sizes are propagated up the parent chain at insertion time instead of in
/// a post-order pass, so ancestors always equal the sum of whatever has been
/// counted beneath them and a progress snapshot is accurate-so-far.
///
/// The accumulator itself is not synchronised; the walker wraps it in a
/// single `parking_lot::Mutex`. Traversal is I/O-bound, so one coarse lock
/// is not the bottleneck.
use crate::error::ScanError;
use crate::model::{FileNode, FileTree, NodeIndex, NodeKind};
use crate::report::{IssueKind, ScanIssue};
use crate::scanner::classify::Entry;
use compact_str::CompactString;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::warn;

pub struct TreeAccumulator {
    nodes: Vec<FileNode>,
    root: NodeIndex,
    root_path: PathBuf,
    /// Directory path → arena index. Scan-lifetime only.
    dirs: HashMap<PathBuf, NodeIndex>,
    issues: Vec<ScanIssue>,
}

impl TreeAccumulator {
    /// Create an accumulator holding only the root directory node.
    pub fn new(root_path: PathBuf) -> Self {
        let root = NodeIndex::new(0);
        let name = CompactString::new(root_path.to_string_lossy());
        let mut dirs = HashMap::with_capacity(1_024);
        dirs.insert(root_path.clone(), root);
        Self {
            nodes: vec![FileNode::new_dir(name, None)],
            root,
            root_path,
            dirs,
            issues: Vec::new(),
        }
    }

    #[inline]
    pub fn root(&self) -> NodeIndex {
        self.root
    }

    #[inline]
    pub fn node(&self, index: NodeIndex) -> &FileNode {
        &self.nodes[index.idx()]
    }

    /// Look up a directory node by absolute path.
    pub fn lookup(&self, path: &Path) -> Option<NodeIndex> {
        self.dirs.get(path).copied()
    }

    /// Bytes counted under the root so far.
    pub fn bytes_so_far(&self) -> u64 {
        self.nodes[self.root.idx()].size
    }

    /// Insert `entry` under the directory at `parent_path`.
    ///
    /// Files propagate their size to every ancestor immediately; directories
    /// are registered for later attachment; inaccessible entries contribute
    /// nothing but record one issue. Returns `None` if the parent is unknown.
    pub fn add_child(&mut self, parent_path: &Path, entry: Entry) -> Option<NodeIndex> {
        let Some(parent) = self.lookup(parent_path) else {
            warn!("Dropping {}: parent {} not in tree", entry.path.display(), parent_path.display());
            return None;
        };

        let name = CompactString::new(entry.name());
        let mut node = match entry.kind {
            NodeKind::File => FileNode::new_file(name, entry.size, Some(parent)),
            NodeKind::Directory => FileNode::new_dir(name, Some(parent)),
            NodeKind::Symlink => FileNode::new_symlink(name, entry.size, Some(parent)),
            NodeKind::Inaccessible => {
                let message = entry.error.clone().unwrap_or_default();
                self.issues.push(ScanIssue {
                    path: entry.path.clone(),
                    kind: IssueKind::Stat,
                    message: message.clone(),
                });
                FileNode::new_error(name, message, Some(parent))
            }
        };
        node.modified = entry.modified;

        let idx = NodeIndex::new(self.nodes.len());
        self.nodes.push(node);
        self.nodes[parent.idx()].children.push(idx);

        match entry.kind {
            NodeKind::File => self.propagate_from(parent, entry.size, 1),
            NodeKind::Directory => {
                self.dirs.insert(entry.path, idx);
            }
            NodeKind::Symlink | NodeKind::Inaccessible => {}
        }
        Some(idx)
    }

    /// Add `delta` bytes to the directory at `path` and every ancestor up to
    /// the root. Returns `false` if `path` is not a known directory.
    pub fn propagate_size(&mut self, path: &Path, delta: u64) -> bool {
        match self.lookup(path) {
            Some(idx) => {
                self.propagate_from(idx, delta, 0);
                true
            }
            None => false,
        }
    }

    fn propagate_from(&mut self, start: NodeIndex, delta: u64, files: u64) {
        let mut current = Some(start);
        while let Some(idx) = current {
            let node = &mut self.nodes[idx.idx()];
            node.size += delta;
            node.file_count += files;
            current = node.parent;
        }
    }

    /// Mark a directory's listing as finished.
    pub fn mark_listed(&mut self, index: NodeIndex) {
        self.nodes[index.idx()].scanned = true;
    }

    /// A directory could not be listed: record it as one inaccessible entry.
    ///
    /// Called before any child was attached, so there is nothing to subtract.
    pub fn mark_unreadable(&mut self, index: NodeIndex, path: &Path, err: &ScanError) {
        let kind = match err {
            ScanError::RootVanished { .. } => IssueKind::RootVanished,
            _ => IssueKind::Listing,
        };
        let message = err.to_string();
        let node = &mut self.nodes[index.idx()];
        debug_assert!(node.children.is_empty(), "unreadable directory already has children");
        node.kind = NodeKind::Inaccessible;
        node.error = Some(message.clone());
        node.scanned = true;
        self.issues.push(ScanIssue {
            path: path.to_path_buf(),
            kind,
            message,
        });
    }

    /// Record an issue that has no node of its own (e.g. a failed directory
    /// entry read mid-listing).
    pub fn record_issue(&mut self, path: PathBuf, kind: IssueKind, message: String) {
        self.issues.push(ScanIssue {
            path,
            kind,
            message,
        });
    }

    /// Freeze the arena into a read-only tree, handing over the recorded issues.
    pub fn finish(self) -> (FileTree, Vec<ScanIssue>) {
        (
            FileTree::from_parts(self.nodes, self.root, self.root_path),
            self.issues,
        )
    }
}
