/// A single node in the arena-allocated scan tree.
///
/// Nodes are stored in a flat `Vec<FileNode>`. Parent and child links are
/// `NodeIndex` values rather than pointers: the parent link is a lookup-only
/// back-reference used for ancestor-sum propagation, and ownership of every
/// node stays with the arena.
use compact_str::CompactString;
use serde::{Deserialize, Serialize};
use std::time::SystemTime;

/// Lightweight index into the arena `Vec<FileNode>`.
///
/// Uses `u32` to keep nodes small — supports up to ~4 billion nodes,
/// which is more than enough for any real filesystem.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeIndex(pub u32);

impl NodeIndex {
    /// Create a new `NodeIndex` from a `usize`.
    #[inline]
    pub fn new(index: usize) -> Self {
        debug_assert!(index <= u32::MAX as usize, "NodeIndex overflow");
        Self(index as u32)
    }

    /// Return the index as a `usize` for Vec indexing.
    #[inline]
    pub fn idx(self) -> usize {
        self.0 as usize
    }
}

/// Classification of one filesystem entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    File,
    Directory,
    /// Recorded with its own reported size, never traversed.
    Symlink,
    /// Stat or listing failed. Contributes 0 bytes.
    Inaccessible,
}

/// A single file, directory, symlink or inaccessible entry in the tree.
#[derive(Debug, Clone)]
pub struct FileNode {
    /// Entry name only (NOT the full path). The root carries its full path.
    pub name: CompactString,

    pub kind: NodeKind,

    /// Own size for files and symlinks. For directories, the sum of all
    /// descendant file sizes counted so far.
    pub size: u64,

    /// Number of descendant files counted so far (1 for a file itself).
    pub file_count: u64,

    /// Parent back-reference. `None` for the scan root.
    pub parent: Option<NodeIndex>,

    /// Children in discovery order (directories only).
    pub children: Vec<NodeIndex>,

    /// Last-modified timestamp, if the platform reported one.
    pub modified: Option<SystemTime>,

    /// Why the entry is inaccessible.
    pub error: Option<String>,

    /// `true` once a directory's listing finished. Directories discovered but
    /// never listed (scan stopped first) stay `false`.
    pub scanned: bool,
}

impl FileNode {
    /// Create a new file node with the given name and size.
    pub fn new_file(name: CompactString, size: u64, parent: Option<NodeIndex>) -> Self {
        Self {
            name,
            kind: NodeKind::File,
            size,
            file_count: 1,
            parent,
            children: Vec::new(),
            modified: None,
            error: None,
            scanned: true,
        }
    }

    /// Create a new, not yet listed, directory node.
    pub fn new_dir(name: CompactString, parent: Option<NodeIndex>) -> Self {
        Self {
            name,
            kind: NodeKind::Directory,
            size: 0,
            file_count: 0,
            parent,
            children: Vec::new(),
            modified: None,
            error: None,
            scanned: false,
        }
    }

    /// Create a symlink node. Its size is recorded but never aggregated.
    pub fn new_symlink(name: CompactString, size: u64, parent: Option<NodeIndex>) -> Self {
        Self {
            name,
            kind: NodeKind::Symlink,
            size,
            file_count: 0,
            parent,
            children: Vec::new(),
            modified: None,
            error: None,
            scanned: true,
        }
    }

    /// Create an error placeholder node (e.g. access denied).
    /// The node stays in the tree so consumers can see where errors occurred.
    pub fn new_error(name: CompactString, message: String, parent: Option<NodeIndex>) -> Self {
        Self {
            name,
            kind: NodeKind::Inaccessible,
            size: 0,
            file_count: 0,
            parent,
            children: Vec::new(),
            modified: None,
            error: Some(message),
            scanned: true,
        }
    }

    #[inline]
    pub fn is_dir(&self) -> bool {
        self.kind == NodeKind::Directory
    }

    /// Bytes this node contributes to its ancestors.
    #[inline]
    pub fn contributed_size(&self) -> u64 {
        match self.kind {
            NodeKind::File | NodeKind::Directory => self.size,
            NodeKind::Symlink | NodeKind::Inaccessible => 0,
        }
    }
}
