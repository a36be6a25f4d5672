/// Path classification — the atomic unit of scanning work.
///
/// One `symlink_metadata` call per entry (plus one `metadata` call for
/// symlinks when following them). Pure read of filesystem metadata; no
/// failure here is fatal to a scan.
use crate::error::ScanError;
use crate::model::NodeKind;
use std::fs::Metadata;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// One classified filesystem entry. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub path: PathBuf,
    pub kind: NodeKind,
    /// 0 for directories; aggregation happens in the accumulator.
    pub size: u64,
    pub modified: Option<SystemTime>,
    /// Set when `kind == Inaccessible`.
    pub error: Option<String>,
}

impl Entry {
    /// Build an inaccessible entry from the failure that caused it.
    pub fn inaccessible(path: PathBuf, err: &ScanError) -> Self {
        Self {
            path,
            kind: NodeKind::Inaccessible,
            size: 0,
            modified: None,
            error: Some(err.to_string()),
        }
    }

    /// Final path component, or the whole path for roots like `/`.
    pub fn name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.to_string_lossy().into_owned())
    }
}

/// Classifies single paths without ever descending into them.
#[derive(Debug, Clone, Copy, Default)]
pub struct PathClassifier {
    follow_symlinks: bool,
}

impl PathClassifier {
    pub fn new(follow_symlinks: bool) -> Self {
        Self { follow_symlinks }
    }

    /// Classify `path`. Stat failures yield an `Inaccessible` entry.
    pub fn classify(&self, path: &Path) -> Entry {
        match self.stat(path) {
            Ok((kind, size, modified)) => Entry {
                path: path.to_path_buf(),
                kind,
                size,
                modified,
                error: None,
            },
            Err(err) => Entry::inaccessible(path.to_path_buf(), &err),
        }
    }

    fn stat(&self, path: &Path) -> Result<(NodeKind, u64, Option<SystemTime>), ScanError> {
        let meta = std::fs::symlink_metadata(path).map_err(|e| ScanError::inaccessible(path, e))?;

        if !meta.file_type().is_symlink() {
            return Ok(describe(&meta));
        }

        if self.follow_symlinks {
            let target = std::fs::metadata(path).map_err(|e| ScanError::inaccessible(path, e))?;
            // A followed link to a file counts as that file. Links to
            // directories stay symlinks so traversal can never loop.
            if !target.is_dir() {
                return Ok((NodeKind::File, target.len(), target.modified().ok()));
            }
        }

        Ok((NodeKind::Symlink, meta.len(), meta.modified().ok()))
    }
}

fn describe(meta: &Metadata) -> (NodeKind, u64, Option<SystemTime>) {
    if meta.is_dir() {
        (NodeKind::Directory, 0, meta.modified().ok())
    } else {
        // Regular files and special files (fifos, sockets, devices) alike.
        (NodeKind::File, meta.len(), meta.modified().ok())
    }
}
