/// Frozen, read-only scan tree.
///
/// All nodes live in a single `Vec<FileNode>` handed over by the
/// `TreeAccumulator` at finalisation. Nothing mutates it afterwards.
use super::file_node::{FileNode, NodeIndex, NodeKind};
use std::path::{Path, PathBuf};

/// The complete node tree produced by one scan.
#[derive(Debug, Clone)]
pub struct FileTree {
    nodes: Vec<FileNode>,
    root: NodeIndex,
    root_path: PathBuf,
}

impl FileTree {
    pub(crate) fn from_parts(nodes: Vec<FileNode>, root: NodeIndex, root_path: PathBuf) -> Self {
        Self {
            nodes,
            root,
            root_path,
        }
    }

    /// Index of the scan root.
    #[inline]
    pub fn root(&self) -> NodeIndex {
        self.root
    }

    /// Absolute path that was scanned.
    pub fn root_path(&self) -> &Path {
        &self.root_path
    }

    /// Get the node at the given index.
    #[inline]
    pub fn node(&self, index: NodeIndex) -> &FileNode {
        &self.nodes[index.idx()]
    }

    /// All nodes in arena (allocation) order.
    pub fn nodes(&self) -> &[FileNode] {
        &self.nodes
    }

    /// Direct children of a node, in discovery order.
    #[inline]
    pub fn children(&self, parent: NodeIndex) -> &[NodeIndex] {
        &self.nodes[parent.idx()].children
    }

    /// Total bytes counted under the root.
    pub fn total_size(&self) -> u64 {
        self.node(self.root).size
    }

    /// Reconstruct the absolute path for a node by walking up to the root.
    pub fn full_path(&self, index: NodeIndex) -> PathBuf {
        let mut segments = Vec::new();
        let mut current = index;
        while let Some(parent) = self.nodes[current.idx()].parent {
            segments.push(self.nodes[current.idx()].name.as_str());
            current = parent;
        }
        let mut path = self.root_path.clone();
        for segment in segments.into_iter().rev() {
            path.push(segment);
        }
        path
    }

    /// Pre-order (depth-first) listing of every node, children in discovery order.
    pub fn depth_first(&self) -> Vec<NodeIndex> {
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut stack = vec![self.root];
        while let Some(idx) = stack.pop() {
            order.push(idx);
            stack.extend(self.children(idx).iter().rev());
        }
        order
    }

    /// Direct children sorted for display: directories first, then by size descending.
    pub fn children_sorted_by_size(&self, parent: NodeIndex) -> Vec<NodeIndex> {
        let mut children = self.children(parent).to_vec();
        children.sort_by(|a, b| {
            let a_node = self.node(*a);
            let b_node = self.node(*b);
            b_node
                .is_dir()
                .cmp(&a_node.is_dir())
                .then(b_node.size.cmp(&a_node.size))
        });
        children
    }

    /// The N largest individual files, sorted descending by size.
    ///
    /// Uses `select_nth_unstable_by` to bring the top-N to the front, then
    /// sorts only those N elements.
    pub fn largest_files(&self, n: usize) -> Vec<NodeIndex> {
        if n == 0 {
            return Vec::new();
        }

        let mut files: Vec<NodeIndex> = self
            .nodes
            .iter()
            .enumerate()
            .filter(|(_, node)| node.kind == NodeKind::File)
            .map(|(i, _)| NodeIndex::new(i))
            .collect();

        let by_size_desc =
            |a: &NodeIndex, b: &NodeIndex| self.node(*b).size.cmp(&self.node(*a).size);
        if files.len() > n {
            files.select_nth_unstable_by(n - 1, by_size_desc);
            files.truncate(n);
        }
        files.sort_by(by_size_desc);
        files
    }

    /// Verify that every directory's size equals the sum of what its children
    /// contribute. Returns the first offending directory.
    pub fn check_aggregates(&self) -> Result<(), NodeIndex> {
        for (i, node) in self.nodes.iter().enumerate() {
            if !node.is_dir() {
                continue;
            }
            let sum: u64 = node
                .children
                .iter()
                .map(|c| self.node(*c).contributed_size())
                .sum();
            if sum != node.size {
                return Err(NodeIndex::new(i));
            }
        }
        Ok(())
    }

    /// Total number of nodes in the tree.
    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns `true` if the tree contains no nodes.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use compact_str::CompactString;

    /// root -> [docs/ -> (a.txt: 100, b.txt: 200), big.bin: 1000]
    fn sample_tree() -> FileTree {
        let mut nodes = Vec::new();
        let mut root = FileNode::new_dir(CompactString::new("/data"), None);
        root.size = 1300;
        root.children = vec![NodeIndex(1), NodeIndex(4)];
        nodes.push(root);

        let mut docs = FileNode::new_dir(CompactString::new("docs"), Some(NodeIndex(0)));
        docs.size = 300;
        docs.children = vec![NodeIndex(2), NodeIndex(3)];
        nodes.push(docs);
        nodes.push(FileNode::new_file(
            CompactString::new("a.txt"),
            100,
            Some(NodeIndex(1)),
        ));
        nodes.push(FileNode::new_file(
            CompactString::new("b.txt"),
            200,
            Some(NodeIndex(1)),
        ));
        nodes.push(FileNode::new_file(
            CompactString::new("big.bin"),
            1000,
            Some(NodeIndex(0)),
        ));

        FileTree::from_parts(nodes, NodeIndex(0), PathBuf::from("/data"))
    }

    #[test]
    fn test_full_path() {
        let tree = sample_tree();
        assert_eq!(tree.full_path(NodeIndex(3)), PathBuf::from("/data/docs/b.txt"));
        assert_eq!(tree.full_path(tree.root()), PathBuf::from("/data"));
    }

    #[test]
    fn test_depth_first_keeps_discovery_order() {
        let tree = sample_tree();
        let names: Vec<&str> = tree
            .depth_first()
            .into_iter()
            .map(|i| tree.node(i).name.as_str())
            .collect();
        assert_eq!(names, ["/data", "docs", "a.txt", "b.txt", "big.bin"]);
    }

    #[test]
    fn test_children_sorted() {
        let tree = sample_tree();
        let sorted = tree.children_sorted_by_size(tree.root());
        // Directory first even though big.bin is larger.
        assert_eq!(sorted, vec![NodeIndex(1), NodeIndex(4)]);
    }

    #[test]
    fn test_largest_files() {
        let tree = sample_tree();
        assert_eq!(tree.largest_files(2), vec![NodeIndex(4), NodeIndex(3)]);
        assert_eq!(tree.largest_files(10).len(), 3);
        assert!(tree.largest_files(0).is_empty());
    }

    #[test]
    fn test_check_aggregates_detects_stale_dir() {
        let mut tree = sample_tree();
        assert_eq!(tree.check_aggregates(), Ok(()));
        tree.nodes[1].size = 250;
        assert_eq!(tree.check_aggregates(), Err(NodeIndex(0)));
    }
}
