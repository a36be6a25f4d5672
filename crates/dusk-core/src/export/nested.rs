/// Hierarchical export: the node tree as nested JSON plus the summary.
use super::ExportError;
use crate::model::{FileTree, NodeIndex, NodeKind};
use crate::report::{ReportSummary, ScanIssue, ScanReport, ScanStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};
use std::path::PathBuf;

/// One node with its children inlined, in discovery order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NestedNode {
    pub name: String,
    pub kind: NodeKind,
    pub size: u64,
    pub file_count: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub scanned: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<NestedNode>,
}

/// A whole report in hierarchical form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NestedReport {
    pub root_path: PathBuf,
    pub status: ScanStatus,
    pub summary: ReportSummary,
    #[serde(default)]
    pub issues: Vec<ScanIssue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure: Option<String>,
    pub tree: NestedNode,
}

/// Convert a report into its nested form.
pub fn to_nested(report: &ScanReport) -> NestedReport {
    NestedReport {
        root_path: report.root_path().to_path_buf(),
        status: report.status,
        summary: report.summary.clone(),
        issues: report.issues.clone(),
        failure: report.failure.clone(),
        tree: nest(&report.tree, report.tree.root()),
    }
}

fn nest(tree: &FileTree, idx: NodeIndex) -> NestedNode {
    let node = tree.node(idx);
    NestedNode {
        name: node.name.to_string(),
        kind: node.kind,
        size: node.size,
        file_count: node.file_count,
        modified: node.modified.map(DateTime::<Utc>::from),
        error: node.error.clone(),
        scanned: node.scanned,
        children: tree
            .children(idx)
            .iter()
            .map(|child| nest(tree, *child))
            .collect(),
    }
}

/// Write the report as nested JSON.
pub fn write_json<W: Write>(report: &ScanReport, writer: W, pretty: bool) -> Result<(), ExportError> {
    let nested = to_nested(report);
    if pretty {
        serde_json::to_writer_pretty(writer, &nested)?;
    } else {
        serde_json::to_writer(writer, &nested)?;
    }
    Ok(())
}

/// Parse a document produced by [`write_json`].
pub fn read_json<R: Read>(reader: R) -> Result<NestedReport, ExportError> {
    Ok(serde_json::from_reader(reader)?)
}
