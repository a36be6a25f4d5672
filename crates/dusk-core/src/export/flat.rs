/// Flat (tabular) export: one row per node in depth-first discovery order.
use super::ExportError;
use crate::model::NodeKind;
use crate::report::ScanReport;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::io::Write;

/// One exported node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlatRow {
    pub path: String,
    pub kind: NodeKind,
    pub size: u64,
    pub file_count: u64,
    pub modified: Option<DateTime<Utc>>,
    pub error: Option<String>,
}

/// Every node of the report's tree as a row, root first.
pub fn flat_rows(report: &ScanReport) -> Vec<FlatRow> {
    let tree = &report.tree;
    tree.depth_first()
        .into_iter()
        .map(|idx| {
            let node = tree.node(idx);
            FlatRow {
                path: tree.full_path(idx).to_string_lossy().into_owned(),
                kind: node.kind,
                size: node.size,
                file_count: node.file_count,
                modified: node.modified.map(DateTime::<Utc>::from),
                error: node.error.clone(),
            }
        })
        .collect()
}

/// Write the report as CSV with a header row.
pub fn write_csv<W: Write>(report: &ScanReport, writer: W) -> Result<(), ExportError> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    for row in flat_rows(report) {
        csv_writer.serialize(row)?;
    }
    csv_writer.flush()?;
    Ok(())
}
