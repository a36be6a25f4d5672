/// Export of a finished [`ScanReport`] to structured formats.
///
/// The engine never writes files itself; these functions encode a report
/// into any `io::Write` the caller supplies.
///
/// - [`flat`] — one CSV row per node (`path,kind,size,...`).
/// - [`nested`] — hierarchical JSON mirroring the node tree, readable back
///   with [`nested::read_json`].
pub mod flat;
pub mod nested;

use crate::report::ScanReport;
use std::io::Write;
use thiserror::Error;

pub use flat::{flat_rows, write_csv, FlatRow};
pub use nested::{read_json, to_nested, write_json, NestedNode, NestedReport};

/// Errors raised while encoding or decoding an export.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("export I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV encoding failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON encoding failed: {0}")]
    Json(#[from] serde_json::Error),
}

/// Supported export encodings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// Flat rows, one per node.
    Csv,
    /// Nested tree, pretty-printed.
    Json,
}

/// Encode `report` in `format` into `writer`.
pub fn export<W: Write>(
    report: &ScanReport,
    format: ExportFormat,
    writer: W,
) -> Result<(), ExportError> {
    match format {
        ExportFormat::Csv => write_csv(report, writer),
        ExportFormat::Json => write_json(report, writer, true),
    }
}
