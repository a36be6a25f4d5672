/// dusk core — the disk usage scanning engine.
///
/// This crate contains all business logic with zero UI dependencies.
/// Callers (the `dusk` CLI, or any other frontend) start a scan, drain its
/// event channel, and render or export the resulting report.
///
/// # Modules
///
/// - [`scanner`] — `ScanEngine`, background traversal, progress events, cancellation.
/// - [`model`] — Arena-allocated node tree and size formatting.
/// - [`report`] — The immutable `ScanReport` produced at the end of every scan.
/// - [`export`] — CSV (flat) and JSON (nested) encodings of a report.
/// - [`config`] — `ScanOptions` and their JSON loading.
/// - [`error`] — `ScanError`.
pub mod config;
pub mod error;
pub mod export;
pub mod model;
pub mod report;
pub mod scanner;

pub use config::ScanOptions;
pub use error::ScanError;
pub use report::{ReportSummary, ScanIssue, ScanReport, ScanStatus};
pub use scanner::progress::{ScanEvent, ScanProgress};
pub use scanner::{ScanEngine, ScanHandle, ScanState};
