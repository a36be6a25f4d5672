/// End-to-end export tests: scan a real temporary tree, then encode the
/// report as CSV and JSON and read the output back.
use dusk_core::export::{self, flat_rows, read_json, to_nested, ExportFormat, FlatRow};
use dusk_core::model::NodeKind;
use dusk_core::{ScanEngine, ScanEvent, ScanOptions, ScanReport, ScanStatus};
use std::fs;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

fn build_test_tree(root: &Path) {
    let docs = root.join("docs");
    fs::create_dir_all(docs.join("old")).unwrap();
    write_bytes(&docs.join("notes, draft.txt"), 120);
    write_bytes(&docs.join("old").join("a.log"), 80);
    write_bytes(&root.join("image.png"), 800);
}

fn write_bytes(path: &Path, n: usize) {
    let mut f = fs::File::create(path).unwrap();
    f.write_all(&vec![7u8; n]).unwrap();
}

fn scan(root: &Path) -> Arc<ScanReport> {
    let engine = ScanEngine::new();
    let handle = engine.start(root, ScanOptions::default()).unwrap();
    loop {
        match handle.events().recv_timeout(Duration::from_secs(30)) {
            Ok(ScanEvent::Progress(_)) => continue,
            Ok(ScanEvent::Complete(report)) => return report,
            Err(e) => panic!("scanner did not complete: {e}"),
        }
    }
}

#[test]
fn csv_export_has_one_row_per_node() {
    let tmp = TempDir::new().unwrap();
    build_test_tree(tmp.path());
    let report = scan(tmp.path());
    assert_eq!(report.status, ScanStatus::Completed);

    let mut out = Vec::new();
    export::export(&report, ExportFormat::Csv, &mut out).unwrap();

    let text = String::from_utf8(out.clone()).unwrap();
    let header = text.lines().next().unwrap();
    assert_eq!(header, "path,kind,size,file_count,modified,error");

    let mut reader = csv::Reader::from_reader(out.as_slice());
    let rows: Vec<FlatRow> = reader.deserialize().map(|r| r.unwrap()).collect();
    assert_eq!(rows.len(), report.tree.len());
    assert_eq!(rows, flat_rows(&report));

    // Root first, with the whole-tree totals.
    assert_eq!(Path::new(&rows[0].path), report.root_path());
    assert_eq!(rows[0].kind, NodeKind::Directory);
    assert_eq!(rows[0].size, 1_000);
    assert_eq!(rows[0].file_count, 3);

    // Names containing the delimiter survive quoting.
    let draft = rows
        .iter()
        .find(|r| r.path.ends_with("notes, draft.txt"))
        .expect("draft row missing");
    assert_eq!(draft.kind, NodeKind::File);
    assert_eq!(draft.size, 120);
    assert!(draft.modified.is_some());
}

#[test]
fn json_export_reads_back_identically() {
    let tmp = TempDir::new().unwrap();
    build_test_tree(tmp.path());
    let report = scan(tmp.path());

    let mut out = Vec::new();
    export::export(&report, ExportFormat::Json, &mut out).unwrap();
    let parsed = read_json(out.as_slice()).unwrap();

    assert_eq!(parsed, to_nested(&report));
    assert_eq!(parsed.summary.total_bytes, 1_000);
    assert_eq!(parsed.tree.children.len(), 2);

    let docs = parsed
        .tree
        .children
        .iter()
        .find(|c| c.name == "docs")
        .unwrap();
    assert_eq!(docs.size, 200);
    assert_eq!(docs.file_count, 2);
    assert!(docs.scanned);
}

#[test]
fn json_export_of_empty_root() {
    let tmp = TempDir::new().unwrap();
    let report = scan(tmp.path());

    let mut out = Vec::new();
    export::write_json(&report, &mut out, false).unwrap();
    let parsed = read_json(out.as_slice()).unwrap();

    assert_eq!(parsed.tree.size, 0);
    assert!(parsed.tree.children.is_empty());
    assert!(parsed.issues.is_empty());
    assert_eq!(parsed.failure, None);
}
