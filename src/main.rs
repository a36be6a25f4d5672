//! dusk — a fast disk usage scanner.
//!
//! Thin binary entry point. All logic lives in the `dusk-core` crate; this
//! file parses flags, drives one scan, and prints or exports the report.
//!
//! Usage:
//!   dusk [PATH]                          Scan and print a summary
//!   dusk [PATH] --top 20                 Also list the 20 largest files
//!   dusk [PATH] --export out.csv         Write every node as CSV
//!   dusk [PATH] --export out.json --format json

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use crossbeam_channel::RecvTimeoutError;

use dusk_core::export::{self, ExportFormat};
use dusk_core::model::size::{format_count, format_size};
use dusk_core::{ScanEngine, ScanEvent, ScanOptions, ScanReport, ScanStatus};

#[derive(Parser)]
#[command(
    name = "dusk",
    version,
    about = "Scan a directory tree and report where the disk space goes"
)]
struct Cli {
    /// Directory to scan (defaults to current directory)
    #[arg(default_value = ".")]
    path: PathBuf,

    /// Maximum concurrent directory listings
    #[arg(short, long)]
    workers: Option<usize>,

    /// Emit a progress update every N entries
    #[arg(short, long)]
    interval: Option<u64>,

    /// Classify symlinks to files by their target
    #[arg(long)]
    follow_symlinks: bool,

    /// JSON file with scan options; flags override it
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Write the full report to this file
    #[arg(short, long)]
    export: Option<PathBuf>,

    /// Export encoding
    #[arg(short, long, default_value = "csv")]
    format: CliFormat,

    /// Number of largest files to list
    #[arg(short = 'n', long, default_value = "10")]
    top: usize,

    /// Stop the scan if no event arrives for this many seconds
    #[arg(long)]
    stall_timeout: Option<u64>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliFormat {
    Csv,
    Json,
}

impl From<CliFormat> for ExportFormat {
    fn from(format: CliFormat) -> Self {
        match format {
            CliFormat::Csv => ExportFormat::Csv,
            CliFormat::Json => ExportFormat::Json,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so stdout stays clean for the summary.
    tracing_subscriber::fmt()
        .with_max_level(if cli.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        })
        .with_writer(std::io::stderr)
        .init();

    let options = build_options(&cli)?;
    let report = scan(&cli, options)?;

    print_summary(&report, cli.top);

    if let Some(out) = &cli.export {
        let file = File::create(out)
            .with_context(|| format!("Failed to create {}", out.display()))?;
        let mut writer = BufWriter::new(file);
        export::export(&report, cli.format.into(), &mut writer)
            .with_context(|| format!("Failed to export to {}", out.display()))?;
        writer.flush()?;
        eprintln!("Exported report to {}", out.display());
    }

    if report.status == ScanStatus::Failed {
        bail!(
            "scan failed: {}",
            report.failure.as_deref().unwrap_or("unknown error")
        );
    }
    Ok(())
}

/// Config file first, then flags on top.
fn build_options(cli: &Cli) -> Result<ScanOptions> {
    let mut options = match &cli.config {
        Some(path) => ScanOptions::from_json_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => ScanOptions::default(),
    };
    if let Some(workers) = cli.workers {
        options.max_workers = workers;
    }
    if let Some(interval) = cli.interval {
        options.progress_interval_entries = interval;
    }
    if cli.follow_symlinks {
        options.follow_symlinks = true;
    }
    options.validate()?;
    Ok(options)
}

fn scan(cli: &Cli, options: ScanOptions) -> Result<std::sync::Arc<ScanReport>> {
    let engine = ScanEngine::new();
    let handle = engine
        .start(&cli.path, options)
        .with_context(|| format!("Cannot scan {}", cli.path.display()))?;

    let tick = Duration::from_millis(250);
    let stall_limit = cli.stall_timeout.map(Duration::from_secs);
    let mut quiet = Duration::ZERO;

    loop {
        match handle.events().recv_timeout(tick) {
            Ok(ScanEvent::Progress(p)) => {
                quiet = Duration::ZERO;
                eprint!(
                    "\r{} entries, {} ({:.1}s)   ",
                    format_count(p.entries_so_far),
                    format_size(p.bytes_so_far),
                    p.elapsed.as_secs_f64()
                );
            }
            Ok(ScanEvent::Complete(report)) => {
                eprintln!();
                return Ok(report);
            }
            Err(RecvTimeoutError::Timeout) => {
                quiet += tick;
                if let Some(limit) = stall_limit {
                    if quiet >= limit && !handle.is_stop_requested() {
                        tracing::warn!("No progress for {:?}, stopping scan", limit);
                        engine.stop(&handle);
                    }
                }
            }
            Err(RecvTimeoutError::Disconnected) => {
                bail!("scanner exited without a report");
            }
        }
    }
}

fn print_summary(report: &ScanReport, top: usize) {
    let summary = &report.summary;
    println!("Root:        {}", report.root_path().display());
    println!("Status:      {:?}", report.status);
    println!("Total size:  {}", format_size(summary.total_bytes));
    println!("Files:       {}", format_count(summary.file_count));
    println!("Directories: {}", format_count(summary.directory_count));
    println!("Symlinks:    {}", format_count(summary.symlink_count));
    println!("Errors:      {}", format_count(summary.error_count));
    println!("Elapsed:     {:.2}s", summary.elapsed.as_secs_f64());

    if report.status == ScanStatus::Stopped {
        println!("(partial: scan was stopped before finishing)");
    }

    let largest = report.largest_files(top);
    if !largest.is_empty() {
        println!();
        println!("Largest files:");
        for (path, size) in largest {
            println!("  {:>12}  {}", format_size(size), path.display());
        }
    }

    if !report.issues.is_empty() {
        println!();
        println!("Issues:");
        for issue in report.issues.iter().take(top) {
            println!("  {}: {}", issue.path.display(), issue.message);
        }
        if report.issues.len() > top {
            println!("  ... and {} more", report.issues.len() - top);
        }
    }
}
