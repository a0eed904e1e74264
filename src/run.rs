// src/run.rs

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{info, instrument, warn};

use crate::error::Result;
use crate::process::{load_table, partition::partition_table_with};
use crate::progress::SplitObserver;
use crate::write::{write_partitions_with, PartitionSink, WriteReport};

/// What one run produced.
#[derive(Debug)]
pub struct RunSummary {
    pub input: PathBuf,
    pub rows: usize,
    pub brands: usize,
    pub report: WriteReport,
    pub elapsed: Duration,
}

impl RunSummary {
    pub fn files_written(&self) -> usize {
        self.report.written.len()
    }

    pub fn failed_brands(&self) -> Vec<&str> {
        self.report.failed_brands()
    }
}

/// Load `input`, split it by brand and write every brand through `sink`.
///
/// Loading and schema problems abort the run before anything is written.
/// Per-brand write failures are collected in the summary instead.
#[instrument(level = "info", skip(sink, observer), fields(input = %input.display()))]
pub fn split_file(
    input: &Path,
    sink: &mut dyn PartitionSink,
    observer: &mut dyn SplitObserver,
) -> Result<RunSummary> {
    let start = Instant::now();

    let table = load_table(input)?;
    let partitions = partition_table_with(&table, observer)?;
    let report = write_partitions_with(&partitions, &table.headers, sink, observer);

    let summary = RunSummary {
        input: input.to_path_buf(),
        rows: table.num_rows(),
        brands: partitions.len(),
        report,
        elapsed: start.elapsed(),
    };

    if summary.report.is_complete() {
        info!(
            rows = summary.rows,
            files = summary.files_written(),
            elapsed = ?summary.elapsed,
            "split complete"
        );
    } else {
        warn!(
            files = summary.files_written(),
            failed = ?summary.failed_brands(),
            "split finished with failed brands"
        );
    }
    Ok(summary)
}
