// src/progress.rs

use indicatif::{ProgressBar, ProgressStyle};

/// Hooks called while a table is split and written.
///
/// Observers only watch; nothing they do feeds back into the split.
pub trait SplitObserver {
    /// Called once per source row after it has been assigned to a brand.
    fn row_processed(&mut self, _index: usize, _total: usize) {}

    /// Called once per partition after its write was attempted.
    fn partition_written(&mut self, _index: usize, _total: usize, _brand: &str, _ok: bool) {}
}

/// Observer that ignores every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl SplitObserver for NoProgress {}

/// Terminal progress bars for the CLI.
pub struct BarProgress {
    rows: Option<ProgressBar>,
    writes: Option<ProgressBar>,
}

impl BarProgress {
    pub fn new() -> Self {
        Self {
            rows: None,
            writes: None,
        }
    }

    fn bar(len: usize) -> ProgressBar {
        let bar = ProgressBar::new(len as u64);
        if let Ok(style) = ProgressStyle::with_template(
            "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}",
        ) {
            bar.set_style(style.progress_chars("#>-"));
        }
        bar
    }
}

impl Default for BarProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl SplitObserver for BarProgress {
    fn row_processed(&mut self, index: usize, total: usize) {
        let bar = self.rows.get_or_insert_with(|| Self::bar(total));
        bar.inc(1);
        if index + 1 == total {
            bar.finish_with_message("rows split");
        }
    }

    fn partition_written(&mut self, index: usize, total: usize, brand: &str, ok: bool) {
        let bar = self.writes.get_or_insert_with(|| Self::bar(total));
        if ok {
            bar.println(format!("[{}/{}] wrote brand '{}'", index + 1, total, brand));
        } else {
            bar.println(format!("[{}/{}] FAILED brand '{}'", index + 1, total, brand));
        }
        bar.inc(1);
        if index + 1 == total {
            bar.finish_with_message("files written");
        }
    }
}
