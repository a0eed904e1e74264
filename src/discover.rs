// src/discover.rs

use anyhow::{Context, Result};
use glob::{glob, Pattern};
use std::{fs, path::Path, path::PathBuf};
use tracing::{debug, warn};

/// Extensions the loader understands.
pub const INPUT_EXTENSIONS: &[&str] = &["csv", "parquet"];

/// Create `dir` if missing. Returns `true` when it had to be created.
pub fn ensure_dir(dir: &Path) -> Result<bool> {
    if dir.is_dir() {
        return Ok(false);
    }
    fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    Ok(true)
}

/// Loadable files directly inside `dir`, sorted by file name.
pub fn list_inputs(dir: &Path) -> Result<Vec<PathBuf>> {
    let base = Pattern::escape(&dir.display().to_string());
    let mut files = Vec::new();

    for ext in INPUT_EXTENSIONS {
        let pattern = format!("{}/*.{}", base, ext);
        for entry in glob(&pattern).context("invalid glob pattern for list_inputs")? {
            match entry {
                Ok(p) if p.is_file() => files.push(p),
                Ok(_) => {}
                Err(e) => warn!("cannot read glob entry: {:?}", e),
            }
        }
    }

    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    debug!(dir = %dir.display(), count = files.len(), "listed inputs");
    Ok(files)
}

/// Parse a 1-based menu choice into an index below `count`.
pub fn parse_selection(input: &str, count: usize) -> Option<usize> {
    let n: usize = input.trim().parse().ok()?;
    (1..=count).contains(&n).then(|| n - 1)
}

/// Whether the operator asked for another run.
pub fn wants_restart(input: &str) -> bool {
    let answer = input.trim().to_lowercase();
    answer == "restart" || answer == "reiniciar"
}
