// src/error.rs

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading, splitting or writing a table.
#[derive(Debug, Error)]
pub enum SplitError {
    /// The input file does not exist.
    #[error("input file `{}` does not exist", path.display())]
    SourceMissing { path: PathBuf },

    /// The input could not be parsed into a table.
    #[error("cannot read `{}` as a table: {reason}", path.display())]
    Format { path: PathBuf, reason: String },

    /// The table has fewer columns than the brand column needs.
    #[error("table has {columns} column(s); at least 3 are required")]
    Schema { columns: usize },

    /// Writing one brand's output failed. Recovered per partition.
    #[error("failed to write partition `{key}`: {reason}")]
    PartitionWrite { key: String, reason: String },
}

impl SplitError {
    pub(crate) fn format(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::Format {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    /// Whether this error ends the run, as opposed to a single partition.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::PartitionWrite { .. })
    }
}

pub type Result<T, E = SplitError> = std::result::Result<T, E>;
