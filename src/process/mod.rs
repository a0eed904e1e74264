// src/process/mod.rs
pub mod key;
pub mod partition;

use arrow::array::{Array, StringArray};
use arrow::compute::cast;
use arrow::datatypes::DataType;
use arrow::record_batch::RecordBatchReader;
use csv::ReaderBuilder;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use std::{
    collections::HashSet,
    fs::File,
    io::{BufReader, Read},
    path::Path,
};
use tracing::{debug, info, instrument, warn};

use crate::error::{Result, SplitError};
use crate::table::{Cell, Row, Table};

/// Physical rows skipped before the header row in CSV input.
pub const CSV_SKIP_ROWS: usize = 1;

/// Load `path` as a table, picking the reader from the file extension.
#[instrument(level = "info", skip(path), fields(path = %path.as_ref().display()))]
pub fn load_table<P: AsRef<Path>>(path: P) -> Result<Table> {
    let path = path.as_ref();
    if !path.is_file() {
        return Err(SplitError::SourceMissing {
            path: path.to_path_buf(),
        });
    }

    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    let table = match ext.as_str() {
        "csv" => {
            let file = File::open(path).map_err(|e| SplitError::format(path, e))?;
            load_csv(BufReader::new(file), path)?
        }
        "parquet" => load_parquet(path)?,
        other => {
            return Err(SplitError::format(
                path,
                format!("unsupported file type `.{}`", other),
            ))
        }
    };

    info!(
        rows = table.num_rows(),
        columns = table.num_columns(),
        "loaded table"
    );
    Ok(table)
}

/// Parse CSV where the first physical row is ignored and the second one
/// holds the column names. `origin` is only used in error messages.
pub fn load_csv<R: Read>(reader: R, origin: &Path) -> Result<Table> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(reader);

    let mut records = rdr.records().enumerate();

    for _ in 0..CSV_SKIP_ROWS {
        if let Some((idx, rec)) = records.next() {
            rec.map_err(|e| SplitError::format(origin, format!("record {}: {}", idx, e)))?;
        }
    }

    let headers = match records.next() {
        Some((idx, rec)) => {
            let rec =
                rec.map_err(|e| SplitError::format(origin, format!("record {}: {}", idx, e)))?;
            unique_headers(rec.iter().map(|h| h.trim().to_string()).collect())
        }
        None => return Err(SplitError::format(origin, "no header row")),
    };

    let mut table = Table::new(headers);
    let width = table.num_columns();
    for (idx, rec) in records {
        let rec = rec.map_err(|e| SplitError::format(origin, format!("record {}: {}", idx, e)))?;
        if rec.len() > width {
            return Err(SplitError::format(
                origin,
                format!(
                    "record {} has {} fields but the header has {}",
                    idx,
                    rec.len(),
                    width
                ),
            ));
        }
        let mut row: Row = rec
            .iter()
            .map(|f| {
                if f.is_empty() {
                    Cell::Empty
                } else {
                    Cell::Text(f.to_string())
                }
            })
            .collect();
        row.resize(width, Cell::Empty);
        table.rows.push(row);
    }

    debug!(rows = table.num_rows(), "parsed csv");
    Ok(table)
}

/// Read every record batch of a Parquet file. Each column is rendered with
/// arrow's own text cast, so integers, floats and decimals keep their exact
/// digits; nulls become `Cell::Empty`.
pub fn load_parquet(path: &Path) -> Result<Table> {
    let file = File::open(path).map_err(|e| SplitError::format(path, e))?;
    let reader = ParquetRecordBatchReaderBuilder::try_new(file)
        .and_then(|b| b.build())
        .map_err(|e| SplitError::format(path, e))?;

    let headers = unique_headers(
        reader
            .schema()
            .fields()
            .iter()
            .map(|f| f.name().to_string())
            .collect(),
    );
    let mut table = Table::new(headers);

    for batch in reader {
        let batch = batch.map_err(|e| SplitError::format(path, e))?;
        let mut rows: Vec<Row> = vec![Vec::with_capacity(batch.num_columns()); batch.num_rows()];

        for (field, col) in batch.schema().fields().iter().zip(batch.columns()) {
            let casted = cast(col, &DataType::Utf8).map_err(|e| {
                SplitError::format(path, format!("column `{}`: {}", field.name(), e))
            })?;
            let arr = casted
                .as_any()
                .downcast_ref::<StringArray>()
                .ok_or_else(|| SplitError::format(path, "text cast failed"))?;
            for (row, v) in rows.iter_mut().zip(arr.iter()) {
                row.push(v.into());
            }
        }
        table.rows.extend(rows);
    }

    debug!(rows = table.num_rows(), "parsed parquet");
    Ok(table)
}

/// Suffix repeated column names with `.1`, `.2`, ... so names stay unique.
fn unique_headers(raw: Vec<String>) -> Vec<String> {
    let mut seen: HashSet<String> = HashSet::with_capacity(raw.len());
    let mut out = Vec::with_capacity(raw.len());
    for name in raw {
        let mut candidate = name.clone();
        let mut n = 1;
        while seen.contains(&candidate) {
            candidate = format!("{}.{}", name, n);
            n += 1;
        }
        if candidate != name {
            warn!(column = %name, renamed = %candidate, "duplicate column name");
        }
        seen.insert(candidate.clone());
        out.push(candidate);
    }
    out
}
