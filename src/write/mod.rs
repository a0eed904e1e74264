// src/write/mod.rs
pub mod batch;
pub mod sanitize;

use anyhow::{Context, Result};
use parquet::arrow::ArrowWriter;
use parquet::basic::{Compression, ZstdLevel};
use parquet::file::properties::WriterProperties;
use serde::Deserialize;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, instrument};

use crate::error::SplitError;
use crate::process::partition::PartitionMap;
use crate::progress::{NoProgress, SplitObserver};
use crate::table::{Cell, Row};
use sanitize::StemAllocator;

/// File format of the per-brand outputs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Csv,
    Parquet,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Csv => "csv",
            OutputFormat::Parquet => "parquet",
        }
    }
}

/// Destination for one brand's table.
pub trait PartitionSink {
    /// Write `rows` under `stem`, returning where they went.
    fn write_partition(&mut self, stem: &str, headers: &[String], rows: &[Row])
        -> Result<PathBuf>;
}

/// Writes each partition as `<out_dir>/<stem>.<ext>`.
#[derive(Debug, Clone)]
pub struct DirSink {
    out_dir: PathBuf,
    format: OutputFormat,
}

impl DirSink {
    /// `out_dir` is created on the first write, so a run that fails before
    /// writing leaves nothing behind.
    pub fn new(out_dir: impl Into<PathBuf>, format: OutputFormat) -> Self {
        Self {
            out_dir: out_dir.into(),
            format,
        }
    }

    pub fn out_dir(&self) -> &Path {
        &self.out_dir
    }
}

impl PartitionSink for DirSink {
    fn write_partition(
        &mut self,
        stem: &str,
        headers: &[String],
        rows: &[Row],
    ) -> Result<PathBuf> {
        fs::create_dir_all(&self.out_dir)
            .with_context(|| format!("creating output directory {}", self.out_dir.display()))?;

        let out_path = self
            .out_dir
            .join(format!("{}.{}", stem, self.format.extension()));
        let temp_path = self.out_dir.join(format!("{}.{}.tmp", stem, self.format.extension()));

        let written = match self.format {
            OutputFormat::Csv => write_csv(&temp_path, headers, rows),
            OutputFormat::Parquet => write_parquet(&temp_path, headers, rows),
        };
        if let Err(e) = written {
            let _ = fs::remove_file(&temp_path);
            return Err(e);
        }

        if let Err(e) = fs::rename(&temp_path, &out_path) {
            let _ = fs::remove_file(&temp_path);
            return Err(e).with_context(|| {
                format!(
                    "renaming {} to {}",
                    temp_path.display(),
                    out_path.display()
                )
            });
        }
        Ok(out_path)
    }
}

fn write_csv(path: &Path, headers: &[String], rows: &[Row]) -> Result<()> {
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let mut wtr = csv::Writer::from_writer(BufWriter::new(file));
    wtr.write_record(headers)?;
    for row in rows {
        wtr.write_record(row.iter().map(Cell::to_text))?;
    }
    wtr.flush()?;
    Ok(())
}

fn write_parquet(path: &Path, headers: &[String], rows: &[Row]) -> Result<()> {
    let batch = batch::rows_to_batch(headers, rows)?;
    let props = WriterProperties::builder()
        .set_compression(Compression::ZSTD(ZstdLevel::try_new(3)?))
        .set_dictionary_enabled(true)
        .build();

    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let mut writer = ArrowWriter::try_new(BufWriter::new(file), batch.schema(), Some(props))?;
    writer.write(&batch)?;
    let mut inner = writer.into_inner()?;
    inner.flush()?;
    Ok(())
}

/// One successfully written brand.
#[derive(Debug, Clone, PartialEq)]
pub struct WrittenPartition {
    pub brand: String,
    pub destination: PathBuf,
    pub rows: usize,
}

/// Outcome of writing every partition.
#[derive(Debug, Default)]
pub struct WriteReport {
    pub written: Vec<WrittenPartition>,
    /// `SplitError::PartitionWrite` for each brand that failed.
    pub failed: Vec<SplitError>,
}

impl WriteReport {
    pub fn failed_brands(&self) -> Vec<&str> {
        self.failed
            .iter()
            .filter_map(|e| match e {
                SplitError::PartitionWrite { key, .. } => Some(key.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Write every partition of `map` through `sink`.
pub fn write_partitions(
    map: &PartitionMap,
    headers: &[String],
    sink: &mut dyn PartitionSink,
) -> WriteReport {
    write_partitions_with(map, headers, sink, &mut NoProgress)
}

/// Write each partition independently: a failure is logged and recorded,
/// then the next partition is attempted.
#[instrument(level = "info", skip_all, fields(brands = map.len()))]
pub fn write_partitions_with(
    map: &PartitionMap,
    headers: &[String],
    sink: &mut dyn PartitionSink,
    observer: &mut dyn SplitObserver,
) -> WriteReport {
    let total = map.len();
    let mut stems = StemAllocator::new();
    let mut report = WriteReport::default();

    for (i, part) in map.iter().enumerate() {
        let stem = stems.allocate(&part.brand);
        debug!(brand = %part.brand, stem = %stem, rows = part.rows.len(), "writing partition");

        match sink.write_partition(&stem, headers, &part.rows) {
            Ok(destination) => {
                info!(
                    brand = %part.brand,
                    path = %destination.display(),
                    "[{}/{}] wrote partition",
                    i + 1,
                    total
                );
                report.written.push(WrittenPartition {
                    brand: part.brand.clone(),
                    destination,
                    rows: part.rows.len(),
                });
                observer.partition_written(i, total, &part.brand, true);
            }
            Err(e) => {
                error!(brand = %part.brand, "write failed: {:#}", e);
                report.failed.push(SplitError::PartitionWrite {
                    key: part.brand.clone(),
                    reason: format!("{:#}", e),
                });
                observer.partition_written(i, total, &part.brand, false);
            }
        }
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::partition::partition_table;
    use crate::progress::testing::Recorder;
    use crate::table::Table;
    use anyhow::bail;
    use arrow::array::{Array, StringArray};
    use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
    use tempfile::tempdir;

    fn headers() -> Vec<String> {
        vec!["code".into(), "qty".into(), "product".into()]
    }

    fn sample_map(products: &[&str]) -> PartitionMap {
        let mut t = Table::new(headers());
        for (i, p) in products.iter().enumerate() {
            t.rows
                .push(vec![Cell::Text(format!("C{i}")), Cell::Number(i as f64), Cell::from(*p)]);
        }
        partition_table(&t).unwrap()
    }

    /// In-memory sink that fails for chosen stems.
    #[derive(Default)]
    struct MemorySink {
        fail: Vec<String>,
        tables: Vec<(String, Vec<String>, Vec<Row>)>,
    }

    impl PartitionSink for MemorySink {
        fn write_partition(
            &mut self,
            stem: &str,
            headers: &[String],
            rows: &[Row],
        ) -> Result<PathBuf> {
            if self.fail.iter().any(|f| f == stem) {
                bail!("disk full");
            }
            self.tables
                .push((stem.to_string(), headers.to_vec(), rows.to_vec()));
            Ok(PathBuf::from(stem))
        }
    }

    #[test]
    fn one_table_per_brand_with_same_schema() {
        let map = sample_map(&["Acme Widget A", "Acme Widget B", "Zeta Thing", ""]);
        let mut sink = MemorySink::default();
        let report = write_partitions(&map, &headers(), &mut sink);

        assert!(report.is_complete());
        assert_eq!(report.written.len(), 3);
        let stems: Vec<&str> = sink.tables.iter().map(|t| t.0.as_str()).collect();
        assert_eq!(stems, ["Acme", "Zeta", "Unknown"]);
        assert!(sink.tables.iter().all(|t| t.1 == headers()));
        let rows: usize = sink.tables.iter().map(|t| t.2.len()).sum();
        assert_eq!(rows, 4);
    }

    #[test]
    fn failed_partition_does_not_stop_the_rest() {
        let map = sample_map(&["Acme Widget A", "Acme Widget B", "Zeta Thing", ""]);
        let mut sink = MemorySink {
            fail: vec!["Zeta".into()],
            ..Default::default()
        };
        let mut rec = Recorder::default();
        let report = write_partitions_with(&map, &headers(), &mut sink, &mut rec);

        assert_eq!(report.failed_brands(), ["Zeta"]);
        let ok: Vec<&str> = report.written.iter().map(|w| w.brand.as_str()).collect();
        assert_eq!(ok, ["Acme", "Unknown"]);
        assert_eq!(
            rec.written,
            [
                ("Acme".to_string(), true),
                ("Zeta".to_string(), false),
                ("Unknown".to_string(), true)
            ]
        );
        // the map is only borrowed
        assert_eq!(map.total_rows(), 4);
    }

    #[test]
    fn colliding_brands_get_distinct_files() {
        let map = sample_map(&["AC/DC one", "AC:DC two"]);
        let mut sink = MemorySink::default();
        let report = write_partitions(&map, &headers(), &mut sink);
        let stems: Vec<&str> = sink.tables.iter().map(|t| t.0.as_str()).collect();
        assert_eq!(stems, ["AC_DC", "AC_DC_2"]);
        assert_eq!(report.written[1].brand, "AC:DC");
    }

    #[test]
    fn dir_sink_writes_csv() -> Result<()> {
        let dir = tempdir()?;
        let out = dir.path().join("nested").join("out");
        let mut sink = DirSink::new(&out, OutputFormat::Csv);
        let map = sample_map(&["Acme Widget A", "Acme Widget B", "Zeta Thing"]);
        let report = write_partitions(&map, &headers(), &mut sink);
        assert!(report.is_complete());

        let acme = fs::read_to_string(out.join("Acme.csv"))?;
        assert_eq!(acme, "code,qty,product\nC0,0,Widget A\nC1,1,Widget B\n");
        assert!(out.join("Zeta.csv").is_file());
        // no temp files left behind
        let tmp = fs::read_dir(&out)?
            .filter_map(|e| e.ok())
            .filter(|e| e.path().extension().and_then(|s| s.to_str()) == Some("tmp"))
            .count();
        assert_eq!(tmp, 0);
        Ok(())
    }

    #[test]
    fn dir_sink_writes_parquet() -> Result<()> {
        let dir = tempdir()?;
        let mut sink = DirSink::new(dir.path(), OutputFormat::Parquet);
        let map = sample_map(&["Acme Widget A", "Zeta Thing", "Acme Widget B"]);
        let report = write_partitions(&map, &headers(), &mut sink);
        assert!(report.is_complete());

        let reader =
            ParquetRecordBatchReaderBuilder::try_new(File::open(dir.path().join("Acme.parquet"))?)?
                .build()?;
        let batches = reader.collect::<Result<Vec<_>, _>>()?;
        assert_eq!(batches.len(), 1);
        let batch = &batches[0];

        let names: Vec<&str> = batch
            .schema_ref()
            .fields()
            .iter()
            .map(|f| f.name().as_str())
            .collect();
        assert_eq!(names, headers());

        let column = |i: usize| -> Vec<Option<String>> {
            batch
                .column(i)
                .as_any()
                .downcast_ref::<StringArray>()
                .unwrap()
                .iter()
                .map(|v| v.map(str::to_string))
                .collect()
        };
        assert_eq!(column(0), [Some("C0".to_string()), Some("C2".to_string())]);
        assert_eq!(column(1), [Some("0".to_string()), Some("2".to_string())]);
        assert_eq!(
            column(2),
            [Some("Widget A".to_string()), Some("Widget B".to_string())]
        );
        Ok(())
    }

    #[test]
    fn dir_sink_failure_is_recorded() -> Result<()> {
        let dir = tempdir()?;
        let mut sink = DirSink::new(dir.path(), OutputFormat::Csv);
        // a directory squatting on the destination makes the rename fail
        fs::create_dir(dir.path().join("Zeta.csv"))?;
        fs::write(dir.path().join("Zeta.csv").join("keep"), b"x")?;

        let map = sample_map(&["Acme Widget A", "Zeta Thing", ""]);
        let report = write_partitions(&map, &headers(), &mut sink);
        assert_eq!(report.failed_brands(), ["Zeta"]);
        assert!(dir.path().join("Acme.csv").is_file());
        assert!(dir.path().join("Unknown.csv").is_file());
        assert!(!dir.path().join("Zeta.csv.tmp").exists());
        Ok(())
    }
}
