// src/process/partition.rs

use std::collections::HashMap;

use tracing::{debug, info, instrument};

use super::key::parse_brand;
use crate::error::{Result, SplitError};
use crate::progress::{NoProgress, SplitObserver};
use crate::table::{Cell, Row, Table};

/// Index of the column holding "brand product" text.
pub const BRAND_COLUMN: usize = 2;

/// Rows of one brand, with the brand column rewritten to the product.
#[derive(Debug, Clone, PartialEq)]
pub struct Partition {
    pub brand: String,
    pub rows: Vec<Row>,
}

/// Brand -> partition, iterated in first-seen order.
#[derive(Debug, Default, Clone)]
pub struct PartitionMap {
    partitions: Vec<Partition>,
    index: HashMap<String, usize>,
}

impl PartitionMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `row` to `brand`'s partition, creating it on first sight.
    pub fn push(&mut self, brand: String, row: Row) {
        match self.index.get(&brand) {
            Some(&i) => self.partitions[i].rows.push(row),
            None => {
                self.index.insert(brand.clone(), self.partitions.len());
                self.partitions.push(Partition {
                    brand,
                    rows: vec![row],
                });
            }
        }
    }

    pub fn get(&self, brand: &str) -> Option<&Partition> {
        self.index.get(brand).map(|&i| &self.partitions[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = &Partition> {
        self.partitions.iter()
    }

    pub fn brands(&self) -> impl Iterator<Item = &str> {
        self.partitions.iter().map(|p| p.brand.as_str())
    }

    /// Number of partitions.
    pub fn len(&self) -> usize {
        self.partitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.partitions.is_empty()
    }

    /// Total rows across all partitions.
    pub fn total_rows(&self) -> usize {
        self.partitions.iter().map(|p| p.rows.len()).sum()
    }
}

impl<'a> IntoIterator for &'a PartitionMap {
    type Item = &'a Partition;
    type IntoIter = std::slice::Iter<'a, Partition>;

    fn into_iter(self) -> Self::IntoIter {
        self.partitions.iter()
    }
}

/// Check the table is wide enough to have a brand column.
pub fn check_schema(table: &Table) -> Result<()> {
    if table.num_columns() <= BRAND_COLUMN {
        return Err(SplitError::Schema {
            columns: table.num_columns(),
        });
    }
    Ok(())
}

/// Group the rows of `table` by the brand in column C.
pub fn partition_table(table: &Table) -> Result<PartitionMap> {
    partition_table_with(table, &mut NoProgress)
}

/// [`partition_table`], reporting each processed row to `observer`.
#[instrument(level = "info", skip_all, fields(rows = table.num_rows()))]
pub fn partition_table_with(
    table: &Table,
    observer: &mut dyn SplitObserver,
) -> Result<PartitionMap> {
    check_schema(table)?;

    let total = table.num_rows();
    let mut map = PartitionMap::new();
    for (idx, row) in table.rows.iter().enumerate() {
        let (brand, product) = match row.get(BRAND_COLUMN) {
            Some(cell) => parse_brand(cell),
            None => parse_brand(&Cell::Empty),
        };

        let mut out = row.clone();
        if out.len() <= BRAND_COLUMN {
            out.resize(table.num_columns(), Cell::Empty);
        }
        out[BRAND_COLUMN] = Cell::Text(product);

        map.push(brand, out);
        observer.row_processed(idx, total);
    }

    debug!(brands = map.len(), "brands found");
    info!(rows = map.total_rows(), brands = map.len(), "split rows by brand");
    Ok(map)
}
