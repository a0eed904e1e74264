//! Split a product table into one file per brand.
//!
//! The brand is the first word of the third column; the rest of that cell
//! stays behind as the product name. [`process::load_table`] reads the
//! input, [`process::partition::partition_table`] groups its rows and
//! [`write::write_partitions`] writes one table per brand.

pub mod config;
pub mod discover;
pub mod error;
pub mod process;
pub mod progress;
pub mod run;
pub mod table;
pub mod write;

pub use error::SplitError;
pub use process::key::{parse_brand, UNKNOWN_BRAND};
pub use process::partition::{partition_table, Partition, PartitionMap, BRAND_COLUMN};
pub use table::{Cell, Row, Table};
pub use write::{write_partitions, DirSink, OutputFormat, PartitionSink, WriteReport};
