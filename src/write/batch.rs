// src/write/batch.rs

use anyhow::{Context, Result};
use arrow::{
    array::{ArrayRef, StringBuilder},
    datatypes::{DataType, Field, Schema},
    record_batch::RecordBatch,
};
use std::sync::Arc;

use crate::table::Row;

/// One nullable Utf8 field per header.
pub fn text_schema(headers: &[String]) -> Arc<Schema> {
    let fields: Vec<Field> = headers
        .iter()
        .map(|h| Field::new(h, DataType::Utf8, true))
        .collect();
    Arc::new(Schema::new(fields))
}

/// Build a single batch from `rows`; empty cells become nulls.
pub fn rows_to_batch(headers: &[String], rows: &[Row]) -> Result<RecordBatch> {
    let schema = text_schema(headers);
    let mut columns: Vec<ArrayRef> = Vec::with_capacity(headers.len());

    for col in 0..headers.len() {
        let mut builder = StringBuilder::with_capacity(rows.len(), rows.len() * 16);
        for row in rows {
            match row.get(col) {
                Some(c) if !c.is_empty() => builder.append_value(c.to_text()),
                _ => builder.append_null(),
            }
        }
        columns.push(Arc::new(builder.finish()) as ArrayRef);
    }

    RecordBatch::try_new(schema, columns).context("building partition RecordBatch")
}
