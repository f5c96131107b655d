//! Columnar conversion of flat records for tabular consumers.
//!
//! Every field is a nullable Utf8 column; the schema is the union of labels
//! observed across the rows, in first-seen order, so repeated runs over the
//! same records produce the same column layout.

use std::fs::File;
use std::path::Path;

use ahash::AHashSet;
use arrow2::array::{Array, MutableArray, MutableUtf8Array};
use arrow2::chunk::Chunk;
use arrow2::datatypes::{DataType, Field, Schema};
use arrow2::io::parquet::write::{
    transverse, CompressionOptions, Encoding, FileWriter, RowGroupIterator, Version, WriteOptions,
};

use crate::error::Result;
use crate::record::FlatRecord;

/// Convert flat records to an all-Utf8 arrow chunk. Missing fields become
/// nulls.
pub fn to_columns(rows: &[FlatRecord]) -> (Schema, Chunk<Box<dyn Array>>) {
    let mut order: Vec<&str> = Vec::new();
    let mut seen: AHashSet<&str> = AHashSet::new();
    for row in rows {
        for label in row.labels() {
            if seen.insert(label) {
                order.push(label);
            }
        }
    }

    let mut fields = Vec::with_capacity(order.len());
    let mut arrays: Vec<Box<dyn Array>> = Vec::with_capacity(order.len());
    for &label in &order {
        let mut builder = MutableUtf8Array::<i32>::with_capacity(rows.len());
        for row in rows {
            builder.push(row.get(label));
        }
        fields.push(Field::new(label, DataType::Utf8, true));
        arrays.push(builder.as_box());
    }

    (Schema::from(fields), Chunk::new(arrays))
}

/// Write one chunk as a single-row-group parquet file, returning the number
/// of bytes written.
pub fn write_parquet<P: AsRef<Path>>(
    path: P,
    schema: Schema,
    chunk: Chunk<Box<dyn Array>>,
) -> Result<u64> {
    let options = WriteOptions {
        write_statistics: true,
        compression: CompressionOptions::Uncompressed,
        version: Version::V2,
        data_pagesize_limit: None,
    };

    let encodings: Vec<Vec<Encoding>> = schema
        .fields
        .iter()
        .map(|field| transverse(&field.data_type, |_| Encoding::Plain))
        .collect();

    let chunks: Vec<arrow2::error::Result<Chunk<Box<dyn Array>>>> = vec![Ok(chunk)];
    let row_groups = RowGroupIterator::try_new(chunks.into_iter(), &schema, options, encodings)?;

    let file = File::create(path)?;
    let mut writer = FileWriter::try_new(file, schema, options)?;
    for group in row_groups {
        writer.write(group?)?;
    }
    Ok(writer.end(None)?)
}
