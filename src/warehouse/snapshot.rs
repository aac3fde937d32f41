// src/warehouse/snapshot.rs

use arrow::{compute::concat_batches, record_batch::RecordBatch};
use parquet::{
    arrow::{arrow_reader::ParquetRecordBatchReaderBuilder, ArrowWriter},
    basic::Compression,
    errors::ParquetError,
    file::properties::WriterProperties,
};
use std::{
    fs::File,
    path::{Path, PathBuf},
};
use tracing::{debug, info};

use super::Warehouse;
use crate::error::LoadError;
use crate::table::StormTable;

/// Serves the fact table from a local Parquet file instead of the warehouse.
///
/// The query text is ignored: a snapshot only ever holds the fact table.
#[derive(Debug, Clone)]
pub struct SnapshotWarehouse {
    path: PathBuf,
}

impl SnapshotWarehouse {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Warehouse for SnapshotWarehouse {
    fn fetch(&self, query: &str) -> Result<RecordBatch, LoadError> {
        debug!(path = %self.path.display(), query, "reading snapshot instead of querying");
        let file = File::open(&self.path).map_err(|e| {
            LoadError::Connection(format!("opening snapshot {}: {}", self.path.display(), e))
        })?;

        let builder = ParquetRecordBatchReaderBuilder::try_new(file)?;
        let schema = builder.schema().clone();
        let reader = builder.with_batch_size(8192).build()?;
        let batches = reader.collect::<Result<Vec<_>, _>>()?;

        Ok(concat_batches(&schema, &batches)?)
    }
}

/// Write the fact columns of `table` to a SNAPPY-compressed Parquet file.
pub fn write_snapshot(path: &Path, table: &StormTable) -> Result<(), LoadError> {
    let batch = table.fact_batch()?;
    let file = File::create(path).map_err(ParquetError::from)?;
    let props = WriterProperties::builder()
        .set_compression(Compression::SNAPPY)
        .build();
    let mut writer = ArrowWriter::try_new(file, batch.schema(), Some(props))?;
    writer.write(&batch)?;
    writer.close()?;
    info!(path = %path.display(), rows = batch.num_rows(), "wrote snapshot");
    Ok(())
}
