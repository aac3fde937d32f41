// src/warehouse/mod.rs

//! Sources of the fact table.

pub mod bigquery;
pub mod snapshot;

use arrow::record_batch::RecordBatch;

use crate::config::TableRef;
use crate::error::LoadError;
use crate::schema::FACT_COLUMNS;

pub use bigquery::BigQueryWarehouse;
pub use snapshot::{write_snapshot, SnapshotWarehouse};

/// Something that can run the fact-table query and hand back its rows.
///
/// Implementations block until the whole result set is in memory.
pub trait Warehouse {
    /// Run `query` and return the result as a fact-schema batch.
    fn fetch(&self, query: &str) -> Result<RecordBatch, LoadError>;
}

impl<W: Warehouse + ?Sized> Warehouse for Box<W> {
    fn fetch(&self, query: &str) -> Result<RecordBatch, LoadError> {
        (**self).fetch(query)
    }
}

impl<W: Warehouse + ?Sized> Warehouse for &W {
    fn fetch(&self, query: &str) -> Result<RecordBatch, LoadError> {
        (**self).fetch(query)
    }
}

/// The one query the dashboard runs: every fact column of `table`.
///
/// Columns are listed explicitly so results can be decoded by position.
pub fn fact_query(table: &TableRef) -> String {
    format!("SELECT {} FROM `{}`", FACT_COLUMNS.join(", "), table)
}
