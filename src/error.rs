// src/error.rs

//! Error types.
//!
//! Loading errors are fatal: without the fact table there is nothing to
//! render. The filter and aggregation pipeline has no error type of its own,
//! an unmatched selection is simply an empty result.

use std::path::PathBuf;
use thiserror::Error;

/// Failure to load the storm-events table.
#[derive(Debug, Error)]
pub enum LoadError {
    /// Credentials are missing or invalid, or the warehouse is unreachable.
    #[error("cannot connect to warehouse: {0}")]
    Connection(String),

    /// The warehouse rejected the query.
    #[error("warehouse rejected query: {0}")]
    Query(String),

    /// The result set does not have the shape of the fact table.
    #[error("unexpected result shape: {0}")]
    Decode(String),

    /// Error reading or writing a Parquet snapshot
    #[error("snapshot error")]
    Snapshot(#[from] parquet::errors::ParquetError),

    /// Error assembling Arrow columns
    #[error(transparent)]
    Arrow(#[from] arrow::error::ArrowError),
}

/// Failure to read `stormlit.yaml`.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config file {path}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// Table names must be fully qualified: `project.dataset.table`.
    #[error("table `{0}` is not of the form project.dataset.table")]
    InvalidTable(String),
}
