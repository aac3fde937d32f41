// src/config.rs

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use std::{
    fmt, fs,
    path::{Path, PathBuf},
};

use crate::error::ConfigError;

/// Looked up in the working directory at startup.
pub const CONFIG_FILE: &str = "stormlit.yaml";

pub const DEFAULT_CREDENTIALS_PATH: &str = "stormlit-sa.json";
pub const DEFAULT_TABLE: &str = "px-data-lab.storms.storms_agg";

static TABLE_NAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([A-Za-z0-9-]+)\.([A-Za-z0-9_]+)\.([A-Za-z0-9_-]+)$")
        .expect("table name pattern should compile")
});

/// Runtime settings. Every field has a default, so the file is optional.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Service-account key file used to authenticate against BigQuery.
    pub credentials_path: PathBuf,
    /// Fully qualified fact table, `project.dataset.table`.
    pub table: String,
    /// Read the fact table from this Parquet snapshot instead of BigQuery.
    pub snapshot_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            credentials_path: PathBuf::from(DEFAULT_CREDENTIALS_PATH),
            table: DEFAULT_TABLE.to_string(),
            snapshot_path: None,
        }
    }
}

impl Config {
    /// Parse and validate a YAML document. An empty document yields the defaults.
    pub fn from_yaml(text: &str, origin: &Path) -> Result<Self, ConfigError> {
        let config: Config = if text.trim().is_empty() {
            Config::default()
        } else {
            serde_yaml::from_str(text).map_err(|source| ConfigError::Parse {
                path: origin.to_path_buf(),
                source,
            })?
        };
        config.table_ref()?;
        Ok(config)
    }

    /// Read `path`, falling back to the defaults when it does not exist.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Config::default());
        }
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&text, path)
    }

    pub fn table_ref(&self) -> Result<TableRef, ConfigError> {
        TableRef::parse(&self.table)
    }
}

/// A validated `project.dataset.table` reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRef {
    pub project: String,
    pub dataset: String,
    pub table: String,
}

impl TableRef {
    pub fn parse(name: &str) -> Result<Self, ConfigError> {
        let caps = TABLE_NAME
            .captures(name.trim())
            .ok_or_else(|| ConfigError::InvalidTable(name.to_string()))?;
        Ok(Self {
            project: caps[1].to_string(),
            dataset: caps[2].to_string(),
            table: caps[3].to_string(),
        })
    }
}

impl fmt::Display for TableRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.project, self.dataset, self.table)
    }
}
