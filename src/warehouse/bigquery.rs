// src/warehouse/bigquery.rs

use arrow::record_batch::RecordBatch;
use google_cloud_bigquery::client::google_cloud_auth::credentials::CredentialsFile;
use google_cloud_bigquery::client::{Client, ClientConfig};
use google_cloud_bigquery::http::job::query::QueryRequest;
use google_cloud_bigquery::query::row::Row;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info};

use super::Warehouse;
use crate::error::LoadError;
use crate::schema::parse_event_month;
use crate::table::{fact_batch_from_records, EventRecord};

/// Runs the fact-table query against BigQuery, authenticated with a
/// service-account key file.
#[derive(Debug, Clone)]
pub struct BigQueryWarehouse {
    credentials_path: PathBuf,
    /// Project billed for the query when the key file does not name one.
    fallback_project: String,
}

impl BigQueryWarehouse {
    pub fn new(credentials_path: impl Into<PathBuf>, fallback_project: impl Into<String>) -> Self {
        Self {
            credentials_path: credentials_path.into(),
            fallback_project: fallback_project.into(),
        }
    }

    pub fn credentials_path(&self) -> &Path {
        &self.credentials_path
    }

    async fn fetch_records(&self, query: &str) -> Result<Vec<EventRecord>, LoadError> {
        let path = self.credentials_path.display().to_string();
        let credentials = CredentialsFile::new_from_file(path.clone())
            .await
            .map_err(|e| LoadError::Connection(format!("reading credentials {}: {}", path, e)))?;
        let (config, key_project) = ClientConfig::new_with_credentials(credentials)
            .await
            .map_err(|e| LoadError::Connection(format!("authenticating: {}", e)))?;
        let client = Client::new(config)
            .await
            .map_err(|e| LoadError::Connection(format!("creating BigQuery client: {}", e)))?;

        let project = key_project.unwrap_or_else(|| self.fallback_project.clone());
        debug!(project = %project, query, "running query");

        let request = QueryRequest {
            query: query.to_string(),
            use_legacy_sql: false,
            ..Default::default()
        };
        let mut rows = client
            .query::<Row>(&project, request)
            .await
            .map_err(|e| LoadError::Query(e.to_string()))?;

        let mut records = Vec::new();
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| LoadError::Query(e.to_string()))?
        {
            records.push(decode_row(&row, records.len())?);
        }
        Ok(records)
    }
}

impl Warehouse for BigQueryWarehouse {
    fn fetch(&self, query: &str) -> Result<RecordBatch, LoadError> {
        let start = Instant::now();
        // The rest of the dashboard is synchronous; the client needs a reactor
        // only for the duration of this one call.
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| LoadError::Connection(format!("starting runtime: {}", e)))?;
        let records = runtime.block_on(self.fetch_records(query))?;
        info!(rows = records.len(), elapsed = ?start.elapsed(), "fetched from BigQuery");
        Ok(fact_batch_from_records(&records)?)
    }
}

/// Decode one result row. Positions follow `schema::FACT_COLUMNS`.
fn decode_row(row: &Row, index: usize) -> Result<EventRecord, LoadError> {
    let decode_err = |column: &str, e: &dyn std::fmt::Display| {
        LoadError::Decode(format!("row {}: column `{}`: {}", index, column, e))
    };

    let state = row
        .column::<Option<String>>(0)
        .map_err(|e| decode_err("state", &e))?;
    let event_group = row
        .column::<Option<String>>(1)
        .map_err(|e| decode_err("event_group", &e))?;
    let raw_month = row
        .column::<String>(2)
        .map_err(|e| decode_err("event_month", &e))?;
    let event_month = parse_event_month(&raw_month)
        .ok_or_else(|| decode_err("event_month", &format!("cannot parse {:?}", raw_month)))?;

    Ok(EventRecord {
        state,
        event_group,
        event_month,
        total_event_count: row
            .column::<Option<i64>>(3)
            .map_err(|e| decode_err("total_event_count", &e))?,
        sum_deaths_direct: row
            .column::<Option<i64>>(4)
            .map_err(|e| decode_err("sum_deaths_direct", &e))?,
        sum_damage_crops: row
            .column::<Option<f64>>(5)
            .map_err(|e| decode_err("sum_damage_crops", &e))?,
        sum_damage_property: row
            .column::<Option<f64>>(6)
            .map_err(|e| decode_err("sum_damage_property", &e))?,
    })
}
