// src/loader.rs

use once_cell::unsync::OnceCell;
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

use crate::error::LoadError;
use crate::table::StormTable;
use crate::warehouse::Warehouse;

/// Owns the single memoized copy of the fact table.
///
/// The first [`load`](TableCache::load) runs the query; later calls hand out
/// the same `Arc` without touching the warehouse until [`clear`](TableCache::clear).
pub struct TableCache<W> {
    warehouse: W,
    query: String,
    table: OnceCell<Arc<StormTable>>,
}

impl<W: Warehouse> TableCache<W> {
    pub fn new(warehouse: W, query: impl Into<String>) -> Self {
        Self {
            warehouse,
            query: query.into(),
            table: OnceCell::new(),
        }
    }

    /// Return the table, querying the warehouse on first use.
    ///
    /// Errors are not cached: a failed load leaves the cache empty.
    pub fn load(&self) -> Result<Arc<StormTable>, LoadError> {
        self.table
            .get_or_try_init(|| -> Result<Arc<StormTable>, LoadError> {
                info!("loading storm events");
                let start = Instant::now();
                let batch = self.warehouse.fetch(&self.query)?;
                let table = StormTable::from_fact_batch(&batch)?;
                info!(rows = table.num_rows(), elapsed = ?start.elapsed(), "storm events loaded");
                Ok(Arc::new(table))
            })
            .map(Arc::clone)
    }

    /// Drop the cached table; the next `load` queries again.
    pub fn clear(&mut self) {
        if self.table.take().is_some() {
            info!("storm events cache cleared");
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.table.get().is_some()
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn warehouse(&self) -> &W {
        &self.warehouse
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::{fact_batch_from_records, EventRecord};
    use arrow::record_batch::RecordBatch;
    use chrono::NaiveDate;
    use std::cell::Cell;

    /// Counts fetches and serves a fixed row set, or fails with a query error.
    struct CountingWarehouse {
        fetches: Cell<usize>,
        fail: bool,
    }

    impl CountingWarehouse {
        fn new(fail: bool) -> Self {
            Self {
                fetches: Cell::new(0),
                fail,
            }
        }
    }

    impl Warehouse for CountingWarehouse {
        fn fetch(&self, query: &str) -> Result<RecordBatch, LoadError> {
            self.fetches.set(self.fetches.get() + 1);
            if self.fail {
                return Err(LoadError::Query(format!("rejected: {}", query)));
            }
            Ok(fact_batch_from_records(&[EventRecord {
                state: Some("TX".into()),
                event_group: Some("Flood".into()),
                event_month: NaiveDate::from_ymd_opt(2020, 5, 1).unwrap(),
                total_event_count: Some(2),
                sum_deaths_direct: Some(0),
                sum_damage_crops: Some(500.0),
                sum_damage_property: Some(0.0),
            }])?)
        }
    }

    #[test]
    fn test_load_is_memoized() {
        let cache = TableCache::new(CountingWarehouse::new(false), "SELECT *");
        assert!(!cache.is_loaded());

        let first = cache.load().unwrap();
        let second = cache.load().unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.warehouse().fetches.get(), 1);
        assert_eq!(first.num_rows(), 1);
    }

    #[test]
    fn test_clear_forces_reload() {
        let mut cache = TableCache::new(CountingWarehouse::new(false), "SELECT *");
        let first = cache.load().unwrap();
        cache.clear();
        assert!(!cache.is_loaded());

        let second = cache.load().unwrap();
        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(*first, *second);
        assert_eq!(cache.warehouse().fetches.get(), 2);
    }

    #[test]
    fn test_errors_are_not_cached() {
        let cache = TableCache::new(CountingWarehouse::new(true), "SELECT *");
        assert!(matches!(cache.load(), Err(LoadError::Query(_))));
        assert!(matches!(cache.load(), Err(LoadError::Query(_))));
        assert!(!cache.is_loaded());
        assert_eq!(cache.warehouse().fetches.get(), 2);
    }
}
