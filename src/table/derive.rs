// src/table/derive.rs

use arrow::array::{Array, Date32Array, Int32Array, StringArray};
use chrono::Datelike;

use crate::error::LoadError;
use crate::schema::{date_to_days, days_to_date, month_name, month::month_start};

/// Snap every month onto the first day of its month.
///
/// Fails on nulls, since every fact row belongs to exactly one month.
pub fn truncate_to_month(months: &Date32Array) -> Result<Date32Array, LoadError> {
    let mut out = Vec::with_capacity(months.len());
    for i in 0..months.len() {
        if months.is_null(i) {
            return Err(LoadError::Decode(format!("row {}: event_month is null", i)));
        }
        let start = days_to_date(months.value(i))
            .and_then(month_start)
            .ok_or_else(|| {
                LoadError::Decode(format!("row {}: event_month out of range", i))
            })?;
        out.push(date_to_days(start));
    }
    Ok(Date32Array::from(out))
}

/// Compute `event_year` and `event_month_name` from `event_month`.
///
/// Pure: runs once per load, never per aggregation.
pub fn derive_columns(months: &Date32Array) -> (Int32Array, StringArray) {
    let dates: Vec<_> = months
        .iter()
        .map(|v| v.and_then(days_to_date))
        .collect();
    let years = Int32Array::from_iter(dates.iter().map(|d| d.map(|d| d.year())));
    let names = StringArray::from_iter(dates.iter().map(|d| d.map(month_name)));
    (years, names)
}
