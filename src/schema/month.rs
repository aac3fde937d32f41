// src/schema/month.rs

use chrono::{DateTime, Datelike, NaiveDate};

/// `NaiveDate::num_days_from_ce` of 1970-01-01, the Date32 epoch.
const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;

/// Decode a warehouse `event_month` value and truncate it to the month start.
///
/// Accepts:
/// - `YYYY-MM-DD` dates, optionally followed by a time part
///   (`2020-05-01T00:00:00`, `2020-05-01 00:00:00 UTC`)
/// - bare `YYYY-MM`
/// - epoch seconds, which is how BigQuery renders TIMESTAMP cells (`1.5882912E9`)
pub fn parse_event_month(raw: &str) -> Option<NaiveDate> {
    let s = raw.trim();
    if s.as_bytes().get(4) == Some(&b'-') {
        let date = match s.get(..10) {
            Some(day) => NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()?,
            None => NaiveDate::parse_from_str(&format!("{}-01", s.get(..7)?), "%Y-%m-%d").ok()?,
        };
        return month_start(date);
    }

    let secs: f64 = s.parse().ok()?;
    if !secs.is_finite() {
        return None;
    }
    let dt = DateTime::from_timestamp(secs.floor() as i64, 0)?;
    month_start(dt.date_naive())
}

pub fn month_start(date: NaiveDate) -> Option<NaiveDate> {
    date.with_day(1)
}

/// Full English month name, e.g. "May".
pub fn month_name(date: NaiveDate) -> String {
    date.format("%B").to_string()
}

/// Date32 value (days since 1970-01-01) for `date`.
pub fn date_to_days(date: NaiveDate) -> i32 {
    date.num_days_from_ce() - UNIX_EPOCH_DAYS_FROM_CE
}

pub fn days_to_date(days: i32) -> Option<NaiveDate> {
    NaiveDate::from_num_days_from_ce_opt(days.checked_add(UNIX_EPOCH_DAYS_FROM_CE)?)
}
