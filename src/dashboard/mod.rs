// src/dashboard/mod.rs

//! The page: headline figures, selector options and the four charts.

pub mod chart;
pub mod session;

use arrow::{array::StringArray, compute, error::ArrowError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::debug;

use crate::aggregate::{aggregate, GroupKey, Metric};
use crate::filter::{filter, Filter, ALL_STATES};
use crate::schema::days_to_date;
use crate::table::StormTable;

pub use chart::{LineChart, Point, Series};
pub use session::{DashboardEvent, Session};

pub const PAGE_TITLE: &str = "Severe Storm Events in the US";
pub const DATA_SOURCE: &str = "NOAA Storm Events Database";

/// Year slider bounds. Fixed display limits, not derived from the data.
pub const YEAR_MIN: i32 = 1950;
pub const YEAR_MAX: i32 = 2024;

/// Current widget state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Selection {
    /// `None` or "All States" for every state.
    pub state: Option<String>,
    /// Empty for every event type.
    pub event_groups: BTreeSet<String>,
    pub year: i32,
}

impl Default for Selection {
    fn default() -> Self {
        Self {
            state: None,
            event_groups: BTreeSet::new(),
            year: YEAR_MIN,
        }
    }
}

impl Selection {
    /// Pin the year onto the slider's range.
    pub fn clamped(mut self) -> Self {
        self.year = self.year.clamp(YEAR_MIN, YEAR_MAX);
        self
    }

    /// State and event-type predicates; drives the by-year charts.
    pub fn category_filter(&self) -> Filter {
        Filter {
            state: self.state.clone(),
            event_groups: self.event_groups.clone(),
            year: None,
        }
    }

    /// Category predicates plus the selected year; drives the monthly chart.
    pub fn year_filter(&self) -> Filter {
        Filter {
            year: Some(self.year),
            ..self.category_filter()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Headline {
    /// Sum of `total_event_count` over the whole, unfiltered table.
    pub total_events: i64,
    /// e.g. "May 2024"; `None` for an empty table.
    pub most_recent_month: Option<String>,
}

impl Headline {
    pub fn of(table: &StormTable) -> Self {
        let most_recent_month = compute::max(table.event_months())
            .and_then(days_to_date)
            .map(|d| d.format("%B %Y").to_string());
        Self {
            total_events: compute::sum(table.event_counts()).unwrap_or(0),
            most_recent_month,
        }
    }
}

/// Choices offered by the selectors.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Options {
    /// "All States" first, then every non-null state in order.
    pub states: Vec<String>,
    pub event_types: Vec<String>,
    pub year_range: (i32, i32),
}

impl Options {
    pub fn of(table: &StormTable) -> Self {
        let mut states = vec![ALL_STATES.to_string()];
        states.extend(distinct(table.states()));
        Self {
            states,
            event_types: distinct(table.event_groups()).collect(),
            year_range: (YEAR_MIN, YEAR_MAX),
        }
    }
}

fn distinct(values: &StringArray) -> impl Iterator<Item = String> {
    values
        .iter()
        .flatten()
        .map(str::to_string)
        .collect::<BTreeSet<_>>()
        .into_iter()
}

/// Everything the presentation surface needs to draw the page once.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardView {
    pub title: String,
    pub data_source: String,
    pub headline: Headline,
    pub options: Options,
    pub selection: Selection,
    pub charts: Vec<LineChart>,
}

/// Re-evaluate the page for `selection`. Deterministic: the same table and
/// selection always give the same view.
pub fn render(table: &StormTable, selection: &Selection) -> Result<DashboardView, ArrowError> {
    let selection = selection.clone().clamped();

    let by_category = filter(table, &selection.category_filter())?;
    let yearly = aggregate(&by_category, GroupKey::Year);

    let in_year = filter(table, &selection.year_filter())?;
    let monthly = aggregate(&in_year, GroupKey::Month);
    debug!(
        rows = table.num_rows(),
        by_category = by_category.num_rows(),
        in_year = in_year.num_rows(),
        "rendered selection"
    );

    let charts = vec![
        LineChart::from_groups(
            "Severe Storm Events by Year",
            "Total Events",
            &yearly,
            &[("Total Events", Metric::EventCount)],
        ),
        LineChart::from_groups(
            "Deaths by Year",
            "Total Deaths",
            &yearly,
            &[("Total Deaths", Metric::DeathsDirect)],
        ),
        LineChart::from_groups(
            "Damage by Year",
            "Total Damage",
            &yearly,
            &[("Crops", Metric::DamageCrops), ("Property", Metric::DamageProperty)],
        )
        .with_legend_title("Type"),
        LineChart::from_groups(
            format!("Severe Storm Events by Month in {}", selection.year),
            "Total Events",
            &monthly,
            &[("Total Events", Metric::EventCount)],
        )
        .with_values_shown(),
    ];

    Ok(DashboardView {
        title: PAGE_TITLE.to_string(),
        data_source: DATA_SOURCE.to_string(),
        headline: Headline::of(table),
        options: Options::of(table),
        selection,
        charts,
    })
}
