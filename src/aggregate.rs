// src/aggregate.rs

use arrow::array::Array;
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;

use crate::schema::days_to_date;
use crate::table::StormTable;

/// Dimension a chart aggregates by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupKey {
    /// Calendar year of `event_month`.
    Year,
    /// The raw month. Meant for a table already narrowed to one year.
    Month,
}

/// Value of the group key for one output row. Orders chronologically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(untagged)]
pub enum Group {
    Year(i32),
    Month(NaiveDate),
}

/// Summed metrics for one group.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupRow {
    pub group: Group,
    /// Display label taken from the table's derived columns:
    /// the year ("2020") or the month name ("May").
    pub label: String,
    pub total_event_count: i64,
    pub sum_deaths_direct: i64,
    pub sum_damage_crops: f64,
    pub sum_damage_property: f64,
}

/// A summed column of [`GroupRow`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    EventCount,
    DeathsDirect,
    DamageCrops,
    DamageProperty,
}

impl Metric {
    pub fn value(&self, row: &GroupRow) -> f64 {
        match self {
            Metric::EventCount => row.total_event_count as f64,
            Metric::DeathsDirect => row.sum_deaths_direct as f64,
            Metric::DamageCrops => row.sum_damage_crops,
            Metric::DamageProperty => row.sum_damage_property,
        }
    }
}

/// Sum every metric per group, ascending by group.
///
/// Only groups with at least one input row appear; an empty table yields an
/// empty vector. Null metric cells count as zero. Duplicate rows are summed.
pub fn aggregate(table: &StormTable, key: GroupKey) -> Vec<GroupRow> {
    let (years, months, names) = (
        table.event_years(),
        table.event_months(),
        table.event_month_names(),
    );
    let (counts, deaths) = (table.event_counts(), table.deaths_direct());
    let (crops, property) = (table.damage_crops(), table.damage_property());

    let mut groups: BTreeMap<Group, GroupRow> = BTreeMap::new();
    for i in 0..table.num_rows() {
        let (group, label) = match key {
            GroupKey::Year => (Group::Year(years.value(i)), years.value(i).to_string()),
            GroupKey::Month => match days_to_date(months.value(i)) {
                Some(month) => (Group::Month(month), names.value(i).to_string()),
                None => continue,
            },
        };

        let row = groups.entry(group).or_insert_with(|| GroupRow {
            group,
            label,
            total_event_count: 0,
            sum_deaths_direct: 0,
            sum_damage_crops: 0.0,
            sum_damage_property: 0.0,
        });
        if counts.is_valid(i) {
            row.total_event_count += counts.value(i);
        }
        if deaths.is_valid(i) {
            row.sum_deaths_direct += deaths.value(i);
        }
        if crops.is_valid(i) {
            row.sum_damage_crops += crops.value(i);
        }
        if property.is_valid(i) {
            row.sum_damage_property += property.value(i);
        }
    }

    groups.into_values().collect()
}
