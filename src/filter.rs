// src/filter.rs

use arrow::array::{Array, BooleanArray};
use arrow::error::ArrowError;
use std::collections::BTreeSet;

use crate::table::StormTable;

/// State-selector entry that disables the state filter.
pub const ALL_STATES: &str = "All States";

/// Row predicates chosen by the user. Predicates compose conjunctively;
/// an unset predicate keeps every row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filter {
    /// `None` or [`ALL_STATES`] keeps every state.
    pub state: Option<String>,
    /// Empty keeps every event group.
    pub event_groups: BTreeSet<String>,
    pub year: Option<i32>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(mut self, state: impl Into<String>) -> Self {
        self.state = Some(state.into());
        self
    }

    pub fn event_groups<I, S>(mut self, groups: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.event_groups = groups.into_iter().map(Into::into).collect();
        self
    }

    pub fn year(mut self, year: i32) -> Self {
        self.year = Some(year);
        self
    }

    /// The state to match, if the state filter is active.
    fn active_state(&self) -> Option<&str> {
        self.state.as_deref().filter(|s| *s != ALL_STATES)
    }

    fn is_noop(&self) -> bool {
        self.active_state().is_none() && self.event_groups.is_empty() && self.year.is_none()
    }

    /// One entry per row of `table`: true where every active predicate holds.
    ///
    /// Null states or groups never match an active predicate on that column.
    pub fn mask(&self, table: &StormTable) -> BooleanArray {
        let state = self.active_state();
        let (states, groups, years) = (table.states(), table.event_groups(), table.event_years());

        (0..table.num_rows())
            .map(|i| {
                let state_ok = match state {
                    Some(s) => states.is_valid(i) && states.value(i) == s,
                    None => true,
                };
                let group_ok = self.event_groups.is_empty()
                    || (groups.is_valid(i) && self.event_groups.contains(groups.value(i)));
                let year_ok = self.year.map_or(true, |y| years.value(i) == y);
                Some(state_ok && group_ok && year_ok)
            })
            .collect()
    }
}

/// Return the rows of `table` matching `filter`. The input is left untouched.
///
/// A selection that matches nothing yields an empty table, not an error. The
/// only failure is an internal Arrow error, which cannot occur for a mask
/// built from the same table.
pub fn filter(table: &StormTable, filter: &Filter) -> Result<StormTable, ArrowError> {
    if filter.is_noop() {
        return Ok(table.clone());
    }
    table.filter_rows(&filter.mask(table))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::EventRecord;
    use chrono::NaiveDate;

    fn row(state: Option<&str>, group: Option<&str>, y: i32, m: u32, count: i64) -> EventRecord {
        EventRecord {
            state: state.map(String::from),
            event_group: group.map(String::from),
            event_month: NaiveDate::from_ymd_opt(y, m, 1).unwrap(),
            total_event_count: Some(count),
            sum_deaths_direct: Some(0),
            sum_damage_crops: Some(0.0),
            sum_damage_property: Some(0.0),
        }
    }

    fn sample() -> StormTable {
        StormTable::from_records(&[
            row(Some("TX"), Some("Tornado"), 2020, 5, 3),
            row(Some("TX"), Some("Flood"), 2020, 5, 2),
            row(Some("OK"), Some("Tornado"), 2019, 4, 7),
            row(None, Some("Hail"), 2020, 6, 1),
            row(Some("TX"), None, 2021, 1, 4),
        ])
        .unwrap()
    }

    fn is_subset(sub: &StormTable, of: &StormTable) -> bool {
        let all = of.records();
        sub.records().iter().all(|r| all.contains(r))
    }

    #[test]
    fn test_no_predicates_keeps_everything() {
        let table = sample();
        assert_eq!(filter(&table, &Filter::new()).unwrap(), table);
        assert_eq!(filter(&table, &Filter::new().state(ALL_STATES)).unwrap(), table);
    }

    #[test]
    fn test_state_filter_excludes_null_states() {
        let table = sample();
        let out = filter(&table, &Filter::new().state("TX")).unwrap();
        assert_eq!(out.num_rows(), 3);
        assert!(out.records().iter().all(|r| r.state.as_deref() == Some("TX")));
    }

    #[test]
    fn test_event_group_filter() {
        let table = sample();
        let out = filter(&table, &Filter::new().event_groups(["Tornado", "Hail"])).unwrap();
        let groups: Vec<_> = out.records().into_iter().filter_map(|r| r.event_group).collect();
        assert_eq!(groups, vec!["Tornado", "Tornado", "Hail"]);
    }

    #[test]
    fn test_predicates_compose() {
        let table = sample();
        let f = Filter::new().state("TX").event_groups(["Tornado"]).year(2020);
        let out = filter(&table, &f).unwrap();
        assert_eq!(out.records(), vec![row(Some("TX"), Some("Tornado"), 2020, 5, 3)]);
    }

    #[test]
    fn test_flood_selection_keeps_only_flood_row() {
        let table = StormTable::from_records(&[
            row(Some("TX"), Some("Tornado"), 2020, 5, 3),
            row(Some("TX"), Some("Flood"), 2020, 5, 2),
        ])
        .unwrap();
        let out = filter(&table, &Filter::new().event_groups(["Flood"])).unwrap();
        assert_eq!(out.records(), vec![row(Some("TX"), Some("Flood"), 2020, 5, 2)]);
    }

    #[test]
    fn test_unmatched_selection_is_empty_not_error() {
        let table = sample();
        assert!(filter(&table, &Filter::new().state("Atlantis")).unwrap().is_empty());
        assert!(filter(&table, &Filter::new().year(1950)).unwrap().is_empty());
        assert!(filter(&table, &Filter::new().year(2024)).unwrap().is_empty());
        assert!(filter(&StormTable::empty(), &Filter::new().state("TX")).unwrap().is_empty());
    }

    #[test]
    fn test_subset_and_idempotent() {
        let table = sample();
        let filters = [
            Filter::new(),
            Filter::new().state("TX"),
            Filter::new().event_groups(["Tornado"]),
            Filter::new().year(2020),
            Filter::new().state("OK").year(2020),
            Filter::new().state("TX").event_groups(["Flood", "Hail"]).year(2020),
        ];
        for f in &filters {
            let once = filter(&table, f).unwrap();
            assert!(is_subset(&once, &table), "{:?}", f);
            assert_eq!(filter(&once, f).unwrap(), once, "{:?}", f);
        }
    }

    #[test]
    fn test_input_not_mutated() {
        let table = sample();
        let before = table.records();
        let _ = filter(&table, &Filter::new().state("OK")).unwrap();
        assert_eq!(table.records(), before);
    }
}
