// src/dashboard/chart.rs

use serde::Serialize;

use crate::aggregate::{GroupRow, Metric};

/// One point of a line: x label and value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Point {
    pub x: String,
    pub y: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Series {
    pub name: String,
    pub points: Vec<Point>,
}

/// Data and labels for one line chart. Drawing is up to the presentation
/// surface.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineChart {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub legend_title: Option<String>,
    /// Print each value next to its point.
    pub show_values: bool,
    pub series: Vec<Series>,
}

impl LineChart {
    /// A chart with one series per `(name, metric)`, all sharing the groups'
    /// order and labels.
    pub fn from_groups(
        title: impl Into<String>,
        y_label: impl Into<String>,
        groups: &[GroupRow],
        metrics: &[(&str, Metric)],
    ) -> Self {
        let series = metrics
            .iter()
            .map(|(name, metric)| Series {
                name: name.to_string(),
                points: groups
                    .iter()
                    .map(|g| Point {
                        x: g.label.clone(),
                        y: metric.value(g),
                    })
                    .collect(),
            })
            .collect();

        Self {
            title: title.into(),
            x_label: String::new(),
            y_label: y_label.into(),
            legend_title: None,
            show_values: false,
            series,
        }
    }

    pub fn with_legend_title(mut self, title: impl Into<String>) -> Self {
        self.legend_title = Some(title.into());
        self
    }

    pub fn with_values_shown(mut self) -> Self {
        self.show_values = true;
        self
    }

    /// True when no series has a point.
    pub fn is_empty(&self) -> bool {
        self.series.iter().all(|s| s.points.is_empty())
    }
}
