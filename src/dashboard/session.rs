// src/dashboard/session.rs

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::info;

use super::{render, DashboardView, Selection};
use crate::loader::TableCache;
use crate::warehouse::Warehouse;

/// Something that happened on the presentation surface.
///
/// Arrives as one JSON object per line, e.g.
/// `{"type":"selection_changed","state":"TX","event_groups":["Flood"],"year":2020}`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DashboardEvent {
    /// Any widget moved. Carries the full widget state, not a delta.
    SelectionChanged(Selection),
    /// Drop the memoized table and query the warehouse again.
    ClearCache,
}

/// One viewer's page: the table cache plus the current selection.
pub struct Session<W> {
    cache: TableCache<W>,
    selection: Selection,
}

impl<W: Warehouse> Session<W> {
    pub fn new(cache: TableCache<W>) -> Self {
        Self {
            cache,
            selection: Selection::default(),
        }
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    /// Load the table and render the default selection.
    pub fn start(&mut self) -> Result<DashboardView> {
        self.refresh()
    }

    /// Apply `event` and re-render the whole page.
    pub fn handle(&mut self, event: DashboardEvent) -> Result<DashboardView> {
        match event {
            DashboardEvent::SelectionChanged(selection) => {
                self.selection = selection.clamped();
            }
            DashboardEvent::ClearCache => {
                info!("cache clear requested");
                self.cache.clear();
            }
        }
        self.refresh()
    }

    fn refresh(&mut self) -> Result<DashboardView> {
        let table = self.cache.load().context("loading storm events")?;
        render(&table, &self.selection).context("rendering dashboard")
    }
}
