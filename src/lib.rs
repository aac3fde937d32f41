// src/lib.rs

//! Data core of the Severe Storm Events dashboard.
//!
//! The storm-events fact table is loaded once from the warehouse
//! ([`loader::TableCache`]), narrowed by the user's selection
//! ([`filter::filter`]) and summed per year or month
//! ([`aggregate::aggregate`]). [`dashboard`] turns those sums into the
//! chart series the presentation surface draws.

pub mod aggregate;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod filter;
pub mod loader;
pub mod schema;
pub mod table;
pub mod warehouse;

pub use aggregate::{aggregate, Group, GroupKey, GroupRow, Metric};
pub use config::Config;
pub use error::{ConfigError, LoadError};
pub use filter::{filter, Filter, ALL_STATES};
pub use loader::TableCache;
pub use table::{EventRecord, StormTable};
pub use warehouse::Warehouse;
