// src/schema/arrow.rs

use arrow::datatypes::{DataType, Field, Schema, SchemaRef};
use std::sync::Arc;

pub const STATE: &str = "state";
pub const EVENT_GROUP: &str = "event_group";
pub const EVENT_MONTH: &str = "event_month";
pub const TOTAL_EVENT_COUNT: &str = "total_event_count";
pub const SUM_DEATHS_DIRECT: &str = "sum_deaths_direct";
pub const SUM_DAMAGE_CROPS: &str = "sum_damage_crops";
pub const SUM_DAMAGE_PROPERTY: &str = "sum_damage_property";

pub const EVENT_YEAR: &str = "event_year";
pub const EVENT_MONTH_NAME: &str = "event_month_name";

/// Columns of the warehouse fact table, in query order.
pub const FACT_COLUMNS: [&str; 7] = [
    STATE,
    EVENT_GROUP,
    EVENT_MONTH,
    TOTAL_EVENT_COUNT,
    SUM_DEATHS_DIRECT,
    SUM_DAMAGE_CROPS,
    SUM_DAMAGE_PROPERTY,
];

/// Column positions inside a loaded table.
pub mod col {
    pub const STATE: usize = 0;
    pub const EVENT_GROUP: usize = 1;
    pub const EVENT_MONTH: usize = 2;
    pub const TOTAL_EVENT_COUNT: usize = 3;
    pub const SUM_DEATHS_DIRECT: usize = 4;
    pub const SUM_DAMAGE_CROPS: usize = 5;
    pub const SUM_DAMAGE_PROPERTY: usize = 6;
    pub const EVENT_YEAR: usize = 7;
    pub const EVENT_MONTH_NAME: usize = 8;
}

/// Map a fact column to the Arrow type it is held as in memory.
///
/// - state, event_group            → Utf8 (nullable)
/// - event_month                   → Date32, first day of the month
/// - total_event_count, deaths     → Int64
/// - crop and property damage      → Float64
pub fn fact_type(name: &str) -> Option<DataType> {
    match name {
        STATE | EVENT_GROUP => Some(DataType::Utf8),
        EVENT_MONTH => Some(DataType::Date32),
        TOTAL_EVENT_COUNT | SUM_DEATHS_DIRECT => Some(DataType::Int64),
        SUM_DAMAGE_CROPS | SUM_DAMAGE_PROPERTY => Some(DataType::Float64),
        _ => None,
    }
}

fn fact_fields() -> Vec<Field> {
    FACT_COLUMNS
        .iter()
        .filter_map(|name| {
            fact_type(name).map(|dt| Field::new(*name, dt, /* nullable = */ *name != EVENT_MONTH))
        })
        .collect()
}

/// Schema of the fact table as fetched from the warehouse or a snapshot.
pub fn fact_schema() -> SchemaRef {
    Arc::new(Schema::new(fact_fields()))
}

/// Schema of a loaded table: the fact columns followed by the derived ones.
pub fn table_schema() -> SchemaRef {
    let mut fields = fact_fields();
    fields.push(Field::new(EVENT_YEAR, DataType::Int32, false));
    fields.push(Field::new(EVENT_MONTH_NAME, DataType::Utf8, false));
    Arc::new(Schema::new(fields))
}
