pub mod arrow;
pub mod month;

pub use self::arrow::{fact_schema, table_schema, FACT_COLUMNS};
pub use self::month::{date_to_days, days_to_date, month_name, parse_event_month};
