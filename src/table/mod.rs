// src/table/mod.rs

//! The in-memory storm-events table.

pub mod derive;

use arrow::{
    array::{
        Array, ArrayRef, AsArray, BooleanArray, Date32Array, Float64Array, Int32Array,
        Int64Array, StringArray,
    },
    compute::{cast, filter_record_batch},
    datatypes::{DataType, Date32Type, Float64Type, Int32Type, Int64Type},
    error::ArrowError,
    record_batch::RecordBatch,
};
use chrono::NaiveDate;
use std::sync::Arc;

use crate::error::LoadError;
use crate::schema::{
    arrow::{self as cols, col},
    date_to_days, days_to_date, fact_schema, parse_event_month, table_schema,
};

/// One row of the fact table: a state × month × event-category aggregate.
#[derive(Debug, Clone, PartialEq)]
pub struct EventRecord {
    pub state: Option<String>,
    pub event_group: Option<String>,
    pub event_month: NaiveDate,
    pub total_event_count: Option<i64>,
    pub sum_deaths_direct: Option<i64>,
    pub sum_damage_crops: Option<f64>,
    pub sum_damage_property: Option<f64>,
}

/// Build a fact-schema batch from decoded warehouse rows.
pub fn fact_batch_from_records(records: &[EventRecord]) -> Result<RecordBatch, ArrowError> {
    let states = StringArray::from_iter(records.iter().map(|r| r.state.as_deref()));
    let groups = StringArray::from_iter(records.iter().map(|r| r.event_group.as_deref()));
    let months =
        Date32Array::from_iter_values(records.iter().map(|r| date_to_days(r.event_month)));
    let counts = Int64Array::from_iter(records.iter().map(|r| r.total_event_count));
    let deaths = Int64Array::from_iter(records.iter().map(|r| r.sum_deaths_direct));
    let crops = Float64Array::from_iter(records.iter().map(|r| r.sum_damage_crops));
    let property = Float64Array::from_iter(records.iter().map(|r| r.sum_damage_property));

    RecordBatch::try_new(
        fact_schema(),
        vec![
            Arc::new(states) as ArrayRef,
            Arc::new(groups),
            Arc::new(months),
            Arc::new(counts),
            Arc::new(deaths),
            Arc::new(crops),
            Arc::new(property),
        ],
    )
}

/// The loaded fact table plus its derived `event_year` and
/// `event_month_name` columns.
///
/// Immutable once built. Filtering produces a new table.
#[derive(Debug, Clone, PartialEq)]
pub struct StormTable {
    batch: RecordBatch,
}

impl StormTable {
    /// Validate a fact batch and compute the derived columns.
    ///
    /// Columns are matched by name and cast to their in-memory types, so a
    /// snapshot written with INT32 counts or a TIMESTAMP month loads the same
    /// as a BigQuery result.
    pub fn from_fact_batch(batch: &RecordBatch) -> Result<Self, LoadError> {
        let states = cast_column(batch, cols::STATE, &DataType::Utf8)?;
        let groups = cast_column(batch, cols::EVENT_GROUP, &DataType::Utf8)?;
        let months = decode_months(column(batch, cols::EVENT_MONTH)?)?;
        let counts = cast_column(batch, cols::TOTAL_EVENT_COUNT, &DataType::Int64)?;
        let deaths = cast_column(batch, cols::SUM_DEATHS_DIRECT, &DataType::Int64)?;
        let crops = cast_column(batch, cols::SUM_DAMAGE_CROPS, &DataType::Float64)?;
        let property = cast_column(batch, cols::SUM_DAMAGE_PROPERTY, &DataType::Float64)?;

        let (years, names) = derive::derive_columns(&months);

        let batch = RecordBatch::try_new(
            table_schema(),
            vec![
                states,
                groups,
                Arc::new(months) as ArrayRef,
                counts,
                deaths,
                crops,
                property,
                Arc::new(years),
                Arc::new(names),
            ],
        )?;
        Ok(Self { batch })
    }

    pub fn from_records(records: &[EventRecord]) -> Result<Self, LoadError> {
        Self::from_fact_batch(&fact_batch_from_records(records)?)
    }

    pub fn empty() -> Self {
        Self {
            batch: RecordBatch::new_empty(table_schema()),
        }
    }

    pub fn num_rows(&self) -> usize {
        self.batch.num_rows()
    }

    pub fn is_empty(&self) -> bool {
        self.batch.num_rows() == 0
    }

    /// The full batch, derived columns included.
    pub fn batch(&self) -> &RecordBatch {
        &self.batch
    }

    /// Just the fact columns, as written to a snapshot.
    pub fn fact_batch(&self) -> Result<RecordBatch, ArrowError> {
        let indices: Vec<usize> = (0..cols::FACT_COLUMNS.len()).collect();
        self.batch.project(&indices)
    }

    /// Keep the rows where `mask` is true. Nulls in the mask drop the row.
    pub fn filter_rows(&self, mask: &BooleanArray) -> Result<Self, ArrowError> {
        Ok(Self {
            batch: filter_record_batch(&self.batch, mask)?,
        })
    }

    pub fn states(&self) -> &StringArray {
        self.batch.column(col::STATE).as_string::<i32>()
    }

    pub fn event_groups(&self) -> &StringArray {
        self.batch.column(col::EVENT_GROUP).as_string::<i32>()
    }

    pub fn event_months(&self) -> &Date32Array {
        self.batch.column(col::EVENT_MONTH).as_primitive::<Date32Type>()
    }

    pub fn event_years(&self) -> &Int32Array {
        self.batch.column(col::EVENT_YEAR).as_primitive::<Int32Type>()
    }

    pub fn event_month_names(&self) -> &StringArray {
        self.batch.column(col::EVENT_MONTH_NAME).as_string::<i32>()
    }

    pub fn event_counts(&self) -> &Int64Array {
        self.batch.column(col::TOTAL_EVENT_COUNT).as_primitive::<Int64Type>()
    }

    pub fn deaths_direct(&self) -> &Int64Array {
        self.batch.column(col::SUM_DEATHS_DIRECT).as_primitive::<Int64Type>()
    }

    pub fn damage_crops(&self) -> &Float64Array {
        self.batch.column(col::SUM_DAMAGE_CROPS).as_primitive::<Float64Type>()
    }

    pub fn damage_property(&self) -> &Float64Array {
        self.batch.column(col::SUM_DAMAGE_PROPERTY).as_primitive::<Float64Type>()
    }

    /// Materialize the rows, mostly useful for tests and debugging.
    pub fn records(&self) -> Vec<EventRecord> {
        let (states, groups, months) = (self.states(), self.event_groups(), self.event_months());
        let (counts, deaths) = (self.event_counts(), self.deaths_direct());
        let (crops, property) = (self.damage_crops(), self.damage_property());

        (0..self.num_rows())
            .filter_map(|i| {
                Some(EventRecord {
                    state: states.is_valid(i).then(|| states.value(i).to_string()),
                    event_group: groups.is_valid(i).then(|| groups.value(i).to_string()),
                    event_month: days_to_date(months.value(i))?,
                    total_event_count: counts.is_valid(i).then(|| counts.value(i)),
                    sum_deaths_direct: deaths.is_valid(i).then(|| deaths.value(i)),
                    sum_damage_crops: crops.is_valid(i).then(|| crops.value(i)),
                    sum_damage_property: property.is_valid(i).then(|| property.value(i)),
                })
            })
            .collect()
    }
}

fn column<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a ArrayRef, LoadError> {
    batch
        .column_by_name(name)
        .ok_or_else(|| LoadError::Decode(format!("missing column `{}`", name)))
}

fn cast_column(batch: &RecordBatch, name: &str, dt: &DataType) -> Result<ArrayRef, LoadError> {
    cast(column(batch, name)?, dt)
        .map_err(|e| LoadError::Decode(format!("column `{}` is not {}: {}", name, dt, e)))
}

/// Bring `event_month` to month-start Date32, whatever form it arrived in.
fn decode_months(raw: &ArrayRef) -> Result<Date32Array, LoadError> {
    let months = match raw.data_type() {
        DataType::Utf8 | DataType::LargeUtf8 | DataType::Utf8View => {
            let text = cast(raw, &DataType::Utf8)?;
            let text = text.as_string::<i32>();
            let mut days = Vec::with_capacity(text.len());
            for i in 0..text.len() {
                if text.is_null(i) {
                    return Err(LoadError::Decode(format!("row {}: event_month is null", i)));
                }
                let date = parse_event_month(text.value(i)).ok_or_else(|| {
                    LoadError::Decode(format!(
                        "row {}: cannot parse event_month {:?}",
                        i,
                        text.value(i)
                    ))
                })?;
                days.push(date_to_days(date));
            }
            Date32Array::from(days)
        }
        _ => {
            let dates = cast(raw, &DataType::Date32).map_err(|e| {
                LoadError::Decode(format!("column `event_month` is not a date: {}", e))
            })?;
            dates.as_primitive::<Date32Type>().clone()
        }
    };
    derive::truncate_to_month(&months)
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::{StringArray, TimestampSecondArray};
    use arrow::datatypes::{Field, Schema};

    fn record(state: Option<&str>, group: Option<&str>, y: i32, m: u32, count: i64) -> EventRecord {
        EventRecord {
            state: state.map(String::from),
            event_group: group.map(String::from),
            event_month: NaiveDate::from_ymd_opt(y, m, 1).unwrap(),
            total_event_count: Some(count),
            sum_deaths_direct: Some(0),
            sum_damage_crops: Some(0.0),
            sum_damage_property: None,
        }
    }

    #[test]
    fn test_from_records_round_trips_and_derives() {
        let records = vec![
            record(Some("TX"), Some("Tornado"), 2020, 5, 3),
            record(None, Some("Flood"), 1950, 1, 2),
            record(Some("OK"), None, 2024, 12, 1),
        ];
        let table = StormTable::from_records(&records).unwrap();

        assert_eq!(table.num_rows(), 3);
        assert_eq!(table.records(), records);
        assert_eq!(table.event_years().values().to_vec(), vec![2020, 1950, 2024]);
        assert_eq!(table.event_month_names().value(0), "May");
        assert_eq!(table.event_month_names().value(1), "January");
        assert_eq!(table.event_month_names().value(2), "December");
        assert!(table.states().is_null(1));
        assert!(table.damage_property().is_null(0));
    }

    #[test]
    fn test_from_fact_batch_casts_loose_types() {
        // Month as text, counts as Int32, damage as Int64, extra column ignored.
        let schema = Arc::new(Schema::new(vec![
            Field::new("extra", DataType::Utf8, true),
            Field::new("state", DataType::Utf8, true),
            Field::new("event_group", DataType::Utf8, true),
            Field::new("event_month", DataType::Utf8, true),
            Field::new("total_event_count", DataType::Int32, true),
            Field::new("sum_deaths_direct", DataType::Int32, true),
            Field::new("sum_damage_crops", DataType::Int64, true),
            Field::new("sum_damage_property", DataType::Float64, true),
        ]));
        let batch = RecordBatch::try_new(
            schema,
            vec![
                Arc::new(StringArray::from(vec!["x"])) as ArrayRef,
                Arc::new(StringArray::from(vec!["TX"])),
                Arc::new(StringArray::from(vec!["Hail"])),
                Arc::new(StringArray::from(vec!["2021-07-15T00:00:00"])),
                Arc::new(Int32Array::from(vec![4])),
                Arc::new(Int32Array::from(vec![1])),
                Arc::new(Int64Array::from(vec![250])),
                Arc::new(Float64Array::from(vec![10.5])),
            ],
        )
        .unwrap();

        let table = StormTable::from_fact_batch(&batch).unwrap();
        let rows = table.records();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].event_month, NaiveDate::from_ymd_opt(2021, 7, 1).unwrap());
        assert_eq!(rows[0].total_event_count, Some(4));
        assert_eq!(rows[0].sum_damage_crops, Some(250.0));
        assert_eq!(table.event_years().value(0), 2021);
    }

    #[test]
    fn test_from_fact_batch_accepts_timestamp_month() {
        let fact = fact_batch_from_records(&[record(Some("KS"), Some("Wind"), 2019, 3, 1)]).unwrap();
        let mut columns = fact.columns().to_vec();
        // 2019-03-20T12:00:00Z
        columns[col::EVENT_MONTH] = Arc::new(TimestampSecondArray::from(vec![1_553_083_200]));
        let mut fields: Vec<Field> = fact.schema().fields().iter().map(|f| f.as_ref().clone()).collect();
        fields[col::EVENT_MONTH] = Field::new(
            "event_month",
            columns[col::EVENT_MONTH].data_type().clone(),
            false,
        );
        let batch = RecordBatch::try_new(Arc::new(Schema::new(fields)), columns).unwrap();

        let table = StormTable::from_fact_batch(&batch).unwrap();
        assert_eq!(
            table.records()[0].event_month,
            NaiveDate::from_ymd_opt(2019, 3, 1).unwrap()
        );
    }

    #[test]
    fn test_missing_column_is_decode_error() {
        let fact = fact_batch_from_records(&[record(Some("TX"), None, 2020, 1, 1)]).unwrap();
        let projected = fact.project(&[0, 1, 2, 3, 4, 5]).unwrap();
        let err = StormTable::from_fact_batch(&projected).unwrap_err();
        assert!(matches!(err, LoadError::Decode(msg) if msg.contains("sum_damage_property")));
    }

    #[test]
    fn test_unparseable_month_is_decode_error() {
        let fact = fact_batch_from_records(&[record(Some("TX"), None, 2020, 1, 1)]).unwrap();
        let mut columns = fact.columns().to_vec();
        columns[col::EVENT_MONTH] = Arc::new(StringArray::from(vec!["someday"]));
        let mut fields: Vec<Field> = fact.schema().fields().iter().map(|f| f.as_ref().clone()).collect();
        fields[col::EVENT_MONTH] = Field::new("event_month", DataType::Utf8, false);
        let batch = RecordBatch::try_new(Arc::new(Schema::new(fields)), columns).unwrap();

        assert!(matches!(
            StormTable::from_fact_batch(&batch),
            Err(LoadError::Decode(_))
        ));
    }

    #[test]
    fn test_empty_table() {
        let table = StormTable::empty();
        assert!(table.is_empty());
        assert_eq!(table.fact_batch().unwrap().num_columns(), 7);
        assert!(StormTable::from_records(&[]).unwrap().is_empty());
    }
}
