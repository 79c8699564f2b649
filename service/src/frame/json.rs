//! Conversion between JSON cells and polars values

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, Timelike};
use indexmap::IndexMap;
use polars::prelude::{AnyValue, DataType, Field, PlSmallStr, Series, TimeUnit};
use serde_json::{Map, Value, json};

use super::{FrameError, FrameResult};

const NANOS_PER_SECOND: i64 = 1_000_000_000;

fn epoch() -> NaiveDate {
    DateTime::UNIX_EPOCH.date_naive()
}

fn parse_datetime(s: &str) -> Option<NaiveDateTime> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.naive_utc())
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f"))
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f"))
        .ok()
}

/// Polars value of a JSON cell for a column of `dtype`
///
/// Returns `None` when the cell does not fit the type. With `lenient`, any
/// value fits a string column as its JSON text; inferred columns of mixed
/// cells are held that way.
#[allow(clippy::cast_possible_truncation)]
#[must_use]
pub fn json_to_any(value: &Value, dtype: &DataType, lenient: bool) -> Option<AnyValue<'static>> {
    if value.is_null() {
        return Some(AnyValue::Null);
    }

    Some(match dtype {
        DataType::Boolean => AnyValue::Boolean(value.as_bool()?),
        DataType::Int32 => AnyValue::Int32(i32::try_from(value.as_i64()?).ok()?),
        DataType::Int64 => AnyValue::Int64(value.as_i64()?),
        DataType::Float32 => AnyValue::Float32(value.as_f64()? as f32),
        DataType::Float64 => AnyValue::Float64(value.as_f64()?),
        DataType::String => match value {
            Value::String(s) => AnyValue::StringOwned(PlSmallStr::from(s.as_str())),
            other if lenient => AnyValue::StringOwned(PlSmallStr::from(other.to_string())),
            _ => return None,
        },
        DataType::Date => {
            let date = NaiveDate::parse_from_str(value.as_str()?, "%Y-%m-%d").ok()?;
            AnyValue::Date(i32::try_from(date.signed_duration_since(epoch()).num_days()).ok()?)
        }
        DataType::Datetime(TimeUnit::Microseconds, None) => AnyValue::Datetime(
            parse_datetime(value.as_str()?)?.and_utc().timestamp_micros(),
            TimeUnit::Microseconds,
            None,
        ),
        DataType::Time => {
            let time = NaiveTime::parse_from_str(value.as_str()?, "%H:%M:%S%.f").ok()?;
            AnyValue::Time(
                i64::from(time.num_seconds_from_midnight()) * NANOS_PER_SECOND
                    + i64::from(time.nanosecond()),
            )
        }
        DataType::Binary => AnyValue::BinaryOwned(serde_json::to_vec(value).ok()?),
        DataType::List(inner) => {
            let items = value
                .as_array()?
                .iter()
                .map(|item| json_to_any(item, inner, lenient))
                .collect::<Option<Vec<_>>>()?;
            AnyValue::List(
                Series::from_any_values_and_dtype(PlSmallStr::EMPTY, &items, inner, true).ok()?,
            )
        }
        DataType::Struct(fields) => {
            let record = value.as_object()?;
            let values = fields
                .iter()
                .map(|f| {
                    let cell = record.get(f.name().as_str()).unwrap_or(&Value::Null);
                    json_to_any(cell, f.dtype(), lenient)
                })
                .collect::<Option<Vec<_>>>()?;
            AnyValue::StructOwned(Box::new((values, fields.clone())))
        }
        _ => return None,
    })
}

/// Shallow-to-deep type of one non-null cell
fn value_dtype(value: &Value) -> DataType {
    match value {
        Value::Null => DataType::Null,
        Value::Bool(_) => DataType::Boolean,
        Value::Number(n) if n.is_i64() => DataType::Int64,
        Value::Number(_) => DataType::Float64,
        Value::String(_) => DataType::String,
        Value::Array(items) => DataType::List(Box::new(infer_dtype(items))),
        Value::Object(record) => DataType::Struct(
            record
                .iter()
                .map(|(name, cell)| Field::new(PlSmallStr::from(name.as_str()), value_dtype(cell)))
                .collect(),
        ),
    }
}

/// Common type of two inferred types; unrelated types meet at string
fn merge(left: DataType, right: DataType) -> DataType {
    match (left, right) {
        (DataType::Null, other) | (other, DataType::Null) => other,
        (left, right) if left == right => left,
        (DataType::Int64, DataType::Float64) | (DataType::Float64, DataType::Int64) => {
            DataType::Float64
        }
        (DataType::List(left), DataType::List(right)) => {
            DataType::List(Box::new(merge(*left, *right)))
        }
        (DataType::Struct(left), DataType::Struct(right)) => {
            let mut fields: IndexMap<PlSmallStr, DataType> = left
                .into_iter()
                .map(|f| (f.name().clone(), f.dtype().clone()))
                .collect();
            for field in right {
                match fields.get_mut(field.name()) {
                    Some(known) => {
                        let previous = std::mem::replace(known, DataType::Null);
                        *known = merge(previous, field.dtype().clone());
                    }
                    None => {
                        fields.insert(field.name().clone(), field.dtype().clone());
                    }
                }
            }
            DataType::Struct(
                fields
                    .into_iter()
                    .map(|(name, dtype)| Field::new(name, dtype))
                    .collect(),
            )
        }
        _ => DataType::String,
    }
}

/// Type of a column of JSON cells
///
/// Records give structs over the union of their keys, sequences give lists
/// and an all-null column stays `Null`.
pub fn infer_dtype<'a>(values: impl IntoIterator<Item = &'a Value>) -> DataType {
    values
        .into_iter()
        .filter(|v| !v.is_null())
        .map(value_dtype)
        .fold(DataType::Null, merge)
}

fn any_to_json(value: &AnyValue<'_>) -> Value {
    match value {
        AnyValue::Null => Value::Null,
        AnyValue::Boolean(b) => Value::Bool(*b),
        AnyValue::Int8(n) => json!(n),
        AnyValue::Int16(n) => json!(n),
        AnyValue::Int32(n) => json!(n),
        AnyValue::Int64(n) => json!(n),
        AnyValue::UInt8(n) => json!(n),
        AnyValue::UInt16(n) => json!(n),
        AnyValue::UInt32(n) => json!(n),
        AnyValue::UInt64(n) => json!(n),
        AnyValue::Float32(n) => json!(f64::from(*n)),
        AnyValue::Float64(n) => json!(n),
        AnyValue::String(s) => Value::String((*s).to_string()),
        AnyValue::StringOwned(s) => Value::String(s.to_string()),
        AnyValue::Date(days) => epoch()
            .checked_add_signed(TimeDelta::days(i64::from(*days)))
            .map_or(Value::Null, |d| Value::String(d.format("%Y-%m-%d").to_string())),
        AnyValue::Datetime(v, unit, _) | AnyValue::DatetimeOwned(v, unit, _) => {
            let datetime = match unit {
                TimeUnit::Nanoseconds => Some(DateTime::from_timestamp_nanos(*v)),
                TimeUnit::Microseconds => DateTime::from_timestamp_micros(*v),
                TimeUnit::Milliseconds => DateTime::from_timestamp_millis(*v),
            };
            datetime.map_or(Value::Null, |dt| {
                Value::String(dt.naive_utc().format("%Y-%m-%dT%H:%M:%S%.f").to_string())
            })
        }
        AnyValue::Time(nanos) => {
            let secs = u32::try_from(nanos / NANOS_PER_SECOND).ok();
            let frac = u32::try_from(nanos % NANOS_PER_SECOND).ok();
            secs.zip(frac)
                .and_then(|(s, f)| NaiveTime::from_num_seconds_from_midnight_opt(s, f))
                .map_or(Value::Null, |t| Value::String(t.format("%H:%M:%S%.f").to_string()))
        }
        other => Value::String(other.to_string()),
    }
}

/// Cells of a series as JSON values
///
/// Structs become records (null where the struct itself is null), lists
/// become sequences and opaque columns are decoded from their JSON bytes.
///
/// # Errors
///
/// Returns an error if polars cannot downcast the series or an opaque cell
/// does not hold JSON
pub fn series_values(series: &Series) -> FrameResult<Vec<Value>> {
    match series.dtype() {
        DataType::Struct(_) => {
            let fields = series.struct_()?.fields_as_series();
            let columns = fields
                .iter()
                .map(|f| Ok((f.name().to_string(), series_values(f)?)))
                .collect::<FrameResult<Vec<_>>>()?;
            let nulls = series.is_null();

            Ok((0..series.len())
                .map(|row| {
                    if nulls.get(row).unwrap_or(true) {
                        return Value::Null;
                    }
                    let record: Map<String, Value> = columns
                        .iter()
                        .map(|(name, cells)| {
                            (name.clone(), cells.get(row).cloned().unwrap_or(Value::Null))
                        })
                        .collect();
                    Value::Object(record)
                })
                .collect())
        }
        DataType::List(inner) => {
            let lists = series.list()?;
            (0..lists.len())
                .map(|row| match lists.get_as_series(row) {
                    Some(items) => Ok(Value::Array(series_values(&items.cast(inner)?)?)),
                    None => Ok(Value::Null),
                })
                .collect()
        }
        DataType::Binary => series
            .binary()?
            .into_iter()
            .map(|cell| match cell {
                Some(bytes) => serde_json::from_slice(bytes)
                    .map_err(|e| FrameError::SchemaMismatch(format!("opaque cell is not JSON: {e}"))),
                None => Ok(Value::Null),
            })
            .collect(),
        _ => (0..series.len())
            .map(|row| Ok(any_to_json(&series.get(row)?)))
            .collect(),
    }
}
