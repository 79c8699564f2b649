//! Loading JSON records into polars frames

use polars::prelude::{
    AnyValue, Column, DataFrame, DataType, IntoColumn, IntoSeries, PlSmallStr, Series,
    StructChunked,
};
use serde_json::Value;
use tracing::trace;

use super::json::{infer_dtype, json_to_any, series_values};
use super::{ColumnSchema, FrameError, FrameResult, needs_inference};

/// Build one column from its cells
///
/// The declared type is used when every cell fits it; otherwise the column
/// takes the type inferred from its cells, so a type check sees what the
/// data really holds.
fn build_column(name: &str, cells: &[&Value], declared: Option<&DataType>) -> FrameResult<Series> {
    if let Some(dtype) = declared.filter(|d| !needs_inference(d)) {
        let fitted: Option<Vec<AnyValue<'static>>> = cells
            .iter()
            .map(|cell| json_to_any(cell, dtype, false))
            .collect();
        if let Some(values) = fitted {
            return Ok(Series::from_any_values_and_dtype(
                PlSmallStr::from(name),
                &values,
                dtype,
                true,
            )?);
        }
        trace!(column = name, "cells do not fit the declared type, inferring");
    }

    let dtype = infer_dtype(cells.iter().copied());
    let values = cells
        .iter()
        .map(|cell| json_to_any(cell, &dtype, true))
        .collect::<Option<Vec<_>>>()
        .ok_or_else(|| {
            FrameError::SchemaMismatch(format!("column '{name}' cannot be held as {dtype:?}"))
        })?;
    Ok(Series::from_any_values_and_dtype(
        PlSmallStr::from(name),
        &values,
        &dtype,
        true,
    )?)
}

/// Columns of `records`: every schema column first, then keys outside the
/// schema in first-seen order
///
/// A null record contributes a null cell to every column.
fn record_columns(records: &[Value], schema: &ColumnSchema) -> FrameResult<Vec<Series>> {
    let mut names: Vec<&str> = schema.keys().map(String::as_str).collect();
    for (row, record) in records.iter().enumerate() {
        let fields = match record {
            Value::Object(fields) => fields,
            Value::Null => continue,
            other => {
                return Err(FrameError::SchemaMismatch(format!(
                    "row {row} is not a record: {other}"
                )));
            }
        };
        for key in fields.keys() {
            if !names.contains(&key.as_str()) {
                names.push(key.as_str());
            }
        }
    }

    names
        .into_iter()
        .map(|name| {
            let cells: Vec<&Value> = records
                .iter()
                .map(|r| r.get(name).unwrap_or(&Value::Null))
                .collect();
            build_column(name, &cells, schema.get(name))
        })
        .collect()
}

/// Load row records into a frame typed after `schema`
///
/// Schema columns are always present; missing cells are null.
///
/// # Errors
///
/// Returns `FrameError::SchemaMismatch` if a record is not an object
pub fn from_records(records: &[Value], schema: &ColumnSchema) -> FrameResult<DataFrame> {
    let columns: Vec<Column> = record_columns(records, schema)?
        .into_iter()
        .map(IntoColumn::into_column)
        .collect();
    Ok(DataFrame::new(columns)?)
}

/// Struct series named `name` holding one record per row, typed like
/// [`from_records`] types a frame
///
/// # Errors
///
/// Returns `FrameError::SchemaMismatch` if a record is neither an object nor null
pub fn records_series(name: &str, records: &[Value], schema: &ColumnSchema) -> FrameResult<Series> {
    let fields = record_columns(records, schema)?;
    let chunked = StructChunked::from_series(PlSmallStr::from(name), records.len(), fields.iter())?;
    Ok(chunked.into_series())
}

/// Rows of a frame as JSON records
///
/// # Errors
///
/// Returns an error if a column cannot be read back as JSON
pub fn to_records(df: &DataFrame) -> FrameResult<Vec<Value>> {
    let columns = df
        .get_columns()
        .iter()
        .map(|c| Ok((c.name().to_string(), series_values(c.as_materialized_series())?)))
        .collect::<FrameResult<Vec<_>>>()?;

    Ok((0..df.height())
        .map(|row| {
            Value::Object(
                columns
                    .iter()
                    .map(|(name, cells)| (name.clone(), cells.get(row).cloned().unwrap_or(Value::Null)))
                    .collect(),
            )
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::untyped_struct;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_schema_columns_come_first_with_declared_types() -> FrameResult<()> {
        let schema = ColumnSchema::from([
            ("id".to_string(), DataType::String),
            ("size".to_string(), DataType::Int32),
        ]);
        let df = from_records(&[json!({"n": 1, "id": "a"}), json!({"n": 2.5})], &schema)?;

        assert_eq!(df.height(), 2);
        assert_eq!(df.get_column_names_str(), vec!["id", "size", "n"]);
        assert_eq!(df.column("size")?.dtype(), &DataType::Int32);
        assert_eq!(df.column("n")?.dtype(), &DataType::Float64);
        Ok(())
    }

    #[test]
    fn test_cells_that_do_not_fit_are_inferred() -> FrameResult<()> {
        let schema = ColumnSchema::from([("size".to_string(), DataType::Int64)]);
        let df = from_records(&[json!({"size": 1}), json!({"size": "big"})], &schema)?;
        assert_eq!(df.column("size")?.dtype(), &DataType::String);
        assert_eq!(
            series_values(df.column("size")?.as_materialized_series())?,
            vec![json!("1"), json!("big")]
        );
        Ok(())
    }

    #[test]
    fn test_untyped_struct_takes_the_data_layout() -> FrameResult<()> {
        let schema = ColumnSchema::from([("p".to_string(), untyped_struct())]);
        let records = [json!({"p": {"x": 1}}), json!({"p": null}), json!({"p": {"y": "b"}})];
        let df = from_records(&records, &schema)?;

        let p = df.column("p")?.as_materialized_series();
        assert_eq!(
            series_values(p)?,
            vec![json!({"x": 1, "y": null}), Value::Null, json!({"x": null, "y": "b"})]
        );
        Ok(())
    }

    #[test]
    fn test_records_must_be_objects() {
        let result = from_records(&[json!([1, 2])], &ColumnSchema::new());
        assert!(matches!(result, Err(FrameError::SchemaMismatch(_))));
    }

    #[test]
    fn test_records_series_keeps_declared_fields() -> FrameResult<()> {
        let schema = ColumnSchema::from([
            ("id".to_string(), DataType::String),
            ("label".to_string(), DataType::String),
        ]);
        let series = records_series("points", &[json!({"id": "a", "label": null})], &schema)?;
        assert_eq!(series.name().as_str(), "points");
        assert_eq!(
            series.dtype(),
            &crate::frame::struct_of([
                ("id".to_string(), DataType::String),
                ("label".to_string(), DataType::String),
            ])
        );
        Ok(())
    }
}
