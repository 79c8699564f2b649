//! Shape transformers
//!
//! Each inline form is flattened into a frame with one row per nested record
//! so the nested model can validate it like any other table. Records are
//! typed against the nested model's column schema before they are exploded
//! and unnested, so an optional field that is null everywhere still carries
//! its declared type.

use polars::prelude::{
    BooleanChunked, DataFrame, IntoSeries, ListChunked, NewChunkedArray, PlSmallStr,
};
use serde_json::{Map, Value};
use tracing::debug;

use super::model::{FrameModel, InlineDetails};
use crate::frame::{
    ColumnSchema, DataType, FrameError, FrameResult, records_series, series_values,
    untyped_struct,
};

/// Flattens one nested column
pub trait ShapeTransformer {
    /// Frame of the column's nested records, one per row
    ///
    /// # Errors
    ///
    /// Returns a frame error if the column does not have the expected shape
    fn prepare(&self, df: &DataFrame, column: &str) -> FrameResult<DataFrame>;
}

fn cells(df: &DataFrame, column: &str) -> FrameResult<Vec<Value>> {
    series_values(df.column(column)?.as_materialized_series())
}

/// One row per record of `rows`
///
/// `rows[i]` holds the records of row `i` of `selected`. Rows without records
/// are filtered out, the rest get a list-of-struct column typed by `schema`
/// which is then exploded and unnested.
fn explode_records(
    selected: &DataFrame,
    column: &str,
    rows: Vec<Vec<Value>>,
    schema: &ColumnSchema,
) -> FrameResult<DataFrame> {
    let mask: Vec<bool> = rows.iter().map(|records| !records.is_empty()).collect();
    let lengths: Vec<usize> = rows.iter().map(Vec::len).filter(|len| *len > 0).collect();
    if lengths.is_empty() {
        return Ok(DataFrame::empty());
    }

    let entries: Vec<Value> = rows.into_iter().flatten().collect();
    let records = records_series(column, &entries, schema)?;

    let mut lists = Vec::with_capacity(lengths.len());
    let mut offset = 0_i64;
    for len in lengths {
        lists.push(Some(records.slice(offset, len)));
        offset += i64::try_from(len)
            .map_err(|_| FrameError::Compute(format!("column '{column}' holds too many records")))?;
    }
    let list = lists
        .into_iter()
        .collect::<ListChunked>()
        .with_name(PlSmallStr::from(column));

    let mut kept = selected.filter(&BooleanChunked::from_slice(PlSmallStr::EMPTY, &mask))?;
    kept.with_column(list.into_series())?;
    Ok(kept.explode([column])?.unnest([column])?)
}

/// Mapping from identifier to scalar value or partial record
pub struct SimpleDictTransformer<'a> {
    nested: &'a FrameModel,
    details: &'a InlineDetails,
}

impl<'a> SimpleDictTransformer<'a> {
    #[must_use]
    pub fn new(nested: &'a FrameModel, details: &'a InlineDetails) -> Self {
        Self { nested, details }
    }

    /// Declared fields of the nested model
    fn declared(&self) -> Vec<&str> {
        self.nested
            .fields()
            .iter()
            .map(|f| f.field_name.as_str())
            .collect()
    }

    /// Column schema of the normalized entries
    fn entry_schema(&self) -> ColumnSchema {
        let schema = self.nested.column_schema();
        if schema.len() == 2 {
            return [&self.details.id, &self.details.other]
                .into_iter()
                .map(|name| {
                    let dtype = schema.get(name).cloned().unwrap_or(DataType::Binary);
                    (name.clone(), dtype)
                })
                .collect();
        }

        schema
            .into_iter()
            .map(|(name, dtype)| match dtype {
                DataType::Binary => (name, untyped_struct()),
                other => (name, other),
            })
            .collect()
    }

    fn entries(&self, cell: &Value) -> FrameResult<Vec<Value>> {
        let mapping = cell.as_object().ok_or_else(|| {
            FrameError::Compute(format!("simple dict value is not a mapping: {cell}"))
        })?;
        let declared = self.declared();

        Ok(mapping
            .iter()
            .map(|(key, value)| match value {
                Value::Object(record) if record.keys().all(|k| declared.contains(&k.as_str())) => {
                    let mut entry = record.clone();
                    entry.insert(self.details.id.clone(), Value::String(key.clone()));
                    for name in &declared {
                        entry.entry(*name).or_insert(Value::Null);
                    }
                    Value::Object(entry)
                }
                other => {
                    let mut entry = Map::new();
                    entry.insert(self.details.id.clone(), Value::String(key.clone()));
                    entry.insert(self.details.other.clone(), other.clone());
                    Value::Object(entry)
                }
            })
            .collect())
    }

    /// List of records for one mapping cell
    ///
    /// A value that is a record made only of declared fields is kept, with
    /// the identifier taken from the key and absent fields set to null. Any
    /// other value becomes `{id: key, other: value}`.
    ///
    /// # Errors
    ///
    /// Returns `FrameError::Compute` if the cell is not a mapping
    pub fn normalize(&self, cell: &Value) -> FrameResult<Value> {
        self.entries(cell).map(Value::Array)
    }
}

impl ShapeTransformer for SimpleDictTransformer<'_> {
    fn prepare(&self, df: &DataFrame, column: &str) -> FrameResult<DataFrame> {
        let selected = df.select([column])?;
        let rows = cells(&selected, column)?
            .iter()
            .map(|cell| match cell {
                Value::Null => Ok(Vec::new()),
                mapping => self.entries(mapping),
            })
            .collect::<FrameResult<Vec<_>>>()?;
        explode_records(&selected, column, rows, &self.entry_schema())
    }
}

/// Mapping from identifier to full record
pub struct CollectionStructTransformer<'a> {
    nested: &'a FrameModel,
}

impl<'a> CollectionStructTransformer<'a> {
    #[must_use]
    pub fn new(nested: &'a FrameModel) -> Self {
        Self { nested }
    }

    fn entries(cell: &Value, id_name: &str) -> FrameResult<Vec<Value>> {
        let mapping = cell.as_object().ok_or_else(|| {
            FrameError::Compute(format!("collection value is not a mapping: {cell}"))
        })?;

        mapping
            .iter()
            .map(|(key, value)| {
                let mut record = value.as_object().cloned().ok_or_else(|| {
                    FrameError::Compute(format!("collection entry '{key}' is not a record: {value}"))
                })?;
                if !record.contains_key(id_name) {
                    record.insert(id_name.to_string(), Value::String(key.clone()));
                }
                Ok(Value::Object(record))
            })
            .collect()
    }

    /// List of records for one mapping cell, each carrying its key as identifier
    ///
    /// # Errors
    ///
    /// Returns `FrameError::Compute` if the cell or one of its values is not a
    /// mapping
    pub fn normalize(&self, cell: &Value, id_name: &str) -> FrameResult<Value> {
        Self::entries(cell, id_name).map(Value::Array)
    }
}

impl ShapeTransformer for CollectionStructTransformer<'_> {
    fn prepare(&self, df: &DataFrame, column: &str) -> FrameResult<DataFrame> {
        let id_name = self.nested.id_name().ok_or_else(|| {
            FrameError::Compute(format!(
                "collection model {} has no identifier",
                self.nested.name()
            ))
        })?;

        let selected = df.select([column])?;
        let rows = cells(&selected, column)?
            .iter()
            .map(|cell| match cell {
                Value::Null => Ok(Vec::new()),
                mapping => Self::entries(mapping, id_name),
            })
            .collect::<FrameResult<Vec<_>>>()?;
        explode_records(&selected, column, rows, &self.nested.column_schema())
    }
}

/// Sequence of records
pub struct ListStructTransformer<'a> {
    nested: &'a FrameModel,
}

impl<'a> ListStructTransformer<'a> {
    #[must_use]
    pub fn new(nested: &'a FrameModel) -> Self {
        Self { nested }
    }
}

impl ShapeTransformer for ListStructTransformer<'_> {
    fn prepare(&self, df: &DataFrame, column: &str) -> FrameResult<DataFrame> {
        let selected = df.select([column])?;
        let rows = cells(&selected, column)?
            .into_iter()
            .enumerate()
            .map(|(row, cell)| match cell {
                Value::Array(items) => Ok(items),
                Value::Null => Ok(Vec::new()),
                other => Err(FrameError::SchemaMismatch(format!(
                    "column '{column}' row {row} is not a list: {other}"
                ))),
            })
            .collect::<FrameResult<Vec<_>>>();

        match rows {
            Ok(rows) => explode_records(&selected, column, rows, &self.nested.column_schema()),
            Err(fault) => {
                // a single-valued slot inlined as list holds one record per row
                debug!(column, %fault, "column is not a list of records, unnesting directly");
                NestedStructTransformer::new(self.nested).prepare(df, column)
            }
        }
    }
}

/// One record per row
pub struct NestedStructTransformer<'a> {
    nested: &'a FrameModel,
}

impl<'a> NestedStructTransformer<'a> {
    #[must_use]
    pub fn new(nested: &'a FrameModel) -> Self {
        Self { nested }
    }
}

impl ShapeTransformer for NestedStructTransformer<'_> {
    fn prepare(&self, df: &DataFrame, column: &str) -> FrameResult<DataFrame> {
        let selected = df.select([column])?;
        let present = selected.column(column)?.as_materialized_series().is_not_null();
        let mut kept = selected.filter(&present)?;

        let records = cells(&kept, column)?;
        kept.with_column(records_series(column, &records, &self.nested.column_schema())?)?;
        Ok(kept.unnest([column])?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::{from_records, to_records};
    use crate::generator::PanderaGenerator;
    use crate::parser::{SchemaParser, YamlParser};
    use crate::validator::ModelRegistry;
    use linkml_core::ValidationConfig;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::sync::Arc;

    const SCHEMA: &str = r"
id: https://example.org/shapes
name: shapes
default_range: string
classes:
  Tag:
    attributes:
      id:
        identifier: true
      other:
        range: integer
  Item:
    attributes:
      id:
        identifier: true
      label: {}
      weight:
        range: float
";

    fn models() -> (Arc<FrameModel>, Arc<FrameModel>) {
        let schema = YamlParser::new().parse_str(SCHEMA).expect("schema should parse");
        let document = PanderaGenerator::new()
            .render(&schema)
            .expect("schema should render");
        let registry = ModelRegistry::from_document(&document, &ValidationConfig::default())
            .expect("registry should build");
        (
            registry.get("Tag").expect("Tag model"),
            registry.get("Item").expect("Item model"),
        )
    }

    fn column(values: Value) -> DataFrame {
        let rows: Vec<Value> = values
            .as_array()
            .cloned()
            .unwrap_or_default()
            .into_iter()
            .map(|v| json!({"col": v}))
            .collect();
        from_records(&rows, &ColumnSchema::new()).expect("records should load")
    }

    fn details() -> InlineDetails {
        InlineDetails {
            id: "id".to_string(),
            other: "other".to_string(),
        }
    }

    #[test]
    fn test_simple_dict_mixes_scalars_and_records() -> FrameResult<()> {
        let (tag, _) = models();
        let details = details();
        let transformer = SimpleDictTransformer::new(&tag, &details);

        let df = column(json!([{"A": 1, "B": {"id": "B", "other": 2}}, null, {}]));
        let flat = transformer.prepare(&df, "col")?;

        assert_eq!(to_records(&flat)?, vec![
            json!({"id": "A", "other": 1}),
            json!({"id": "B", "other": 2}),
        ]);
        Ok(())
    }

    #[test]
    fn test_simple_dict_normalization_is_idempotent() -> FrameResult<()> {
        let (tag, _) = models();
        let details = details();
        let transformer = SimpleDictTransformer::new(&tag, &details);

        let once = transformer.normalize(&json!({"A": 1, "B": {"other": 2}}))?;
        let as_mapping: Map<String, Value> = once
            .as_array()
            .into_iter()
            .flatten()
            .filter_map(|entry| {
                let key = entry.get("id")?.as_str()?.to_string();
                Some((key, entry.clone()))
            })
            .collect();
        let twice = transformer.normalize(&Value::Object(as_mapping))?;
        assert_eq!(once, twice);
        Ok(())
    }

    #[test]
    fn test_simple_dict_rejects_non_mapping() {
        let (tag, _) = models();
        let details = details();
        let transformer = SimpleDictTransformer::new(&tag, &details);
        assert!(matches!(
            transformer.prepare(&column(json!([[1, 2]])), "col"),
            Err(FrameError::Compute(_))
        ));
    }

    #[test]
    fn test_collection_injects_missing_identifier() -> FrameResult<()> {
        let (_, item) = models();
        let transformer = CollectionStructTransformer::new(&item);

        let df = column(json!([
            {"k1": {"label": "one"}, "k2": {"id": "explicit", "weight": 2.5}},
            {}
        ]));
        let flat = transformer.prepare(&df, "col")?;

        assert_eq!(flat.get_column_names_str(), vec!["id", "label", "weight"]);
        assert_eq!(to_records(&flat)?, vec![
            json!({"id": "k1", "label": "one", "weight": null}),
            json!({"id": "explicit", "label": null, "weight": 2.5}),
        ]);
        Ok(())
    }

    #[test]
    fn test_collection_requires_records() {
        let (_, item) = models();
        let transformer = CollectionStructTransformer::new(&item);
        let result = transformer.prepare(&column(json!([{"k1": "scalar"}])), "col");
        assert!(matches!(result, Err(FrameError::Compute(_))));
    }

    #[test]
    fn test_list_struct_explodes_records() -> FrameResult<()> {
        let (_, item) = models();
        let df = column(json!([[{"id": "a"}, {"id": "b"}], [], null, [{"id": "c"}]]));
        let flat = ListStructTransformer::new(&item).prepare(&df, "col")?;
        assert_eq!(flat.height(), 3);
        assert_eq!(
            series_values(flat.column("id")?.as_materialized_series())?,
            vec![json!("a"), json!("b"), json!("c")]
        );
        Ok(())
    }

    #[test]
    fn test_list_struct_falls_back_to_single_records() -> FrameResult<()> {
        let (_, item) = models();
        let df = column(json!([{"id": "a"}, null]));
        let flat = ListStructTransformer::new(&item).prepare(&df, "col")?;
        assert_eq!(to_records(&flat)?, vec![
            json!({"id": "a", "label": null, "weight": null})
        ]);
        Ok(())
    }

    #[test]
    fn test_nested_struct_drops_null_rows() -> FrameResult<()> {
        let (_, item) = models();
        let df = column(json!([{"id": "a", "label": "x"}, null]));
        let flat = NestedStructTransformer::new(&item).prepare(&df, "col")?;
        assert_eq!(to_records(&flat)?, vec![
            json!({"id": "a", "label": "x", "weight": null})
        ]);
        Ok(())
    }

    #[test]
    fn test_null_fields_keep_their_declared_type() -> FrameResult<()> {
        let (_, item) = models();
        let df = column(json!([[{"id": "a", "label": null, "weight": null}]]));
        let flat = ListStructTransformer::new(&item).prepare(&df, "col")?;
        assert_eq!(flat.column("label")?.dtype(), &DataType::String);
        assert_eq!(flat.column("weight")?.dtype(), &DataType::Float32);

        let single = column(json!([{"id": "b", "label": null}]));
        let flat = NestedStructTransformer::new(&item).prepare(&single, "col")?;
        assert_eq!(flat.column("label")?.dtype(), &DataType::String);
        Ok(())
    }
}
