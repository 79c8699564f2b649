//! Runtime validation models
//!
//! A [`FrameModel`] is the executable counterpart of one generated model
//! class: column checks, nested checks on inlined columns and table-level
//! cardinality checks.

use indexmap::IndexMap;
use linkml_core::{Result as LinkMLResult, ValidationConfig};
use polars::prelude::Column;
use regex::Regex;
use serde_json::{Value, json};
use std::cmp::Ordering;
use tracing::debug;

use super::FrameValidationError;
use super::cardinality::cardinality_violations;
use super::dispatcher::NestedDispatcher;
use super::registry::ModelRegistry;
use super::report::{ErrorCategory, FailureCase, SchemaError, SchemaErrors};
use crate::frame::{ColumnSchema, DataFrame, DataType, Series, dtype_name, series_values};
use crate::generator::document::ModelClass;
use crate::generator::projector::structural_type;
use crate::generator::slot_classifier::{RepresentationKind, SimpleDictShape, SlotMetadata};

/// Field names a simple dict entry is expanded into
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineDetails {
    /// Receives the mapping key
    pub id: String,
    /// Receives a scalar mapping value
    pub other: String,
}

impl From<&SimpleDictShape> for InlineDetails {
    fn from(shape: &SimpleDictShape) -> Self {
        Self {
            id: shape.id_field.clone(),
            other: shape.other_field.clone(),
        }
    }
}

/// Executable validation model of one class
#[derive(Debug, Clone)]
pub struct FrameModel {
    name: String,
    fields: Vec<SlotMetadata>,
    id_name: Option<String>,
    nested_ranges: IndexMap<String, String>,
    inline_forms: IndexMap<String, RepresentationKind>,
    inline_details: IndexMap<String, InlineDetails>,
    patterns: IndexMap<String, Regex>,
    config: ValidationConfig,
}

impl FrameModel {
    /// Build the model of a generated class
    ///
    /// # Errors
    ///
    /// Returns an error if a slot pattern is not a valid regular expression
    pub fn from_class(class: &ModelClass, config: &ValidationConfig) -> LinkMLResult<Self> {
        let mut nested_ranges = IndexMap::new();
        let mut inline_forms = IndexMap::new();
        let mut inline_details = IndexMap::new();
        let mut patterns = IndexMap::new();

        for field in &class.all_fields {
            let column = field.field_name.clone();
            if let Some(kind) = field.nested_representation() {
                inline_forms.insert(column.clone(), kind);
                if let Some(model) = field.reference_model() {
                    nested_ranges.insert(column.clone(), model);
                }
            }
            if let Some(shape) = &field.simple_dict {
                inline_details.insert(column.clone(), InlineDetails::from(shape));
            }
            if let Some(pattern) = &field.pattern {
                // matched from the start of the value, like `str_matches`
                patterns.insert(column, Regex::new(&format!("^(?:{pattern})"))?);
            }
        }

        Ok(Self {
            name: class.name.clone(),
            fields: class.all_fields.clone(),
            id_name: class.id_field_name().map(str::to_string),
            nested_ranges,
            inline_forms,
            inline_details,
            patterns,
            config: config.clone(),
        })
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn fields(&self) -> &[SlotMetadata] {
        &self.fields
    }

    #[must_use]
    pub fn field(&self, column: &str) -> Option<&SlotMetadata> {
        self.fields.iter().find(|f| f.field_name == column)
    }

    /// Column of the identifier field
    #[must_use]
    pub fn id_name(&self) -> Option<&str> {
        self.id_name.as_deref()
    }

    /// Model validating the records of a nested column
    #[must_use]
    pub fn nested_range(&self, column: &str) -> Option<&str> {
        self.nested_ranges.get(column).map(String::as_str)
    }

    #[must_use]
    pub fn inline_form(&self, column: &str) -> Option<RepresentationKind> {
        self.inline_forms.get(column).copied()
    }

    #[must_use]
    pub fn inline_details(&self, column: &str) -> Option<&InlineDetails> {
        self.inline_details.get(column)
    }

    #[must_use]
    pub fn config(&self) -> &ValidationConfig {
        &self.config
    }

    /// Structural column schema
    #[must_use]
    pub fn column_schema(&self) -> ColumnSchema {
        self.fields
            .iter()
            .map(|f| (f.field_name.clone(), structural_type(f)))
            .collect()
    }

    /// Validate a frame against this model
    ///
    /// In lazy mode every violation is collected, nested ones included;
    /// otherwise validation stops after the first failing column.
    ///
    /// # Errors
    ///
    /// Returns `FrameValidationError::Schema` with the collected violations,
    /// or a configuration error if a nested model cannot be resolved
    pub fn validate(&self, df: &DataFrame, registry: &ModelRegistry) -> Result<(), FrameValidationError> {
        debug!(model = %self.name, rows = df.height(), "validating frame");
        let dispatcher = NestedDispatcher::new(registry);
        let mut errors = SchemaErrors::new(&self.name);

        for field in &self.fields {
            self.check_field(field, df, &dispatcher, &mut errors)?;
            if !self.config.lazy && !errors.is_empty() {
                return Err(errors.into());
            }
        }

        for field in self.fields.iter().filter(|f| f.has_cardinality()) {
            self.check_cardinality(field, df, &mut errors);
            if !self.config.lazy && !errors.is_empty() {
                return Err(errors.into());
            }
        }

        Ok(errors.into_result()?)
    }

    fn check_field(
        &self,
        field: &SlotMetadata,
        df: &DataFrame,
        dispatcher: &NestedDispatcher<'_>,
        errors: &mut SchemaErrors,
    ) -> Result<(), FrameValidationError> {
        let column = field.field_name.as_str();
        let Ok(series) = df.column(column).map(Column::as_materialized_series) else {
            if field.required {
                errors.push(SchemaError::new(
                    &self.name,
                    column,
                    ErrorCategory::ColumnMissing,
                    "column_in_dataframe",
                    format!("column '{column}' not in dataframe"),
                ));
            }
            return Ok(());
        };

        let nested = field.nested_representation();
        // nested columns are type checked by their nested model
        if nested.is_none() {
            self.check_dtype(field, series, errors);
        }
        if field.required {
            self.check_nulls(series, errors);
        }

        let permissible = field.permissible_values();
        let needs_cells = field.minimum_value.is_some()
            || field.maximum_value.is_some()
            || self.patterns.contains_key(column)
            || permissible.is_some();
        let cells = if needs_cells {
            series_values(series)?
        } else {
            Vec::new()
        };

        if let Some(min) = &field.minimum_value {
            self.check_values(
                column,
                &cells,
                format!("greater_than_or_equal_to({min})"),
                |v| compare(v, min).is_none_or(|o| o != Ordering::Less),
                errors,
            );
        }
        if let Some(max) = &field.maximum_value {
            self.check_values(
                column,
                &cells,
                format!("less_than_or_equal_to({max})"),
                |v| compare(v, max).is_none_or(|o| o != Ordering::Greater),
                errors,
            );
        }
        if let Some(regex) = self.patterns.get(column) {
            self.check_values(
                column,
                &cells,
                format!("str_matches('{}')", field.pattern.as_deref().unwrap_or_default()),
                |v| v.as_str().is_none_or(|s| regex.is_match(s)),
                errors,
            );
        }
        if let Some(values) = permissible {
            self.check_values(
                column,
                &cells,
                format!("isin({values:?})"),
                |v| v.as_str().is_some_and(|s| values.iter().any(|p| p == s)),
                errors,
            );
        }

        if let Some(kind) = nested {
            let check = field.nested_check_name().unwrap_or_else(|| kind.to_string());
            match dispatcher.check_column(self, df, column, kind) {
                Ok(true) => {}
                Ok(false) => errors.push(SchemaError::new(
                    &self.name,
                    column,
                    ErrorCategory::CheckFailed,
                    check,
                    format!("nested {kind} validation of column '{column}' failed"),
                )),
                Err(FrameValidationError::Schema(nested_errors)) => errors.merge(nested_errors),
                Err(other) => return Err(other),
            }
        }

        Ok(())
    }

    fn check_dtype(&self, field: &SlotMetadata, series: &Series, errors: &mut SchemaErrors) {
        let expected = structural_type(field);
        let actual = series.dtype();
        if series.is_empty() || dtype_fits(&expected, actual, field.required) {
            return;
        }

        let column = series.name().as_str();
        let expected = dtype_name(&expected);
        errors.push(
            SchemaError::new(
                &self.name,
                column,
                ErrorCategory::WrongType,
                format!("dtype('{expected}')"),
                format!("expected column '{column}' to have type {expected}"),
            )
            .with_failure_cases(vec![FailureCase {
                index: None,
                value: Value::String(dtype_name(actual)),
            }]),
        );
    }

    fn check_nulls(&self, series: &Series, errors: &mut SchemaErrors) {
        let nulls = series.is_null();
        let cases: Vec<FailureCase> = nulls
            .into_iter()
            .enumerate()
            .filter(|(_, is_null)| is_null.unwrap_or(false))
            .map(|(index, _)| FailureCase {
                index: Some(index),
                value: Value::Null,
            })
            .collect();

        if !cases.is_empty() {
            let column = series.name().as_str();
            errors.push(
                SchemaError::new(
                    &self.name,
                    column,
                    ErrorCategory::NullValues,
                    "not_nullable",
                    format!("non-nullable column '{column}' contains {} null values", cases.len()),
                )
                .with_failure_cases(self.cap(cases)),
            );
        }
    }

    /// Element-wise check; list cells are checked item by item and nulls pass
    fn check_values<F>(
        &self,
        column: &str,
        cells: &[Value],
        check: String,
        passes: F,
        errors: &mut SchemaErrors,
    ) where
        F: Fn(&Value) -> bool,
    {
        let mut cases = Vec::new();
        for (index, cell) in cells.iter().enumerate() {
            let items: Vec<&Value> = match cell {
                Value::Array(items) => items.iter().collect(),
                other => vec![other],
            };
            for item in items.into_iter().filter(|v| !v.is_null()) {
                if !passes(item) {
                    cases.push(FailureCase {
                        index: Some(index),
                        value: item.clone(),
                    });
                }
            }
        }

        if !cases.is_empty() {
            errors.push(
                SchemaError::new(
                    &self.name,
                    column,
                    ErrorCategory::CheckFailed,
                    check,
                    format!("{} values of column '{column}' failed", cases.len()),
                )
                .with_failure_cases(self.cap(cases)),
            );
        }
    }

    fn check_cardinality(&self, field: &SlotMetadata, df: &DataFrame, errors: &mut SchemaErrors) {
        let column = field.field_name.as_str();
        if df.column(column).is_err() {
            return;
        }

        let (min, max) = (field.minimum_cardinality, field.maximum_cardinality);
        let bounds = format!(
            "[{}, {}]",
            min.map_or_else(|| "*".to_string(), |m| m.to_string()),
            max.map_or_else(|| "*".to_string(), |m| m.to_string())
        );
        let error = match cardinality_violations(df, column, min, max) {
            Ok(groups) if groups.is_empty() => return,
            Ok(groups) => SchemaError::new(
                &self.name,
                column,
                ErrorCategory::Cardinality,
                field.cardinality_check_name(),
                format!(
                    "{} keys of column '{column}' occur outside {bounds} times",
                    groups.len()
                ),
            )
            .with_failure_cases(
                self.cap(
                    groups
                        .into_iter()
                        .map(|(key, count)| FailureCase {
                            index: None,
                            value: json!({"key": key, "count": count}),
                        })
                        .collect(),
                ),
            ),
            Err(fault) => SchemaError::new(
                &self.name,
                column,
                ErrorCategory::Cardinality,
                field.cardinality_check_name(),
                fault.to_string(),
            ),
        };
        errors.push(error);
    }

    fn cap(&self, mut cases: Vec<FailureCase>) -> Vec<FailureCase> {
        cases.truncate(self.config.max_failure_cases);
        cases
    }
}

/// Whether a column of `actual` type can hold a field declared as `expected`
///
/// Opaque fields take anything, float fields take integers and an optional
/// field may be null throughout.
fn dtype_fits(expected: &DataType, actual: &DataType, required: bool) -> bool {
    match (expected, actual) {
        (DataType::Binary, _) => true,
        (_, DataType::Null) => !required,
        (DataType::Float32 | DataType::Float64, actual) => matches!(
            actual,
            DataType::Float32 | DataType::Float64 | DataType::Int32 | DataType::Int64
        ),
        (DataType::Struct(fields), DataType::Struct(_)) if fields.is_empty() => true,
        (DataType::List(expected), DataType::List(actual)) => dtype_fits(expected, actual, false),
        (expected, actual) => expected == actual,
    }
}

/// Order of a cell against a bound; `None` when not comparable
fn compare(value: &Value, bound: &Value) -> Option<Ordering> {
    match (value, bound) {
        (Value::Number(v), Value::Number(b)) => v.as_f64()?.partial_cmp(&b.as_f64()?),
        (Value::String(v), Value::String(b)) => Some(v.as_str().cmp(b.as_str())),
        (Value::Number(v), Value::String(b)) => v.as_f64()?.partial_cmp(&b.trim().parse::<f64>().ok()?),
        _ => None,
    }
}
