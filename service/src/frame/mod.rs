//! Polars glue for record data
//!
//! Loads JSON records into polars frames typed after a column schema, reads
//! cells back as JSON for element checks, and names dtypes the way error
//! reports print them.

pub mod json;
pub mod records;

pub use json::{infer_dtype, json_to_any, series_values};
pub use polars::prelude::{DataFrame, DataType, Series};
pub use records::{from_records, records_series, to_records};

use indexmap::IndexMap;
use polars::prelude::{Field, PlSmallStr, PolarsError};
use thiserror::Error;

/// Ordered column name to data type mapping
///
/// An untyped struct (see [`untyped_struct`]) leaves the field layout to the
/// data.
pub type ColumnSchema = IndexMap<String, DataType>;

/// Result type for frame operations
pub type FrameResult<T> = std::result::Result<T, FrameError>;

/// Faults raised while loading or reshaping a frame
#[derive(Debug, Clone, Error, PartialEq)]
pub enum FrameError {
    #[error("Polars error: {0}")]
    Polars(String),

    /// A cell or column does not have the shape an operation requires
    #[error("Schema mismatch: {0}")]
    SchemaMismatch(String),

    /// A normalization step failed
    #[error("Compute error: {0}")]
    Compute(String),
}

impl From<PolarsError> for FrameError {
    fn from(err: PolarsError) -> Self {
        Self::Polars(err.to_string())
    }
}

/// Struct whose fields are taken from the data
#[must_use]
pub fn untyped_struct() -> DataType {
    DataType::Struct(Vec::new())
}

#[must_use]
pub fn is_untyped_struct(dtype: &DataType) -> bool {
    matches!(dtype, DataType::Struct(fields) if fields.is_empty())
}

/// Whether the layout of `dtype` has to be inferred from the data
#[must_use]
pub fn needs_inference(dtype: &DataType) -> bool {
    match dtype {
        DataType::Struct(fields) => {
            fields.is_empty() || fields.iter().any(|f| needs_inference(f.dtype()))
        }
        DataType::List(inner) => needs_inference(inner),
        _ => false,
    }
}

/// Struct dtype with the given fields, in order
#[must_use]
pub fn struct_of(fields: impl IntoIterator<Item = (String, DataType)>) -> DataType {
    DataType::Struct(
        fields
            .into_iter()
            .map(|(name, dtype)| Field::new(PlSmallStr::from(name), dtype))
            .collect(),
    )
}

#[must_use]
pub fn list_of(inner: DataType) -> DataType {
    DataType::List(Box::new(inner))
}

/// Name of a dtype as printed in reports
#[must_use]
pub fn dtype_name(dtype: &DataType) -> String {
    match dtype {
        DataType::String => "Utf8".to_string(),
        DataType::Datetime(..) => "Datetime".to_string(),
        DataType::Binary => "Object".to_string(),
        DataType::Struct(fields) if fields.is_empty() => "Struct".to_string(),
        DataType::Struct(fields) => {
            let fields: Vec<String> = fields
                .iter()
                .map(|f| format!("'{}': {}", f.name(), dtype_name(f.dtype())))
                .collect();
            format!("Struct({{{}}})", fields.join(", "))
        }
        DataType::List(inner) => format!("List({})", dtype_name(inner)),
        other => format!("{other:?}"),
    }
}
