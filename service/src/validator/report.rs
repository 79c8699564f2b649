//! Structured validation errors

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use thiserror::Error;

/// Kind of violation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorCategory {
    /// A cell does not conform to the column type
    WrongType,
    /// A required column is absent
    ColumnMissing,
    /// A column or nested check failed
    CheckFailed,
    /// A key occurs too few or too many times
    Cardinality,
    /// A non-nullable column contains nulls
    NullValues,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorCategory::WrongType => write!(f, "WRONG_DATATYPE"),
            ErrorCategory::ColumnMissing => write!(f, "COLUMN_NOT_IN_DATAFRAME"),
            ErrorCategory::CheckFailed | ErrorCategory::Cardinality => {
                write!(f, "DATAFRAME_CHECK")
            }
            ErrorCategory::NullValues => write!(f, "SERIES_CONTAINS_NULLS"),
        }
    }
}

/// A value that failed a check
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailureCase {
    /// Row index; `None` for table-level checks
    pub index: Option<usize>,
    pub value: Value,
}

/// One violation found while validating a frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaError {
    /// Model that reported the violation
    pub schema: String,
    /// Column the violation refers to
    pub column: Option<String>,
    pub category: ErrorCategory,
    /// Name of the failing check
    pub check: String,
    pub message: String,
    pub failure_cases: Vec<FailureCase>,
}

impl SchemaError {
    /// Create a new error without failure cases
    pub fn new(
        schema: impl Into<String>,
        column: impl Into<String>,
        category: ErrorCategory,
        check: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            schema: schema.into(),
            column: Some(column.into()),
            category,
            check: check.into(),
            message: message.into(),
            failure_cases: Vec::new(),
        }
    }

    /// Attach failure cases
    #[must_use]
    pub fn with_failure_cases(mut self, cases: Vec<FailureCase>) -> Self {
        self.failure_cases = cases;
        self
    }
}

impl fmt::Display for SchemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {}.{}: {} (check: {}",
            self.category,
            self.schema,
            self.column.as_deref().unwrap_or("*"),
            self.message,
            self.check
        )?;
        if !self.failure_cases.is_empty() {
            write!(f, ", {} failure cases", self.failure_cases.len())?;
        }
        write!(f, ")")
    }
}

/// Every violation found by one lazy validation
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{}", self.summary())]
pub struct SchemaErrors {
    /// Model that was validated
    pub schema: String,
    errors: Vec<SchemaError>,
}

impl SchemaErrors {
    pub fn new(schema: impl Into<String>) -> Self {
        Self {
            schema: schema.into(),
            errors: Vec::new(),
        }
    }

    pub fn push(&mut self, error: SchemaError) {
        self.errors.push(error);
    }

    /// Merge the errors of another validation, unchanged
    pub fn merge(&mut self, other: SchemaErrors) {
        self.errors.extend(other.errors);
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    #[must_use]
    pub fn errors(&self) -> &[SchemaError] {
        &self.errors
    }

    /// Errors of one category
    pub fn by_category(&self, category: ErrorCategory) -> impl Iterator<Item = &SchemaError> {
        self.errors.iter().filter(move |e| e.category == category)
    }

    /// Errors on one column
    pub fn for_column<'a>(&'a self, column: &'a str) -> impl Iterator<Item = &'a SchemaError> {
        self.errors
            .iter()
            .filter(move |e| e.column.as_deref() == Some(column))
    }

    /// `Ok(())` when nothing was collected
    ///
    /// # Errors
    ///
    /// Returns `self` if any error was collected
    pub fn into_result(self) -> Result<(), SchemaErrors> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }

    /// One-line summary followed by every error
    #[must_use]
    pub fn summary(&self) -> String {
        let mut summary = format!(
            "Validation of {} failed with {} errors",
            self.schema,
            self.errors.len()
        );
        for error in &self.errors {
            summary.push_str("\n  ");
            summary.push_str(&error.to_string());
        }
        summary
    }
}
