//! Core generator traits and types
//!
//! This module defines the error type and the `Generator` trait shared by
//! every output template.

use linkml_core::prelude::*;
use thiserror::Error;

/// Result type for generator operations
pub type GeneratorResult<T> = std::result::Result<T, GeneratorError>;

/// Errors that can occur during code generation
#[derive(Debug, Error)]
pub enum GeneratorError {
    /// Schema validation error
    #[error("Schema validation failed: {0}")]
    Validation(String),

    /// A slot range could not be resolved or mapped to a column type
    #[error("Cannot classify slot '{slot}' of class '{class}': {message}")]
    Classification {
        /// Owning class
        class: String,
        /// Slot being classified
        slot: String,
        /// What went wrong
        message: String,
    },

    /// Code generation error
    #[error("Code generation failed: {0}")]
    Generation(String),

    /// Template error
    #[error("Template error: {0}")]
    Template(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// `LinkML` core error
    #[error("LinkML error: {0}")]
    LinkML(#[from] LinkMLError),
}

impl GeneratorError {
    /// Build a classification error for one slot of one class
    pub fn classification(
        class: impl Into<String>,
        slot: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::Classification {
            class: class.into(),
            slot: slot.into(),
            message: message.into(),
        }
    }
}

impl From<std::fmt::Error> for GeneratorError {
    fn from(err: std::fmt::Error) -> Self {
        GeneratorError::Io(std::io::Error::other(err))
    }
}

impl From<GeneratorError> for LinkMLError {
    fn from(err: GeneratorError) -> Self {
        match err {
            GeneratorError::LinkML(inner) => inner,
            GeneratorError::Validation(message) => LinkMLError::schema_validation(message),
            GeneratorError::Classification {
                class,
                slot,
                message,
            } => LinkMLError::schema_element(message, format!("{class}.{slot}")),
            other => LinkMLError::service(other.to_string()),
        }
    }
}

/// Core trait for synchronous code generators
pub trait Generator: Send + Sync {
    /// Get generator name
    fn name(&self) -> &str;

    /// Get generator description
    fn description(&self) -> &str;

    /// Generate code from a schema
    ///
    /// # Errors
    /// Returns an error if the schema is invalid or code generation fails
    fn generate(&self, schema: &SchemaDefinition) -> Result<String>;

    /// Get the file extension for generated files
    fn get_file_extension(&self) -> &str;

    /// Get supported file extensions
    fn file_extensions(&self) -> Vec<&str> {
        vec![self.get_file_extension()]
    }

    /// Get the default filename for generated files
    fn get_default_filename(&self) -> &str;

    /// Validate schema before generation
    ///
    /// # Errors
    /// Returns an error if the schema validation fails
    fn validate_schema(&self, schema: &SchemaDefinition) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification_error_maps_to_schema_element() {
        let err: LinkMLError =
            GeneratorError::classification("Table", "column", "unknown range 'Nope'").into();
        match err {
            LinkMLError::SchemaValidationError { message, element } => {
                assert_eq!(message, "unknown range 'Nope'");
                assert_eq!(element.as_deref(), Some("Table.column"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
