//! Runtime validation of dataframes against generated models
//!
//! [`ModelRegistry`] holds one [`FrameModel`] per generated class. Validating
//! a frame runs the column checks, the nested checks of inlined columns
//! (through [`NestedDispatcher`] and the shape transformers) and the
//! cardinality checks, collecting violations into [`SchemaErrors`].

pub mod cardinality;
pub mod dispatcher;
pub mod model;
pub mod registry;
pub mod report;
pub mod transforms;

pub use cardinality::{cardinality_violations, check_cardinality};
pub use dispatcher::NestedDispatcher;
pub use model::{FrameModel, InlineDetails};
pub use registry::ModelRegistry;
pub use report::{ErrorCategory, FailureCase, SchemaError, SchemaErrors};
pub use transforms::{
    CollectionStructTransformer, ListStructTransformer, NestedStructTransformer, ShapeTransformer,
    SimpleDictTransformer,
};

use linkml_core::LinkMLError;
use thiserror::Error;

use crate::frame::FrameError;

/// Outcome of a failed frame validation
#[derive(Debug, Clone, Error, PartialEq)]
pub enum FrameValidationError {
    /// Data violates the model
    #[error(transparent)]
    Schema(#[from] SchemaErrors),

    /// The frame could not be reshaped for validation
    #[error("Reshape fault: {0}")]
    Reshape(#[from] FrameError),

    /// A nested range names no known model
    #[error("Unknown model: {0}")]
    UnknownModel(String),

    #[error("Validation configuration error: {0}")]
    Configuration(String),
}

impl From<FrameValidationError> for LinkMLError {
    fn from(err: FrameValidationError) -> Self {
        match err {
            FrameValidationError::Schema(_) | FrameValidationError::Reshape(_) => {
                LinkMLError::data_validation(err.to_string())
            }
            FrameValidationError::UnknownModel(_) | FrameValidationError::Configuration(_) => {
                LinkMLError::config(err.to_string())
            }
        }
    }
}
