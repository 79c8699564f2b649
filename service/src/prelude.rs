//! Prelude module for LinkML Pandera
//!
//! This module re-exports commonly used types and functions for convenient import.

// Re-export core types
pub use linkml_core::prelude::*;

// Re-export parser utilities
pub use crate::parser::{JsonParser, Parser, SchemaParser, YamlParser};

// Re-export schema introspection
pub use crate::schema_view::SchemaView;

// Re-export generation types
pub use crate::generator::{
    Generator, GeneratorError, GeneratorResult, ModelDocument, PanderaGenerator,
    RepresentationKind, SchemaProjector, SlotClassifier, SlotMetadata,
};

// Re-export frame and validation types
pub use crate::frame::{ColumnSchema, DataFrame, DataType, FrameError, Series};
pub use crate::validator::{
    ErrorCategory, FrameModel, FrameValidationError, ModelRegistry, SchemaError, SchemaErrors,
};
