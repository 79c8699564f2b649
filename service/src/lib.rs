//! # LinkML Pandera
//!
//! Generates dataframe validators from LinkML schemas and validates nested,
//! inlined column data against them.
//!
//! ## Overview
//!
//! - **Classification**: every slot of every class is classified into a
//!   column type and, for class ranges, a physical representation
//!   (foreign key, struct, list of structs, simple dict, collection dict)
//! - **Code Generation**: Pandera `DataFrameModel` classes for Polars, or
//!   plain `polars`/`pyarrow` schemas
//! - **Nested Validation**: inlined columns are flattened into one row per
//!   nested record and validated by the nested model, recursively
//!
//! ## Quick Start
//!
//! ```rust
//! use linkml_pandera::prelude::*;
//! use serde_json::json;
//!
//! let schema = YamlParser::new().parse_str(r"
//! id: https://example.org/shapes
//! name: shapes
//! default_range: string
//! classes:
//!   Shape:
//!     attributes:
//!       id:
//!         identifier: true
//!       sides:
//!         range: integer
//!         minimum_value: 3
//! ")?;
//!
//! let generator = PanderaGenerator::new();
//! let code = generator.generate(&schema)?;
//! assert!(code.contains("class Shape(pla.DataFrameModel"));
//!
//! let document = generator.render(&schema)?;
//! let registry = ModelRegistry::from_document(&document, &ValidationConfig::default())?;
//! assert!(registry.validate_records("Shape", &[json!({"id": "t", "sides": 2})]).is_err());
//! # Ok::<(), LinkMLError>(())
//! ```

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::doc_markdown)] // LinkML, Pandera, Polars are proper nouns
#![allow(clippy::missing_panics_doc)]

/// Schema parsing
pub mod parser;

/// Read-only schema introspection
pub mod schema_view;

/// Slot classification and code generation
pub mod generator;

/// Polars frames built from JSON records
pub mod frame;

/// Frame validation against generated models
pub mod validator;

/// Command-line interface
pub mod cli;

pub mod prelude;

pub use linkml_core::error::LinkMLError;
pub use linkml_core::prelude::*;
