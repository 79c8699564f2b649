//! # `LinkML` Core
//!
//! Schema types, error handling and configuration shared by the `LinkML`
//! Pandera generator and its validation runtime.

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

/// Core error types for `LinkML` operations
pub mod error;

/// Type definitions for `LinkML` schemas
pub mod types;

/// Generator and validation configuration
pub mod config;

// Re-export commonly used types
pub use config::{GenerationConfig, PanderaGenConfig, TemplateKind, ValidationConfig};
pub use error::{LinkMLError, Result};
pub use serde_json::Value;
pub use types::{ClassDefinition, EnumDefinition, SchemaDefinition, SlotDefinition, TypeDefinition};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::config::*;
    pub use crate::error::{LinkMLError, Result};
    pub use crate::types::*;
}
