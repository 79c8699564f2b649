//! Code generation from `LinkML` schemas
//!
//! The schema is first classified slot by slot into a [`ModelDocument`],
//! which is then serialized by [`PanderaGenerator`] using one of the output
//! templates.

pub mod base;
pub mod document;
pub mod pandera;
pub mod projector;
pub mod slot_classifier;
pub mod traits;
pub mod type_map;

pub use base::BaseCodeFormatter;
pub use document::{ModelClass, ModelDocument};
pub use pandera::PanderaGenerator;
pub use projector::{SchemaProjector, simple_struct, structural_type};
pub use slot_classifier::{
    FieldRange, Inlining, RepresentationKind, SimpleDictShape, SlotClassifier, SlotMetadata,
};
pub use traits::{Generator, GeneratorError, GeneratorResult};
pub use type_map::PrimitiveType;
