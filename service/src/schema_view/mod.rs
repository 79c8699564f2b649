//! SchemaView - read-only introspection over a `LinkML` schema
//!
//! Resolves inheritance, attributes and `slot_usage` so generators can ask
//! for the induced form of a slot in the context of one class.

pub mod navigation;
pub mod view;

pub use navigation::SlotResolution;
pub use view::{SchemaView, SchemaViewError};
