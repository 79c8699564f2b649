//! Slot resolution across the class hierarchy

use linkml_core::{error::Result, types::SlotDefinition};
use std::collections::HashSet;

use super::view::{SchemaView, SchemaViewError};

/// Resolves the induced form of a slot for one class
///
/// Layering order, later wins: the slot's own `is_a` ancestors, the
/// schema-level slot, then for each class from the most distant ancestor
/// down to the class itself its attribute definition and its `slot_usage`.
pub struct SlotResolution<'a> {
    view: &'a SchemaView,
}

impl<'a> SlotResolution<'a> {
    #[must_use]
    pub fn new(view: &'a SchemaView) -> Self {
        Self { view }
    }

    /// Resolve `slot_name` in the context of `class_name`
    ///
    /// # Errors
    ///
    /// Returns `SchemaViewError::ElementNotFound` if neither the schema nor the
    /// class hierarchy declares the slot
    pub fn resolve_slot(&self, slot_name: &str, class_name: &str) -> Result<SlotDefinition> {
        let mut lineage = self.view.class_ancestors(class_name)?;
        lineage.reverse();
        lineage.push(class_name.to_string());

        let mut resolved = self.schema_level_slot(slot_name)?;

        for name in &lineage {
            let class = self.view.require_class(name)?;
            if let Some(attribute) = class.attributes.get(slot_name) {
                match resolved.as_mut() {
                    Some(slot) => slot.apply_usage(attribute),
                    None => resolved = Some(attribute.clone()),
                }
            }
            if let Some(usage) = class.slot_usage.get(slot_name)
                && let Some(slot) = resolved.as_mut()
            {
                slot.apply_usage(usage);
            }
        }

        let mut slot = resolved.ok_or_else(|| {
            SchemaViewError::ElementNotFound(format!("Slot '{slot_name}' in class '{class_name}'"))
        })?;
        slot.name = slot_name.to_string();
        Ok(slot)
    }

    /// The schema-level slot with its `is_a` parents folded in
    fn schema_level_slot(&self, slot_name: &str) -> Result<Option<SlotDefinition>> {
        let Some(slot) = self.view.get_slot(slot_name) else {
            return Ok(None);
        };

        let mut chain = vec![slot];
        let mut visited = HashSet::from([slot_name.to_string()]);
        let mut current = slot.is_a.as_deref();
        while let Some(parent_name) = current {
            if !visited.insert(parent_name.to_string()) {
                return Err(SchemaViewError::CircularDependency(format!(
                    "Slot '{slot_name}' inherits from '{parent_name}'"
                ))
                .into());
            }
            let Some(parent) = self.view.get_slot(parent_name) else {
                break;
            };
            chain.push(parent);
            current = parent.is_a.as_deref();
        }

        let mut resolved = SlotDefinition::default();
        for layer in chain.into_iter().rev() {
            resolved.apply_usage(layer);
        }
        resolved.is_a.clone_from(&slot.is_a);
        Ok(Some(resolved))
    }
}
