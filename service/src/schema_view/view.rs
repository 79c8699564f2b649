//! Main `SchemaView` API for schema introspection

use indexmap::IndexMap;
use linkml_core::{
    error::{LinkMLError, Result},
    types::{ClassDefinition, EnumDefinition, SchemaDefinition, SlotDefinition, TypeDefinition},
};
use once_cell::sync::Lazy;
use std::collections::HashSet;
use std::sync::Arc;

use super::navigation::SlotResolution;

/// Error type for `SchemaView` operations
#[derive(Debug, thiserror::Error)]
pub enum SchemaViewError {
    /// Element not found in schema
    #[error("Element not found: {0}")]
    ElementNotFound(String),

    /// Circular dependency detected in inheritance chain
    #[error("Circular dependency detected: {0}")]
    CircularDependency(String),
}

impl From<SchemaViewError> for LinkMLError {
    fn from(err: SchemaViewError) -> Self {
        LinkMLError::service(err.to_string())
    }
}

/// Types provided by the `linkml:types` import
static BUILTIN_TYPES: Lazy<IndexMap<String, TypeDefinition>> = Lazy::new(|| {
    [
        ("string", "xsd:string"),
        ("integer", "xsd:integer"),
        ("boolean", "xsd:boolean"),
        ("float", "xsd:float"),
        ("double", "xsd:double"),
        ("decimal", "xsd:decimal"),
        ("time", "xsd:time"),
        ("date", "xsd:date"),
        ("datetime", "xsd:dateTime"),
        ("uriorcurie", "xsd:anyURI"),
        ("curie", "xsd:string"),
        ("uri", "xsd:anyURI"),
        ("ncname", "xsd:string"),
        ("jsonpointer", "xsd:string"),
        ("jsonpath", "xsd:string"),
        ("sparqlpath", "xsd:string"),
    ]
    .into_iter()
    .map(|(name, uri)| {
        (
            name.to_string(),
            TypeDefinition {
                name: name.to_string(),
                uri: Some(uri.to_string()),
                ..Default::default()
            },
        )
    })
    .collect()
});

/// Read-only view of a `LinkML` schema
///
/// Cloning is cheap; the schema is shared.
#[derive(Clone, Debug)]
pub struct SchemaView {
    schema: Arc<SchemaDefinition>,

    /// Schema types layered over the built-in `linkml:types`
    types: Arc<IndexMap<String, TypeDefinition>>,
}

impl SchemaView {
    /// Create a new `SchemaView` from a schema definition
    #[must_use]
    pub fn new(schema: SchemaDefinition) -> Self {
        let mut types = BUILTIN_TYPES.clone();
        for (name, type_def) in &schema.types {
            types.insert(name.clone(), type_def.clone());
        }

        Self {
            schema: Arc::new(schema),
            types: Arc::new(types),
        }
    }

    /// The underlying schema
    #[must_use]
    pub fn schema(&self) -> &SchemaDefinition {
        &self.schema
    }

    // === Class Operations ===

    /// All classes in declaration order
    #[must_use]
    pub fn all_classes(&self) -> &IndexMap<String, ClassDefinition> {
        &self.schema.classes
    }

    /// Get a specific class definition
    #[must_use]
    pub fn get_class(&self, name: &str) -> Option<&ClassDefinition> {
        self.schema.classes.get(name)
    }

    /// Get a class definition or fail
    ///
    /// # Errors
    ///
    /// Returns `SchemaViewError::ElementNotFound` if the class is not declared
    pub fn require_class(&self, name: &str) -> Result<&ClassDefinition> {
        self.get_class(name)
            .ok_or_else(|| SchemaViewError::ElementNotFound(format!("Class '{name}'")).into())
    }

    /// Ancestors of a class: the `is_a` chain nearest first, then mixins
    ///
    /// # Errors
    ///
    /// Returns an error if the class is unknown or the hierarchy is circular
    pub fn class_ancestors(&self, name: &str) -> Result<Vec<String>> {
        let mut ancestors = Vec::new();
        let mut visited = HashSet::new();
        visited.insert(name.to_string());
        self.collect_class_ancestors(name, &mut ancestors, &mut visited)?;
        Ok(ancestors)
    }

    fn collect_class_ancestors(
        &self,
        name: &str,
        ancestors: &mut Vec<String>,
        visited: &mut HashSet<String>,
    ) -> Result<()> {
        let class = self.require_class(name)?;

        let parents = class.is_a.iter().chain(class.mixins.iter());
        for parent in parents {
            if !visited.insert(parent.clone()) {
                if ancestors.contains(parent) {
                    continue;
                }
                return Err(SchemaViewError::CircularDependency(format!(
                    "Class '{name}' inherits from '{parent}'"
                ))
                .into());
            }
            ancestors.push(parent.clone());
            self.collect_class_ancestors(parent, ancestors, visited)?;
        }

        Ok(())
    }

    /// All slot names applicable to a class: own slots and attributes first,
    /// then inherited ones, without duplicates
    ///
    /// # Errors
    ///
    /// Returns an error if the class or one of its ancestors is unknown
    pub fn class_slots(&self, class_name: &str) -> Result<Vec<String>> {
        let mut lineage = vec![class_name.to_string()];
        lineage.extend(self.class_ancestors(class_name)?);

        let mut seen = HashSet::new();
        let mut slots = Vec::new();
        for name in &lineage {
            let class = self.require_class(name)?;
            for slot_name in class.slots.iter().chain(class.attributes.keys()) {
                if seen.insert(slot_name.clone()) {
                    slots.push(slot_name.clone());
                }
            }
        }

        Ok(slots)
    }

    /// Get a fully resolved slot in the context of a specific class
    ///
    /// # Errors
    ///
    /// Returns `SchemaViewError::ElementNotFound` if the slot is not found
    pub fn induced_slot(&self, slot_name: &str, class_name: &str) -> Result<SlotDefinition> {
        SlotResolution::new(self).resolve_slot(slot_name, class_name)
    }

    /// The identifier slot of a class, falling back to its key slot
    ///
    /// # Errors
    ///
    /// Returns an error if the class cannot be resolved
    pub fn identifier_or_key_slot(&self, class_name: &str) -> Result<Option<SlotDefinition>> {
        let mut key_slot = None;
        for slot_name in self.class_slots(class_name)? {
            let slot = self.induced_slot(&slot_name, class_name)?;
            if slot.identifier.unwrap_or(false) {
                return Ok(Some(slot));
            }
            if key_slot.is_none() && slot.key.unwrap_or(false) {
                key_slot = Some(slot);
            }
        }
        Ok(key_slot)
    }

    // === Slot Operations ===

    /// Get a schema-level slot definition
    #[must_use]
    pub fn get_slot(&self, name: &str) -> Option<&SlotDefinition> {
        self.schema.slots.get(name)
    }

    // === Type and Enum Operations ===

    /// All types, built-ins included
    #[must_use]
    pub fn all_types(&self) -> &IndexMap<String, TypeDefinition> {
        &self.types
    }

    /// Get a type definition
    #[must_use]
    pub fn get_type(&self, name: &str) -> Option<&TypeDefinition> {
        self.types.get(name)
    }

    /// All enums in declaration order
    #[must_use]
    pub fn all_enums(&self) -> &IndexMap<String, EnumDefinition> {
        &self.schema.enums
    }

    /// Get an enum definition
    #[must_use]
    pub fn get_enum(&self, name: &str) -> Option<&EnumDefinition> {
        self.schema.enums.get(name)
    }

    /// The schema default range, or `string`
    #[must_use]
    pub fn default_range(&self) -> &str {
        self.schema.default_range.as_deref().unwrap_or("string")
    }

    /// Classes ordered so every parent precedes its children
    ///
    /// # Errors
    ///
    /// Returns an error if the hierarchy references unknown classes or is circular
    pub fn ordered_classes(&self) -> Result<Vec<String>> {
        let mut ordered = Vec::new();
        let mut placed = HashSet::new();
        for name in self.schema.classes.keys() {
            let mut lineage = self.class_ancestors(name)?;
            lineage.reverse();
            lineage.push(name.clone());
            for class_name in lineage {
                if placed.insert(class_name.clone()) {
                    ordered.push(class_name);
                }
            }
        }
        Ok(ordered)
    }
}
