//! Intermediate model handed from rendering to serialization

use super::slot_classifier::SlotMetadata;

/// One generated model class
#[derive(Debug, Clone, PartialEq)]
pub struct ModelClass {
    /// Generated class name
    pub name: String,
    /// Class name in the schema
    pub schema_name: String,
    pub description: Option<String>,
    /// Generated name of the `is_a` parent
    pub parent: Option<String>,
    pub mixins: Vec<String>,
    pub is_mixin: bool,
    /// Name of the identifier (or key) slot, if any
    pub identifier_key_slot: Option<String>,
    /// Fields not inherited from the parent
    pub fields: Vec<SlotMetadata>,
    /// Every field, inherited ones included
    pub all_fields: Vec<SlotMetadata>,
}

impl ModelClass {
    /// Look up a field by column name
    #[must_use]
    pub fn field(&self, field_name: &str) -> Option<&SlotMetadata> {
        self.all_fields.iter().find(|f| f.field_name == field_name)
    }

    /// Own fields whose column holds records validated by a nested model
    pub fn nested_fields(&self) -> impl Iterator<Item = &SlotMetadata> {
        self.fields
            .iter()
            .filter(|f| f.nested_representation().is_some())
    }

    /// Own fields with a minimum or maximum cardinality
    pub fn cardinality_fields(&self) -> impl Iterator<Item = &SlotMetadata> {
        self.fields.iter().filter(|f| f.has_cardinality())
    }

    /// Column name of the identifier field
    #[must_use]
    pub fn id_field_name(&self) -> Option<&str> {
        let id_slot = self.identifier_key_slot.as_deref()?;
        self.all_fields
            .iter()
            .find(|f| f.slot_name == id_slot)
            .map(|f| f.field_name.as_str())
    }
}

/// Every model class generated from one schema, parents first
#[derive(Debug, Clone, PartialEq)]
pub struct ModelDocument {
    /// Generated module name
    pub name: String,
    pub package: Option<String>,
    pub schema_name: String,
    pub schema_version: Option<String>,
    pub metamodel_version: Option<String>,
    pub classes: Vec<ModelClass>,
}

impl ModelDocument {
    /// Look up a class by generated name
    #[must_use]
    pub fn class(&self, name: &str) -> Option<&ModelClass> {
        self.classes.iter().find(|c| c.name == name)
    }
}
