//! Projection of model classes onto columnar schemas
//!
//! The structural schema depends only on the model. The instance-aware
//! schema additionally follows a sample record: optional fields absent from
//! the sample are left out and nested structs are typed from the nested
//! sample values.

use indexmap::IndexMap;
use linkml_core::Value;
use tracing::debug;

use super::document::{ModelClass, ModelDocument};
use super::slot_classifier::{RepresentationKind, SlotMetadata};
use super::traits::{GeneratorError, GeneratorResult};
use crate::frame::{ColumnSchema, DataType, list_of, struct_of, untyped_struct};

/// Column type of a field without looking at data
///
/// Simple dict and collection columns stay opaque; they are normalized at
/// validation time.
#[must_use]
pub fn structural_type(field: &SlotMetadata) -> DataType {
    match field.nested_representation() {
        Some(RepresentationKind::SimpleDict | RepresentationKind::CollectionStruct) => {
            DataType::Binary
        }
        Some(RepresentationKind::NestedStruct) => untyped_struct(),
        Some(RepresentationKind::NestedListStruct) => list_of(untyped_struct()),
        Some(RepresentationKind::Reference) | None => field.range.data_type(),
    }
}

/// Flat struct of every field's structural type
#[must_use]
pub fn simple_struct(fields: &[SlotMetadata]) -> DataType {
    struct_of(
        fields
            .iter()
            .map(|f| (f.field_name.clone(), structural_type(f))),
    )
}

/// Projects the classes of a model document
pub struct SchemaProjector<'a> {
    document: &'a ModelDocument,
}

impl<'a> SchemaProjector<'a> {
    #[must_use]
    pub fn new(document: &'a ModelDocument) -> Self {
        Self { document }
    }

    fn model(&self, name: &str) -> GeneratorResult<&'a ModelClass> {
        self.document
            .class(name)
            .ok_or_else(|| GeneratorError::Generation(format!("Unknown model class '{name}'")))
    }

    /// Flat struct type of a class, see [`simple_struct`]
    ///
    /// # Errors
    ///
    /// Returns an error if the class is not part of the document
    pub fn simple_struct(&self, class_name: &str) -> GeneratorResult<DataType> {
        Ok(simple_struct(&self.model(class_name)?.all_fields))
    }

    /// Column schema of a class
    ///
    /// A list sample is projected against its first element.
    ///
    /// # Errors
    ///
    /// Returns an error if the class or a nested class is not part of the document
    pub fn project(
        &self,
        class_name: &str,
        sample: Option<&Value>,
        instance_aware: bool,
    ) -> GeneratorResult<ColumnSchema> {
        let model = self.model(class_name)?;
        let sample = match sample {
            Some(Value::Array(items)) => items.first(),
            other => other,
        };
        let record = sample.and_then(Value::as_object);

        let mut schema = IndexMap::with_capacity(model.all_fields.len());
        for field in &model.all_fields {
            let nested_sample = record.and_then(|r| r.get(&field.field_name));
            if instance_aware && !field.required && nested_sample.is_none() {
                continue;
            }

            let dtype = if instance_aware {
                self.instance_type(field, nested_sample)?
            } else {
                structural_type(field)
            };
            schema.insert(field.field_name.clone(), dtype);
        }

        debug!(class = class_name, instance_aware, columns = schema.len(), "projected schema");
        Ok(schema)
    }

    fn instance_type(&self, field: &SlotMetadata, sample: Option<&Value>) -> GeneratorResult<DataType> {
        let nested_model = field.reference_model();
        Ok(match (field.nested_representation(), nested_model) {
            (Some(RepresentationKind::NestedStruct), Some(model)) => match sample {
                Some(value @ Value::Object(_)) => {
                    struct_of(self.project(&model, Some(value), true)?)
                }
                _ => untyped_struct(),
            },
            (Some(RepresentationKind::NestedListStruct), Some(model)) => {
                match sample.and_then(Value::as_array).and_then(|items| items.first()) {
                    Some(first @ Value::Object(_)) => {
                        list_of(struct_of(self.project(&model, Some(first), true)?))
                    }
                    _ => list_of(untyped_struct()),
                }
            }
            _ => structural_type(field),
        })
    }
}
