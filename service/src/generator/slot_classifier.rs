//! Slot classification
//!
//! Decides, for every slot of a class, the column type it maps to and, for
//! class ranges, which physical representation the nested records take.

use linkml_core::{Value, types::SlotDefinition};
use std::collections::HashSet;
use std::fmt;
use tracing::debug;

use super::base::BaseCodeFormatter;
use super::traits::{GeneratorError, GeneratorResult};
use super::type_map::PrimitiveType;
use crate::frame::{DataType, list_of, untyped_struct};
use crate::schema_view::SchemaView;

/// `class_uri` marking the opaque "any" class
pub const LINKML_ANY_CURIE: &str = "linkml:Any";

/// How the records of a class-ranged slot are laid out in a column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RepresentationKind {
    /// Foreign key scalar; not validated as a nested record
    Reference,
    /// One embedded record per row
    NestedStruct,
    /// A sequence of embedded records per row
    NestedListStruct,
    /// Mapping from identifier to a scalar value or a partial record
    SimpleDict,
    /// Mapping from identifier to a full record
    CollectionStruct,
}

impl RepresentationKind {
    /// Whether the column carries records validated by a nested model
    #[must_use]
    pub fn is_nested(self) -> bool {
        !matches!(self, Self::Reference)
    }

    /// Label recorded in the generated `_INLINE_FORM` table
    #[must_use]
    pub fn inline_form(self) -> &'static str {
        match self {
            Self::Reference => "not_inline",
            Self::NestedStruct => "inlined_dict",
            Self::NestedListStruct => "inlined_list_dict",
            Self::SimpleDict => "simple_dict",
            Self::CollectionStruct => "collection_dict",
        }
    }

    /// Name of the validator helper the generated check delegates to
    #[must_use]
    pub fn check_helper(self) -> Option<&'static str> {
        match self {
            Self::Reference => None,
            Self::NestedStruct => Some("_check_nested_struct"),
            Self::NestedListStruct => Some("_check_nested_list_struct"),
            Self::SimpleDict => Some("_check_simple_dict"),
            Self::CollectionStruct => Some("_check_collection_struct"),
        }
    }
}

impl fmt::Display for RepresentationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Reference => "reference",
            Self::NestedStruct => "nested_struct",
            Self::NestedListStruct => "nested_list_struct",
            Self::SimpleDict => "simple_dict",
            Self::CollectionStruct => "collection_struct",
        };
        f.write_str(label)
    }
}

/// Inlining mode declared on a slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Inlining {
    #[default]
    None,
    Inlined,
    InlinedAsList,
}

/// Field names of a simple dict entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimpleDictShape {
    /// Receives the mapping key
    pub id_field: String,
    /// Receives a scalar mapping value
    pub other_field: String,
}

/// Resolved range of a field
#[derive(Debug, Clone, PartialEq)]
pub enum FieldRange {
    Primitive(PrimitiveType),
    /// Enumeration with its permissible values
    Enum(Vec<String>),
    /// Opaque object column
    Object,
    /// Inlined record or list of records
    Struct,
    /// Identifier of a referenced class
    ForeignKey {
        class: String,
        id_type: PrimitiveType,
    },
    List(Box<FieldRange>),
}

impl FieldRange {
    /// Structural column type of the range
    #[must_use]
    pub fn data_type(&self) -> DataType {
        match self {
            Self::Primitive(p) | Self::ForeignKey { id_type: p, .. } => p.data_type(),
            // permissible values are an `isin` check on the string column
            Self::Enum(_) => DataType::String,
            // opaque values are held as their JSON bytes
            Self::Object => DataType::Binary,
            Self::Struct => untyped_struct(),
            Self::List(inner) => list_of(inner.data_type()),
        }
    }
}

/// Everything the generator and runtime need to know about one slot of one class
#[derive(Debug, Clone, PartialEq)]
pub struct SlotMetadata {
    pub slot_name: String,
    /// Column name; the slot alias when declared
    pub field_name: String,
    pub owner: String,
    pub declared_range: Option<String>,
    pub range: FieldRange,
    pub multivalued: bool,
    pub inlining: Inlining,
    pub required: bool,
    pub identifier: bool,
    pub minimum_cardinality: Option<u64>,
    pub maximum_cardinality: Option<u64>,
    pub minimum_value: Option<Value>,
    pub maximum_value: Option<Value>,
    pub pattern: Option<String>,
    pub description: Option<String>,
    /// Set for every class range except the opaque "any" class
    pub representation: Option<RepresentationKind>,
    /// Schema name of the referenced class
    pub reference_class: Option<String>,
    pub simple_dict: Option<SimpleDictShape>,
}

impl SlotMetadata {
    /// Nested representation, if the column holds records to validate
    #[must_use]
    pub fn nested_representation(&self) -> Option<RepresentationKind> {
        self.representation.filter(|kind| kind.is_nested())
    }

    /// Generated model name of the referenced class
    #[must_use]
    pub fn reference_model(&self) -> Option<String> {
        self.reference_class
            .as_deref()
            .map(BaseCodeFormatter::to_pascal_case)
    }

    /// Permissible values of an enum range, possibly list-wrapped
    #[must_use]
    pub fn permissible_values(&self) -> Option<&[String]> {
        match &self.range {
            FieldRange::Enum(values) => Some(values),
            FieldRange::List(inner) => match inner.as_ref() {
                FieldRange::Enum(values) => Some(values),
                _ => None,
            },
            _ => None,
        }
    }

    /// Whether the cardinality check applies
    #[must_use]
    pub fn has_cardinality(&self) -> bool {
        self.minimum_cardinality.is_some() || self.maximum_cardinality.is_some()
    }

    /// Name of the nested validation check on this column
    #[must_use]
    pub fn nested_check_name(&self) -> Option<String> {
        self.nested_representation()
            .map(|kind| format!("check_{kind}_{}", self.field_name))
    }

    /// Name of the table-level cardinality check on this column
    #[must_use]
    pub fn cardinality_check_name(&self) -> String {
        format!("check_cardinality_{}", self.field_name)
    }
}

/// Column name of a slot
fn field_name(slot: &SlotDefinition) -> String {
    slot.alias.clone().unwrap_or_else(|| slot.name.clone())
}

/// Classifies slots against a schema
pub struct SlotClassifier<'a> {
    view: &'a SchemaView,
}

impl<'a> SlotClassifier<'a> {
    #[must_use]
    pub fn new(view: &'a SchemaView) -> Self {
        Self { view }
    }

    /// Classify every slot of a class, in `class_slots` order
    ///
    /// # Errors
    ///
    /// Returns the first classification error
    pub fn classify_class(&self, class_name: &str) -> GeneratorResult<Vec<SlotMetadata>> {
        self.view
            .class_slots(class_name)?
            .iter()
            .map(|slot_name| self.classify(class_name, slot_name))
            .collect()
    }

    /// Classify one slot in the context of its owning class
    ///
    /// # Errors
    ///
    /// Returns `GeneratorError::Classification` if the range is unknown or a
    /// type range cannot be mapped to a column type
    pub fn classify(&self, class_name: &str, slot_name: &str) -> GeneratorResult<SlotMetadata> {
        let slot = self.view.induced_slot(slot_name, class_name)?;
        let range_name = slot
            .range
            .clone()
            .unwrap_or_else(|| self.view.default_range().to_string());

        let multivalued = slot.multivalued.unwrap_or(false);
        let inlining = if slot.inlined_as_list.unwrap_or(false) {
            Inlining::InlinedAsList
        } else if slot.inlined.unwrap_or(false) {
            Inlining::Inlined
        } else {
            Inlining::None
        };

        let mut representation = None;
        let mut reference_class = None;
        let mut simple_dict = None;

        let range = if let Some(class) = self.view.get_class(&range_name) {
            if class.class_uri.as_deref() == Some(LINKML_ANY_CURIE) {
                FieldRange::Object
            } else {
                reference_class = Some(range_name.clone());
                let (kind, shape) = self.class_representation(&range_name, multivalued, inlining)?;
                simple_dict = shape;
                representation = Some(kind);
                match kind {
                    RepresentationKind::Reference => FieldRange::ForeignKey {
                        class: BaseCodeFormatter::to_pascal_case(&range_name),
                        id_type: self.identifier_type(&range_name),
                    },
                    RepresentationKind::NestedStruct | RepresentationKind::NestedListStruct => {
                        FieldRange::Struct
                    }
                    RepresentationKind::SimpleDict | RepresentationKind::CollectionStruct => {
                        FieldRange::Object
                    }
                }
            }
        } else if self.view.get_type(&range_name).is_some() {
            FieldRange::Primitive(self.resolve_type(&range_name).ok_or_else(|| {
                GeneratorError::classification(
                    class_name,
                    slot_name,
                    format!("type '{range_name}' cannot be mapped to a column type"),
                )
            })?)
        } else if let Some(enum_def) = self.view.get_enum(&range_name) {
            FieldRange::Enum(
                enum_def
                    .permissible_values
                    .iter()
                    .map(|pv| pv.text().to_string())
                    .collect(),
            )
        } else {
            return Err(GeneratorError::classification(
                class_name,
                slot_name,
                format!("unknown range '{range_name}'"),
            ));
        };

        let range = if multivalued
            && inlining == Inlining::InlinedAsList
            && !matches!(range, FieldRange::Struct)
        {
            FieldRange::List(Box::new(range))
        } else {
            range
        };

        debug!(
            class = class_name,
            slot = slot_name,
            range = %range_name,
            representation = ?representation,
            "classified slot"
        );

        Ok(SlotMetadata {
            slot_name: slot_name.to_string(),
            field_name: field_name(&slot),
            owner: class_name.to_string(),
            declared_range: slot.range.clone(),
            range,
            multivalued,
            inlining,
            required: slot.required.unwrap_or(false),
            identifier: slot.is_identifier_or_key(),
            minimum_cardinality: slot.minimum_cardinality,
            maximum_cardinality: slot.maximum_cardinality,
            minimum_value: slot.minimum_value,
            maximum_value: slot.maximum_value,
            pattern: slot.pattern,
            description: slot.description,
            representation,
            reference_class,
            simple_dict,
        })
    }

    /// Representation of a class range given the slot's inlining flags
    fn class_representation(
        &self,
        range_class: &str,
        multivalued: bool,
        inlining: Inlining,
    ) -> GeneratorResult<(RepresentationKind, Option<SimpleDictShape>)> {
        Ok(match inlining {
            Inlining::None => (RepresentationKind::Reference, None),
            Inlining::InlinedAsList if multivalued => (RepresentationKind::NestedListStruct, None),
            Inlining::InlinedAsList => (RepresentationKind::NestedStruct, None),
            Inlining::Inlined => {
                if let Some(shape) = self.collapsible_value_slot(range_class)? {
                    (RepresentationKind::SimpleDict, Some(shape))
                } else if !multivalued {
                    (RepresentationKind::NestedStruct, None)
                } else if self.view.identifier_or_key_slot(range_class)?.is_some() {
                    (RepresentationKind::CollectionStruct, None)
                } else {
                    // records without an identifier can only be inlined as a list
                    (RepresentationKind::NestedListStruct, None)
                }
            }
        })
    }

    /// The id/value field pair when a class collapses to a simple dict
    ///
    /// The class must have an identifier or key slot and either exactly one
    /// other slot or exactly one other required slot.
    ///
    /// # Errors
    ///
    /// Returns an error if the class hierarchy cannot be resolved
    pub fn collapsible_value_slot(&self, class_name: &str) -> GeneratorResult<Option<SimpleDictShape>> {
        let Some(id_slot) = self.view.identifier_or_key_slot(class_name)? else {
            return Ok(None);
        };

        let others = self
            .view
            .class_slots(class_name)?
            .iter()
            .filter(|name| **name != id_slot.name)
            .map(|name| self.view.induced_slot(name, class_name))
            .collect::<linkml_core::Result<Vec<_>>>()?;

        let value_slot = if let [only] = others.as_slice() {
            Some(only)
        } else {
            let mut required = others.iter().filter(|s| s.required.unwrap_or(false));
            match (required.next(), required.next()) {
                (Some(only), None) => Some(only),
                _ => None,
            }
        };

        Ok(value_slot.map(|value| SimpleDictShape {
            id_field: field_name(&id_slot),
            other_field: field_name(value),
        }))
    }

    /// Follow `uri` and `typeof` until a mapped type URI is found
    fn resolve_type(&self, type_name: &str) -> Option<PrimitiveType> {
        let mut visited = HashSet::new();
        let mut current = type_name;
        loop {
            if !visited.insert(current.to_string()) {
                return None;
            }
            let type_def = self.view.get_type(current)?;
            if let Some(primitive) = type_def.uri.as_deref().and_then(PrimitiveType::from_uri) {
                return Some(primitive);
            }
            current = type_def.base_type.as_deref()?;
        }
    }

    /// Column type of a class's identifier; strings when it has none
    fn identifier_type(&self, class_name: &str) -> PrimitiveType {
        self.view
            .identifier_or_key_slot(class_name)
            .ok()
            .flatten()
            .map(|slot| {
                slot.range
                    .unwrap_or_else(|| self.view.default_range().to_string())
            })
            .and_then(|range| self.resolve_type(&range))
            .unwrap_or(PrimitiveType::String)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{SchemaParser, YamlParser};
    use pretty_assertions::assert_eq;

    const SCHEMA: &str = r"
id: https://example.org/classify
name: classify
default_range: string
types:
  Zip:
    typeof: string
  Weird:
    uri: ex:Weird
classes:
  AnyType:
    class_uri: linkml:Any
  Tag:
    attributes:
      id:
        identifier: true
      other:
        range: integer
  Wide:
    attributes:
      id:
        identifier: true
      a:
        range: integer
        required: true
      b:
        range: string
      c:
        range: string
  Point:
    attributes:
      id:
        identifier: true
        range: integer
      x:
        range: integer
        required: true
      y:
        range: integer
        required: true
  Anon:
    attributes:
      x:
        range: integer
  Table:
    attributes:
      plain: {}
      zip:
        range: Zip
      weird:
        range: Weird
      missing:
        range: Nowhere
      ints:
        range: integer
        multivalued: true
        inlined_as_list: true
      ints_not_listed:
        range: integer
        multivalued: true
      anything:
        range: AnyType
      point_ref:
        range: Point
      point_struct:
        range: Point
        inlined_as_list: true
      point_list:
        range: Point
        multivalued: true
        inlined_as_list: true
      point_dict:
        range: Point
        multivalued: true
        inlined: true
      single_point:
        range: Point
        inlined: true
      tags:
        range: Tag
        multivalued: true
        inlined: true
      wides:
        range: Wide
        multivalued: true
        inlined: true
      anons:
        range: Anon
        multivalued: true
        inlined: true
      renamed:
        alias: new_name
        range: integer
";

    fn view() -> SchemaView {
        SchemaView::new(YamlParser::new().parse_str(SCHEMA).expect("schema should parse"))
    }

    fn classify(slot: &str) -> GeneratorResult<SlotMetadata> {
        SlotClassifier::new(&view()).classify("Table", slot)
    }

    #[test]
    fn test_scalar_ranges() -> GeneratorResult<()> {
        assert_eq!(classify("plain")?.range, FieldRange::Primitive(PrimitiveType::String));
        assert_eq!(classify("zip")?.range, FieldRange::Primitive(PrimitiveType::String));
        assert_eq!(classify("anything")?.range, FieldRange::Object);
        assert_eq!(classify("anything")?.representation, None);
        assert_eq!(classify("renamed")?.field_name, "new_name");
        Ok(())
    }

    #[test]
    fn test_unmappable_and_unknown_ranges_fail() {
        assert!(matches!(
            classify("weird"),
            Err(GeneratorError::Classification { .. })
        ));
        assert!(matches!(
            classify("missing"),
            Err(GeneratorError::Classification { .. })
        ));
    }

    #[test]
    fn test_multivalued_wrapping() -> GeneratorResult<()> {
        assert_eq!(
            classify("ints")?.range,
            FieldRange::List(Box::new(FieldRange::Primitive(PrimitiveType::Integer)))
        );
        assert_eq!(
            classify("ints_not_listed")?.range,
            FieldRange::Primitive(PrimitiveType::Integer)
        );
        assert_eq!(classify("point_list")?.range, FieldRange::Struct);
        Ok(())
    }

    #[test]
    fn test_class_representations() -> GeneratorResult<()> {
        let reference = classify("point_ref")?;
        assert_eq!(reference.representation, Some(RepresentationKind::Reference));
        assert_eq!(
            reference.range,
            FieldRange::ForeignKey {
                class: "Point".to_string(),
                id_type: PrimitiveType::Integer
            }
        );
        assert_eq!(reference.nested_representation(), None);

        let cases = [
            ("point_struct", RepresentationKind::NestedStruct),
            ("point_list", RepresentationKind::NestedListStruct),
            ("point_dict", RepresentationKind::CollectionStruct),
            ("single_point", RepresentationKind::NestedStruct),
            ("tags", RepresentationKind::SimpleDict),
            ("wides", RepresentationKind::SimpleDict),
            ("anons", RepresentationKind::NestedListStruct),
        ];
        for (slot, expected) in cases {
            assert_eq!(classify(slot)?.representation, Some(expected), "slot {slot}");
        }
        Ok(())
    }

    #[test]
    fn test_simple_dict_shape() -> GeneratorResult<()> {
        let tags = classify("tags")?;
        assert_eq!(
            tags.simple_dict,
            Some(SimpleDictShape {
                id_field: "id".to_string(),
                other_field: "other".to_string()
            })
        );
        assert_eq!(tags.reference_model().as_deref(), Some("Tag"));

        let wides = classify("wides")?;
        assert_eq!(wides.simple_dict.map(|s| s.other_field), Some("a".to_string()));
        Ok(())
    }
}
