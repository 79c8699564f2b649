//! Core type definitions for LinkML schemas

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Schema definition - the root of a `LinkML` schema
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SchemaDefinition {
    /// Unique identifier for the schema
    #[serde(default)]
    pub id: String,

    /// Name of the schema
    #[serde(default)]
    pub name: String,

    /// Human-readable title
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// Description of the schema
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Version of the schema
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    /// Default prefix for the schema
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_prefix: Option<String>,

    /// Prefix declarations
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub prefixes: IndexMap<String, PrefixDefinition>,

    /// Import statements
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub imports: Vec<String>,

    /// Class definitions
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub classes: IndexMap<String, ClassDefinition>,

    /// Slot definitions
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub slots: IndexMap<String, SlotDefinition>,

    /// Type definitions
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub types: IndexMap<String, TypeDefinition>,

    /// Enum definitions
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub enums: IndexMap<String, EnumDefinition>,

    /// Default range for slots
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_range: Option<String>,

    /// Metamodel version
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metamodel_version: Option<String>,
}

impl SchemaDefinition {
    /// Fill empty element names from the keys they are declared under.
    ///
    /// `LinkML` YAML normally omits `name:` inside a class, slot, type or enum
    /// block; the map key is the name.
    pub fn fill_names(&mut self) {
        for (name, class) in &mut self.classes {
            if class.name.is_empty() {
                class.name.clone_from(name);
            }
            for (attr_name, attr) in &mut class.attributes {
                if attr.name.is_empty() {
                    attr.name.clone_from(attr_name);
                }
            }
            for (usage_name, usage) in &mut class.slot_usage {
                if usage.name.is_empty() {
                    usage.name.clone_from(usage_name);
                }
            }
        }
        for (name, slot) in &mut self.slots {
            if slot.name.is_empty() {
                slot.name.clone_from(name);
            }
        }
        for (name, type_def) in &mut self.types {
            if type_def.name.is_empty() {
                type_def.name.clone_from(name);
            }
        }
        for (name, enum_def) in &mut self.enums {
            if enum_def.name.is_empty() {
                enum_def.name.clone_from(name);
            }
        }
    }
}

/// Class definition
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ClassDefinition {
    /// Name of the class
    #[serde(default)]
    pub name: String,

    /// Description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Is this class abstract?
    #[serde(rename = "abstract", skip_serializing_if = "Option::is_none")]
    pub abstract_: Option<bool>,

    /// Is this a mixin?
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mixin: Option<bool>,

    /// Parent class (single inheritance)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_a: Option<String>,

    /// Mixin classes
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub mixins: Vec<String>,

    /// Slots used by this class
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub slots: Vec<String>,

    /// Slot usage overrides
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub slot_usage: IndexMap<String, SlotDefinition>,

    /// Attributes (inline slots)
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub attributes: IndexMap<String, SlotDefinition>,

    /// Class URI
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class_uri: Option<String>,

    /// Tree root flag
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tree_root: Option<bool>,
}

/// Slot definition
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SlotDefinition {
    /// Name of the slot
    #[serde(default)]
    pub name: String,

    /// Description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Range (type) of the slot
    #[serde(skip_serializing_if = "Option::is_none")]
    pub range: Option<String>,

    /// Is this slot required?
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required: Option<bool>,

    /// Is this slot multivalued?
    #[serde(skip_serializing_if = "Option::is_none")]
    pub multivalued: Option<bool>,

    /// Is this slot an identifier?
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identifier: Option<bool>,

    /// Is this slot a key (unique within its container)?
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<bool>,

    /// Alternative name used for the generated field
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,

    /// Pattern for validation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,

    /// Minimum value
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minimum_value: Option<Value>,

    /// Maximum value
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maximum_value: Option<Value>,

    /// Minimum number of occurrences per value
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minimum_cardinality: Option<u64>,

    /// Maximum number of occurrences per value
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maximum_cardinality: Option<u64>,

    /// Is inherited (`is_a`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_a: Option<String>,

    /// Is this slot inlined?
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inlined: Option<bool>,

    /// Is this slot inlined as list?
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inlined_as_list: Option<bool>,
}

impl SlotDefinition {
    /// Overlay every property set on `usage` onto this slot
    pub fn apply_usage(&mut self, usage: &SlotDefinition) {
        macro_rules! overlay {
            ($($field:ident),* $(,)?) => {
                $(
                    if usage.$field.is_some() {
                        self.$field.clone_from(&usage.$field);
                    }
                )*
            };
        }

        overlay!(
            description,
            range,
            required,
            multivalued,
            identifier,
            key,
            alias,
            pattern,
            minimum_value,
            maximum_value,
            minimum_cardinality,
            maximum_cardinality,
            inlined,
            inlined_as_list,
        );
    }

    /// Whether the slot identifies or keys its owning class
    #[must_use]
    pub fn is_identifier_or_key(&self) -> bool {
        self.identifier.unwrap_or(false) || self.key.unwrap_or(false)
    }
}

/// Type definition
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TypeDefinition {
    /// Name of the type
    #[serde(default)]
    pub name: String,

    /// Description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Base type
    #[serde(skip_serializing_if = "Option::is_none", rename = "typeof")]
    pub base_type: Option<String>,

    /// Type URI
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,

    /// Pattern constraint
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
}

/// Enum definition
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct EnumDefinition {
    /// Name of the enum
    #[serde(default)]
    pub name: String,

    /// Description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Permissible values
    #[serde(
        default,
        skip_serializing_if = "Vec::is_empty",
        deserialize_with = "deserialize_permissible_values"
    )]
    pub permissible_values: Vec<PermissibleValue>,
}

/// Permissible value metadata
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PermissibleValueMetadata {
    /// Description of this permissible value
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Meaning URI
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meaning: Option<String>,
}

/// Permissible value
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum PermissibleValue {
    /// Simple string value
    Simple(String),
    /// Complex value with metadata
    Complex {
        text: String,
        /// Description
        #[serde(skip_serializing_if = "Option::is_none")]
        description: Option<String>,
        /// Meaning URI
        #[serde(skip_serializing_if = "Option::is_none")]
        meaning: Option<String>,
    },
}

impl PermissibleValue {
    /// The literal text of the value
    #[must_use]
    pub fn text(&self) -> &str {
        match self {
            Self::Simple(text) | Self::Complex { text, .. } => text,
        }
    }
}

/// Prefix definition
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum PrefixDefinition {
    /// Simple string expansion
    Simple(String),
    /// Complex prefix with reference
    Complex {
        /// Prefix expansion
        prefix_prefix: String,
        /// Reference URL
        #[serde(skip_serializing_if = "Option::is_none")]
        prefix_reference: Option<String>,
    },
}

/// Body of a permissible value in map form: `null`, a bare meaning CURIE, or
/// a metadata block
#[derive(Deserialize)]
#[serde(untagged)]
enum PermissibleValueBody {
    Meaning(String),
    Metadata(PermissibleValueMetadata),
}

fn deserialize_permissible_values<'de, D>(
    deserializer: D,
) -> std::result::Result<Vec<PermissibleValue>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::{self, Visitor};

    struct PermissibleValuesVisitor;

    impl<'de> Visitor<'de> for PermissibleValuesVisitor {
        type Value = Vec<PermissibleValue>;

        fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
            formatter.write_str("a sequence or map of permissible values")
        }

        fn visit_seq<A>(self, mut seq: A) -> std::result::Result<Vec<PermissibleValue>, A::Error>
        where
            A: de::SeqAccess<'de>,
        {
            let mut values = Vec::new();
            while let Some(value) = seq.next_element::<PermissibleValue>()? {
                values.push(value);
            }
            Ok(values)
        }

        // { "value1": null, "value2": "ex:0001", "value3": { "description": "..." } }
        fn visit_map<M>(self, mut map: M) -> std::result::Result<Vec<PermissibleValue>, M::Error>
        where
            M: de::MapAccess<'de>,
        {
            let mut values = Vec::new();
            while let Some((key, value)) = map.next_entry::<String, Option<PermissibleValueBody>>()? {
                let pv = match value {
                    None => PermissibleValue::Simple(key),
                    Some(PermissibleValueBody::Meaning(meaning)) => PermissibleValue::Complex {
                        text: key,
                        description: None,
                        meaning: Some(meaning),
                    },
                    Some(PermissibleValueBody::Metadata(metadata)) => PermissibleValue::Complex {
                        text: key,
                        description: metadata.description,
                        meaning: metadata.meaning,
                    },
                };
                values.push(pv);
            }
            Ok(values)
        }
    }

    deserializer.deserialize_any(PermissibleValuesVisitor)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_permissible_values_map_forms() -> crate::Result<()> {
        let yaml = r"
name: SyntheticEnumOnt
permissible_values:
  fiction: ex:000001
  non fiction:
    meaning: ex:000002
  other:
";
        let enum_def: EnumDefinition = serde_yaml::from_str(yaml)?;
        let texts: Vec<&str> = enum_def
            .permissible_values
            .iter()
            .map(PermissibleValue::text)
            .collect();
        assert_eq!(texts, vec!["fiction", "non fiction", "other"]);
        assert!(matches!(
            &enum_def.permissible_values[0],
            PermissibleValue::Complex { meaning: Some(m), .. } if m == "ex:000001"
        ));
        Ok(())
    }

    #[test]
    fn test_fill_names_from_keys() -> crate::Result<()> {
        let yaml = r"
id: https://example.org/test
name: test
classes:
  Person:
    attributes:
      age:
        range: integer
enums:
  Color:
    permissible_values: [red, green]
";
        let mut schema: SchemaDefinition = serde_yaml::from_str(yaml)?;
        schema.fill_names();
        assert_eq!(schema.classes["Person"].name, "Person");
        assert_eq!(schema.classes["Person"].attributes["age"].name, "age");
        assert_eq!(schema.enums["Color"].name, "Color");
        Ok(())
    }

    #[test]
    fn test_apply_usage_overlays_only_set_fields() {
        let mut slot = SlotDefinition {
            name: "friend".to_string(),
            range: Some("Person".to_string()),
            required: Some(false),
            ..Default::default()
        };
        let usage = SlotDefinition {
            required: Some(true),
            inlined_as_list: Some(true),
            ..Default::default()
        };
        slot.apply_usage(&usage);
        assert_eq!(slot.range.as_deref(), Some("Person"));
        assert_eq!(slot.required, Some(true));
        assert_eq!(slot.inlined_as_list, Some(true));
        assert_eq!(slot.name, "friend");
    }
}
