//! Pandera model generator
//!
//! Renders a schema into a [`ModelDocument`] and serializes it with one of
//! three templates: Pandera `DataFrameModel` classes for Polars, plain
//! `polars` schemas or `pyarrow` schemas.

use linkml_core::prelude::*;
use std::collections::HashSet;
use std::fmt::Write;
use tracing::info;

use super::base::BaseCodeFormatter;
use super::document::{ModelClass, ModelDocument};
use super::slot_classifier::{FieldRange, RepresentationKind, SlotClassifier, SlotMetadata};
use super::traits::{Generator, GeneratorResult};
use crate::schema_view::SchemaView;

/// Module the generated classes import their validator mixin from
const VALIDATOR_MODULE: &str = "linkml.generators.panderagen.linkml_pandera_validator";

/// Pandera generator
pub struct PanderaGenerator {
    name: String,
    description: String,
    config: GenerationConfig,
}

impl Default for PanderaGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl PanderaGenerator {
    /// Create a generator with the default configuration
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(GenerationConfig::default())
    }

    /// Create a generator with a custom configuration
    #[must_use]
    pub fn with_config(config: GenerationConfig) -> Self {
        Self {
            name: "pandera".to_string(),
            description: "Generate Pandera dataframe models for Polars from LinkML schemas"
                .to_string(),
            config,
        }
    }

    #[must_use]
    pub fn config(&self) -> &GenerationConfig {
        &self.config
    }

    /// Classify every class of a schema, parents before children
    ///
    /// # Errors
    ///
    /// Returns `GeneratorError::Classification` for the first slot whose range
    /// cannot be resolved, or an error if the class hierarchy is broken
    pub fn render(&self, schema: &SchemaDefinition) -> GeneratorResult<ModelDocument> {
        let view = SchemaView::new(schema.clone());
        let classifier = SlotClassifier::new(&view);

        let mut classes = Vec::new();
        for class_name in view.ordered_classes()? {
            let class = view.require_class(&class_name)?;
            let parent_slots = match &class.is_a {
                Some(parent) => view.class_slots(parent)?,
                None => Vec::new(),
            };

            let all_fields = classifier.classify_class(&class_name)?;
            let fields = all_fields
                .iter()
                .filter(|f| !parent_slots.contains(&f.slot_name))
                .cloned()
                .collect();

            classes.push(ModelClass {
                name: BaseCodeFormatter::to_pascal_case(&class_name),
                schema_name: class_name.clone(),
                description: class.description.clone(),
                parent: class.is_a.as_deref().map(BaseCodeFormatter::to_pascal_case),
                mixins: class.mixins.clone(),
                is_mixin: class.mixin.unwrap_or(false),
                identifier_key_slot: view.identifier_or_key_slot(&class_name)?.map(|s| s.name),
                fields,
                all_fields,
            });
        }

        info!(schema = %schema.name, classes = classes.len(), "rendered model document");

        Ok(ModelDocument {
            name: BaseCodeFormatter::to_pascal_case(&schema.name),
            package: self.config.package.clone(),
            schema_name: schema.name.clone(),
            schema_version: schema.version.clone(),
            metamodel_version: schema.metamodel_version.clone(),
            classes,
        })
    }

    /// Serialize a rendered document with the configured template
    ///
    /// # Errors
    ///
    /// Returns an error if writing the output fails
    pub fn serialize(&self, document: &ModelDocument) -> GeneratorResult<String> {
        let mut out = String::new();
        self.write_header(&mut out, document)?;

        match self.config.template {
            TemplateKind::ClassBased => self.write_class_based(&mut out, document)?,
            TemplateKind::PolarsSchema => Self::write_polars_schema(&mut out, document)?,
            TemplateKind::ArrowSchema => Self::write_arrow_schema(&mut out, document)?,
        }

        Ok(out)
    }

    fn write_header(&self, out: &mut String, doc: &ModelDocument) -> GeneratorResult<()> {
        writeln!(
            out,
            "# Auto generated from {} by gen-pandera ({})",
            doc.schema_name, self.config.template
        )?;
        if self.config.emit_metadata {
            writeln!(
                out,
                "# metamodel_version: {}",
                doc.metamodel_version.as_deref().unwrap_or("None")
            )?;
            writeln!(
                out,
                "# version: {}",
                doc.schema_version.as_deref().unwrap_or("None")
            )?;
        }
        if let Some(package) = &doc.package {
            writeln!(out, "# package: {package}")?;
        }
        writeln!(out)?;
        Ok(())
    }

    // === Class based template ===

    fn write_class_based(&self, out: &mut String, doc: &ModelDocument) -> GeneratorResult<()> {
        writeln!(out, "from typing import Optional")?;
        writeln!(out)?;
        writeln!(out, "import pandera.polars as pla")?;
        writeln!(out, "import polars as pl")?;
        writeln!(out, "from pandera.api.polars.types import PolarsData")?;
        writeln!(
            out,
            "from pandera.engines.polars_engine import Date, DateTime, Object, Time"
        )?;
        writeln!(out)?;
        writeln!(out, "from {VALIDATOR_MODULE} import LinkmlPanderaValidator")?;
        writeln!(out)?;
        writeln!(out)?;

        writeln!(out, "ID_TYPES = {{")?;
        for class in &doc.classes {
            writeln!(
                out,
                "    {}: {},",
                BaseCodeFormatter::python_str(&class.name),
                identifier_python_type(class)
            )?;
        }
        writeln!(out, "}}")?;

        for class in &doc.classes {
            writeln!(out)?;
            writeln!(out)?;
            self.write_class(out, class)?;
        }

        Ok(())
    }

    fn write_class(&self, out: &mut String, class: &ModelClass) -> GeneratorResult<()> {
        match &class.parent {
            Some(parent) => writeln!(out, "class {}({parent}):", class.name)?,
            None => writeln!(
                out,
                "class {}(pla.DataFrameModel, LinkmlPanderaValidator):",
                class.name
            )?,
        }

        if self.config.include_docs
            && let Some(desc) = &class.description
        {
            let wrapped = BaseCodeFormatter::wrap_text(desc, 72, "    ");
            writeln!(out, "    \"\"\"{wrapped}\"\"\"")?;
            writeln!(out)?;
        }

        writeln!(out, "    class Config:")?;
        writeln!(
            out,
            "        coerce = {}",
            if self.config.coerce { "True" } else { "False" }
        )?;
        writeln!(out)?;

        match class.id_field_name() {
            Some(id) => writeln!(out, "    _id_name = {}", BaseCodeFormatter::python_str(id))?,
            None => writeln!(out, "    _id_name = None")?,
        }

        let nested: Vec<&SlotMetadata> = class
            .all_fields
            .iter()
            .filter(|f| f.nested_representation().is_some())
            .collect();
        Self::write_table(out, "_NESTED_RANGES", &nested, |f| {
            f.reference_model().map(|m| BaseCodeFormatter::python_str(&m))
        })?;
        Self::write_table(out, "_INLINE_FORM", &nested, |f| {
            f.representation
                .map(|kind| BaseCodeFormatter::python_str(kind.inline_form()))
        })?;
        Self::write_table(out, "_INLINE_DETAILS", &nested, |f| {
            f.simple_dict.as_ref().map(|shape| {
                format!(
                    "{{\"id\": {}, \"other\": {}}}",
                    BaseCodeFormatter::python_str(&shape.id_field),
                    BaseCodeFormatter::python_str(&shape.other_field)
                )
            })
        })?;

        for field in &class.fields {
            writeln!(out)?;
            self.write_field(out, field)?;
        }

        for field in class.nested_fields() {
            let (Some(kind), Some(check_name)) =
                (field.nested_representation(), field.nested_check_name())
            else {
                continue;
            };
            let Some(helper) = kind.check_helper() else {
                continue;
            };
            let method = BaseCodeFormatter::to_python_identifier(&check_name);
            writeln!(out)?;
            writeln!(
                out,
                "    @pla.check({}, name={})",
                BaseCodeFormatter::python_str(&field.field_name),
                BaseCodeFormatter::python_str(&check_name)
            )?;
            writeln!(out, "    @classmethod")?;
            writeln!(out, "    def {method}(cls, data: PolarsData):")?;
            writeln!(out, "        return cls.{helper}(cls, data)")?;
        }

        for field in class.cardinality_fields() {
            let method = BaseCodeFormatter::to_python_identifier(&field.cardinality_check_name());
            let bound = |b: Option<u64>| b.map_or_else(|| "None".to_string(), |n| n.to_string());
            writeln!(out)?;
            writeln!(out, "    @pla.dataframe_check")?;
            writeln!(out, "    @classmethod")?;
            writeln!(out, "    def {method}(cls, df):")?;
            writeln!(
                out,
                "        return cls._check_cardinality(df, {}, {}, {})",
                BaseCodeFormatter::python_str(&field.field_name),
                bound(field.minimum_cardinality),
                bound(field.maximum_cardinality)
            )?;
        }

        Ok(())
    }

    fn write_table<F>(
        out: &mut String,
        name: &str,
        fields: &[&SlotMetadata],
        value: F,
    ) -> GeneratorResult<()>
    where
        F: Fn(&SlotMetadata) -> Option<String>,
    {
        let entries: Vec<(String, String)> = fields
            .iter()
            .filter_map(|f| value(f).map(|v| (BaseCodeFormatter::python_str(&f.field_name), v)))
            .collect();

        if entries.is_empty() {
            writeln!(out, "    {name} = {{}}")?;
            return Ok(());
        }

        writeln!(out, "    {name} = {{")?;
        for (key, v) in entries {
            writeln!(out, "        {key}: {v},")?;
        }
        writeln!(out, "    }}")?;
        Ok(())
    }

    fn write_field(&self, out: &mut String, field: &SlotMetadata) -> GeneratorResult<()> {
        let mut args = Vec::new();
        if let Some(v) = &field.minimum_value {
            args.push(format!("ge={}", BaseCodeFormatter::python_literal(v)));
        }
        if let Some(v) = &field.maximum_value {
            args.push(format!("le={}", BaseCodeFormatter::python_literal(v)));
        }
        if let Some(pattern) = &field.pattern {
            args.push(format!("str_matches={}", BaseCodeFormatter::python_str(pattern)));
        }
        if let FieldRange::Enum(values) = &field.range {
            let values: Vec<String> = values.iter().map(|v| BaseCodeFormatter::python_str(v)).collect();
            args.push(format!("isin=[{}]", values.join(", ")));
        }
        args.push(format!(
            "nullable={}",
            if field.required { "False" } else { "True" }
        ));
        if self.config.include_docs
            && let Some(desc) = &field.description
        {
            args.push(format!("description={}", BaseCodeFormatter::python_str(desc)));
        }

        let ident = BaseCodeFormatter::to_python_identifier(&field.field_name);
        if ident != field.field_name {
            args.push(format!("alias={}", BaseCodeFormatter::python_str(&field.field_name)));
        }

        let annotation = Self::class_based_annotation(field);
        let annotation = if field.required {
            annotation
        } else {
            format!("Optional[{annotation}]")
        };

        writeln!(out, "    {ident}: {annotation} = pla.Field({})", args.join(", "))?;
        Ok(())
    }

    fn class_based_annotation(field: &SlotMetadata) -> String {
        fn scalar(range: &FieldRange) -> String {
            match range {
                FieldRange::Primitive(p) => p.class_based_name().to_string(),
                FieldRange::Enum(_) => "str".to_string(),
                FieldRange::Object => "Object".to_string(),
                FieldRange::Struct => "pl.Struct".to_string(),
                FieldRange::ForeignKey { class, .. } => format!("ID_TYPES['{class}']"),
                FieldRange::List(inner) => format!("pl.List({})", list_element(inner)),
            }
        }

        fn list_element(range: &FieldRange) -> String {
            match range {
                FieldRange::Primitive(p) | FieldRange::ForeignKey { id_type: p, .. } => {
                    p.polars_name().to_string()
                }
                FieldRange::Enum(_) => "pl.Utf8".to_string(),
                FieldRange::Object => "pl.Object".to_string(),
                FieldRange::Struct => "pl.Struct".to_string(),
                FieldRange::List(inner) => format!("pl.List({})", list_element(inner)),
            }
        }

        scalar(&field.range)
    }

    // === Schema-only templates ===

    fn write_polars_schema(out: &mut String, doc: &ModelDocument) -> GeneratorResult<()> {
        writeln!(out, "import polars as pl")?;

        for class in &doc.classes {
            writeln!(out)?;
            writeln!(out)?;
            writeln!(out, "{} = pl.Schema(", class.name)?;
            writeln!(out, "    {{")?;
            for field in &class.all_fields {
                let mut visited = HashSet::from([class.name.clone()]);
                writeln!(
                    out,
                    "        {}: {},",
                    BaseCodeFormatter::python_str(&field.field_name),
                    polars_dtype(doc, field, &mut visited)
                )?;
            }
            writeln!(out, "    }}")?;
            writeln!(out, ")")?;
        }

        Ok(())
    }

    fn write_arrow_schema(out: &mut String, doc: &ModelDocument) -> GeneratorResult<()> {
        writeln!(out, "import pyarrow as pa")?;

        for class in &doc.classes {
            writeln!(out)?;
            writeln!(out)?;
            writeln!(out, "{} = pa.schema(", class.name)?;
            writeln!(out, "    [")?;
            for field in &class.all_fields {
                let mut visited = HashSet::from([class.name.clone()]);
                writeln!(out, "        {},", arrow_field(doc, field, &mut visited))?;
            }
            writeln!(out, "    ]")?;
            writeln!(out, ")")?;
        }

        Ok(())
    }
}

/// Fields of the class a nested column refers to, unless already being expanded
fn nested_class<'d>(
    doc: &'d ModelDocument,
    field: &SlotMetadata,
    visited: &HashSet<String>,
) -> Option<&'d ModelClass> {
    let model = field.reference_model()?;
    if visited.contains(&model) {
        return None;
    }
    doc.class(&model)
}

fn polars_dtype(doc: &ModelDocument, field: &SlotMetadata, visited: &mut HashSet<String>) -> String {
    match field.nested_representation() {
        Some(RepresentationKind::NestedStruct) => polars_struct(doc, field, visited),
        Some(RepresentationKind::NestedListStruct) => {
            format!("pl.List({})", polars_struct(doc, field, visited))
        }
        Some(RepresentationKind::SimpleDict | RepresentationKind::CollectionStruct) => {
            "pl.Object".to_string()
        }
        Some(RepresentationKind::Reference) | None => polars_range(&field.range),
    }
}

fn polars_struct(doc: &ModelDocument, field: &SlotMetadata, visited: &mut HashSet<String>) -> String {
    let Some(class) = nested_class(doc, field, visited) else {
        return "pl.Struct".to_string();
    };

    visited.insert(class.name.clone());
    let members: Vec<String> = class
        .all_fields
        .iter()
        .map(|f| {
            format!(
                "{}: {}",
                BaseCodeFormatter::python_str(&f.field_name),
                polars_dtype(doc, f, visited)
            )
        })
        .collect();
    visited.remove(&class.name);
    format!("pl.Struct({{{}}})", members.join(", "))
}

fn polars_range(range: &FieldRange) -> String {
    match range {
        FieldRange::Primitive(p) | FieldRange::ForeignKey { id_type: p, .. } => {
            p.polars_name().to_string()
        }
        FieldRange::Enum(values) => format!(
            "pl.Enum([{}])",
            values
                .iter()
                .map(|v| BaseCodeFormatter::python_str(v))
                .collect::<Vec<_>>()
                .join(", ")
        ),
        FieldRange::Object => "pl.Object".to_string(),
        FieldRange::Struct => "pl.Struct".to_string(),
        FieldRange::List(inner) => format!("pl.List({})", polars_range(inner)),
    }
}

fn arrow_field(doc: &ModelDocument, field: &SlotMetadata, visited: &mut HashSet<String>) -> String {
    format!(
        "pa.field({}, {}, nullable={})",
        BaseCodeFormatter::python_str(&field.field_name),
        arrow_dtype(doc, field, visited),
        if field.required { "False" } else { "True" }
    )
}

fn arrow_dtype(doc: &ModelDocument, field: &SlotMetadata, visited: &mut HashSet<String>) -> String {
    let Some(kind) = field.nested_representation() else {
        return arrow_range(&field.range);
    };

    let Some(class) = nested_class(doc, field, visited) else {
        return "pa.struct([])".to_string();
    };
    visited.insert(class.name.clone());
    let id_field = class.id_field_name();
    let members: Vec<String> = class
        .all_fields
        .iter()
        .map(|f| arrow_field(doc, f, visited))
        .collect();
    visited.remove(&class.name);
    let record = format!("pa.struct([{}])", members.join(", "));

    match kind {
        RepresentationKind::NestedListStruct => format!("pa.list_({record})"),
        RepresentationKind::SimpleDict | RepresentationKind::CollectionStruct => {
            let key = id_field
                .and_then(|id| class.field(id))
                .map_or_else(|| "pa.string()".to_string(), |f| arrow_range(&f.range));
            format!("pa.map_({key}, {record})")
        }
        RepresentationKind::NestedStruct | RepresentationKind::Reference => record,
    }
}

fn arrow_range(range: &FieldRange) -> String {
    match range {
        FieldRange::Primitive(p) | FieldRange::ForeignKey { id_type: p, .. } => {
            p.arrow_name().to_string()
        }
        FieldRange::Enum(_) => "pa.dictionary(pa.int32(), pa.string())".to_string(),
        FieldRange::Object => "pa.binary()".to_string(),
        FieldRange::Struct => "pa.struct([])".to_string(),
        FieldRange::List(inner) => format!("pa.list_({})", arrow_range(inner)),
    }
}

impl Generator for PanderaGenerator {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn generate(&self, schema: &SchemaDefinition) -> Result<String> {
        self.validate_schema(schema)?;
        let document = self.render(schema)?;
        Ok(self.serialize(&document)?)
    }

    fn get_file_extension(&self) -> &str {
        "py"
    }

    fn get_default_filename(&self) -> &str {
        "pandera_model.py"
    }

    fn validate_schema(&self, schema: &SchemaDefinition) -> Result<()> {
        if schema.name.is_empty() {
            return Err(LinkMLError::schema_validation("Schema must have a name"));
        }
        if schema.classes.is_empty() {
            return Err(LinkMLError::schema_validation(
                "Schema must define at least one class",
            ));
        }
        Ok(())
    }
}

/// Identifier column type of a class for the class-based template
#[must_use]
pub fn identifier_python_type(class: &ModelClass) -> &'static str {
    class
        .id_field_name()
        .and_then(|id| class.field(id))
        .map_or("str", |field| match &field.range {
            FieldRange::Primitive(p) => p.class_based_name(),
            _ => "str",
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{SchemaParser, YamlParser};
    use pretty_assertions::assert_eq;

    const SCHEMA: &str = r#"
id: https://example.org/gen
name: gen_test
version: "1.2"
metamodel_version: "1.7.0"
default_range: string
classes:
  Named:
    description: Something with an id
    attributes:
      id:
        identifier: true
        range: integer
        required: true
  Tag:
    attributes:
      key:
        identifier: true
      other:
        range: integer
  Item:
    is_a: Named
    attributes:
      score:
        range: float
        minimum_value: 0
        maximum_value: 10
      code:
        pattern: "^[A-Z]+$"
        required: true
      tags:
        range: Tag
        multivalued: true
        inlined: true
      parent:
        range: Named
      batch:
        range: integer
        minimum_cardinality: 1
        maximum_cardinality: 1
"#;

    fn schema() -> SchemaDefinition {
        YamlParser::new().parse_str(SCHEMA).expect("schema should parse")
    }

    #[test]
    fn test_render_separates_own_and_inherited_fields() -> GeneratorResult<()> {
        let doc = PanderaGenerator::new().render(&schema())?;
        let names: Vec<_> = doc.classes.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Named", "Tag", "Item"]);

        let item = doc.class("Item").expect("Item should be rendered");
        assert_eq!(item.parent.as_deref(), Some("Named"));
        assert_eq!(item.identifier_key_slot.as_deref(), Some("id"));
        assert_eq!(item.fields.len(), 5);
        assert_eq!(item.all_fields.len(), 6);
        assert_eq!(identifier_python_type(item), "int");
        Ok(())
    }

    #[test]
    fn test_class_based_output() -> Result<()> {
        let code = PanderaGenerator::new().generate(&schema())?;

        assert!(code.contains("# metamodel_version: 1.7.0"));
        assert!(code.contains("class Named(pla.DataFrameModel, LinkmlPanderaValidator):"));
        assert!(code.contains("class Item(Named):"));
        assert!(code.contains("    \"Named\": int,"));
        assert!(code.contains("    score: Optional[float] = pla.Field(ge=0, le=10, nullable=True)"));
        assert!(code.contains("    code: str = pla.Field(str_matches=\"^[A-Z]+$\", nullable=False)"));
        assert!(code.contains("    parent: Optional[ID_TYPES['Named']]"));
        assert!(code.contains("        \"tags\": \"simple_dict\","));
        assert!(code.contains("        \"tags\": {\"id\": \"key\", \"other\": \"other\"},"));
        assert!(code.contains("    @pla.check(\"tags\", name=\"check_simple_dict_tags\")"));
        assert!(code.contains("        return cls._check_simple_dict(cls, data)"));
        assert!(code.contains("    def check_cardinality_batch(cls, df):"));
        assert!(code.contains("        return cls._check_cardinality(df, \"batch\", 1, 1)"));
        Ok(())
    }

    #[test]
    fn test_schema_only_templates() -> Result<()> {
        let polars = PanderaGenerator::with_config(GenerationConfig {
            template: TemplateKind::PolarsSchema,
            ..GenerationConfig::default()
        })
        .generate(&schema())?;
        assert!(polars.contains("Item = pl.Schema("));
        assert!(polars.contains("        \"tags\": pl.Object,"));
        assert!(polars.contains("        \"id\": pl.Int64,"));

        let arrow = PanderaGenerator::with_config(GenerationConfig {
            template: TemplateKind::ArrowSchema,
            emit_metadata: false,
            ..GenerationConfig::default()
        })
        .generate(&schema())?;
        assert!(arrow.contains("Item = pa.schema("));
        assert!(arrow.contains("pa.field(\"tags\", pa.map_(pa.string(), pa.struct(["));
        assert!(!arrow.contains("metamodel_version"));
        Ok(())
    }

    #[test]
    fn test_validate_schema_requires_classes() {
        let empty = YamlParser::new()
            .parse_str("id: https://example.org/e\nname: e\n")
            .expect("schema should parse");
        assert!(PanderaGenerator::new().generate(&empty).is_err());
    }
}
