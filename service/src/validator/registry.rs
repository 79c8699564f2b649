//! Name to model lookup used by nested validation

use indexmap::IndexMap;
use linkml_core::{Result as LinkMLResult, ValidationConfig, Value};
use std::sync::Arc;
use tracing::info;

use super::FrameValidationError;
use super::model::FrameModel;
use crate::frame::{DataFrame, from_records};
use crate::generator::document::ModelDocument;
use crate::generator::projector::SchemaProjector;

/// Every validation model of one generated document
///
/// Built once from the whole document, so nested lookups never see a
/// partially populated registry.
#[derive(Debug, Clone)]
pub struct ModelRegistry {
    document: Arc<ModelDocument>,
    models: IndexMap<String, Arc<FrameModel>>,
}

impl ModelRegistry {
    /// Build a model for every class of the document
    ///
    /// # Errors
    ///
    /// Returns an error if a class cannot be turned into a model
    pub fn from_document(document: &ModelDocument, config: &ValidationConfig) -> LinkMLResult<Self> {
        let mut models = IndexMap::with_capacity(document.classes.len());
        for class in &document.classes {
            models.insert(class.name.clone(), Arc::new(FrameModel::from_class(class, config)?));
        }

        info!(schema = %document.schema_name, models = models.len(), "built model registry");
        Ok(Self {
            document: Arc::new(document.clone()),
            models,
        })
    }

    #[must_use]
    pub fn document(&self) -> &ModelDocument {
        &self.document
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<Arc<FrameModel>> {
        self.models.get(name).cloned()
    }

    /// Look up a model, failing for unknown names
    ///
    /// # Errors
    ///
    /// Returns `FrameValidationError::UnknownModel` if no model has this name
    pub fn resolve(&self, name: &str) -> Result<Arc<FrameModel>, FrameValidationError> {
        self.get(name)
            .ok_or_else(|| FrameValidationError::UnknownModel(name.to_string()))
    }

    pub fn model_names(&self) -> impl Iterator<Item = &str> {
        self.models.keys().map(String::as_str)
    }

    /// Load records into a frame typed after the model's structural schema
    ///
    /// # Errors
    ///
    /// Returns an error for an unknown model or records that are not objects
    pub fn load_frame(&self, model: &str, records: &[Value]) -> Result<DataFrame, FrameValidationError> {
        let schema = SchemaProjector::new(&self.document)
            .project(model, None, false)
            .map_err(|_| FrameValidationError::UnknownModel(model.to_string()))?;
        Ok(from_records(records, &schema)?)
    }

    /// Validate records against a model
    ///
    /// # Errors
    ///
    /// Returns the violations found, or a configuration error
    pub fn validate_records(&self, model: &str, records: &[Value]) -> Result<(), FrameValidationError> {
        let frame_model = self.resolve(model)?;
        let df = self.load_frame(model, records)?;
        frame_model.validate(&df, self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::PanderaGenerator;
    use crate::parser::{SchemaParser, YamlParser};
    use serde_json::json;

    fn registry() -> ModelRegistry {
        let schema = YamlParser::new()
            .parse_str(
                r"
id: https://example.org/r
name: r
default_range: string
classes:
  named_thing:
    attributes:
      id:
        identifier: true
  Box:
    is_a: named_thing
    attributes:
      size:
        range: integer
",
            )
            .expect("schema should parse");
        let document = PanderaGenerator::new()
            .render(&schema)
            .expect("schema should render");
        ModelRegistry::from_document(&document, &ValidationConfig::default())
            .expect("registry should build")
    }

    #[test]
    fn test_registry_holds_every_class() {
        let registry = registry();
        assert_eq!(registry.model_names().collect::<Vec<_>>(), vec!["NamedThing", "Box"]);
        assert_eq!(
            registry.get("Box").map(|m| m.fields().len()),
            Some(2)
        );
    }

    #[test]
    fn test_unknown_model_is_a_configuration_error() {
        let registry = registry();
        assert_eq!(
            registry.resolve("Missing").map(|m| m.name().to_string()),
            Err(FrameValidationError::UnknownModel("Missing".to_string()))
        );
    }

    #[test]
    fn test_validate_records() {
        let registry = registry();
        assert_eq!(
            registry.validate_records("Box", &[json!({"id": "b", "size": 3})]),
            Ok(())
        );
        assert!(
            registry
                .validate_records("Box", &[json!({"id": "b", "size": "big"})])
                .is_err()
        );
    }
}
