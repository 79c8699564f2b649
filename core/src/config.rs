//! Configuration types for the Pandera generator and validation runtime

use crate::error::{LinkMLError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PanderaGenConfig {
    /// Code generation configuration
    pub generation: GenerationConfig,

    /// Runtime validation configuration
    pub validation: ValidationConfig,
}

impl PanderaGenConfig {
    /// Parse configuration from YAML text
    ///
    /// # Errors
    ///
    /// Returns `LinkMLError::ConfigError` if the YAML is malformed
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        serde_yaml::from_str(content)
            .map_err(|e| LinkMLError::config(format!("Invalid configuration: {e}")))
    }

    /// Load configuration from a YAML file
    ///
    /// # Errors
    ///
    /// Returns an IO error if the file cannot be read, or a configuration
    /// error if it does not parse
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        tracing::debug!("Loaded configuration from {}", path.display());
        Self::from_yaml_str(&content)
    }
}

/// Output template family
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum TemplateKind {
    /// `pandera.polars.DataFrameModel` classes with nested checks
    #[default]
    #[serde(rename = "panderagen_class_based")]
    ClassBased,
    /// Plain `polars.Schema` definitions
    #[serde(rename = "panderagen_polars_schema")]
    PolarsSchema,
    /// `pyarrow.schema` definitions
    #[serde(rename = "panderagen_arrow_schema")]
    ArrowSchema,
}

impl TemplateKind {
    /// Every supported template
    pub const ALL: [TemplateKind; 3] = [Self::ClassBased, Self::PolarsSchema, Self::ArrowSchema];

    /// The template path identifier
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ClassBased => "panderagen_class_based",
            Self::PolarsSchema => "panderagen_polars_schema",
            Self::ArrowSchema => "panderagen_arrow_schema",
        }
    }

    /// Look up a template by its path identifier
    ///
    /// # Errors
    ///
    /// Returns `LinkMLError::ConfigError` for unsupported templates
    pub fn parse(name: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == name)
            .ok_or_else(|| LinkMLError::config(format!("Template {name} not supported")))
    }
}

impl std::fmt::Display for TemplateKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Code generation configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GenerationConfig {
    /// Template family to render
    pub template: TemplateKind,

    /// Package name recorded in the generated module header
    pub package: Option<String>,

    /// Ask Pandera to coerce column dtypes
    pub coerce: bool,

    /// Emit schema and metamodel version comments
    pub emit_metadata: bool,

    /// Emit class descriptions as docstrings
    pub include_docs: bool,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            template: TemplateKind::default(),
            package: None,
            coerce: false,
            emit_metadata: true,
            include_docs: true,
        }
    }
}

/// Runtime validation configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ValidationConfig {
    /// Collect every violation instead of stopping at the first failing column
    pub lazy: bool,

    /// Maximum failure cases recorded per check
    pub max_failure_cases: usize,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            lazy: true,
            max_failure_cases: 100,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = PanderaGenConfig::default();
        assert_eq!(config.generation.template, TemplateKind::ClassBased);
        assert!(config.generation.emit_metadata);
        assert!(!config.generation.coerce);
        assert!(config.validation.lazy);
        assert_eq!(config.validation.max_failure_cases, 100);
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() -> crate::Result<()> {
        let config = PanderaGenConfig::from_yaml_str(
            "generation:\n  template: panderagen_polars_schema\n  coerce: true\n",
        )?;
        assert_eq!(config.generation.template, TemplateKind::PolarsSchema);
        assert!(config.generation.coerce);
        assert!(config.generation.include_docs);
        assert_eq!(config.validation, ValidationConfig::default());
        Ok(())
    }

    #[test]
    fn test_config_file_roundtrip() -> crate::Result<()> {
        let mut config = PanderaGenConfig::default();
        config.validation.max_failure_cases = 5;
        config.generation.package = Some("models".to_string());

        let mut file = tempfile::NamedTempFile::new()?;
        file.write_all(serde_yaml::to_string(&config)?.as_bytes())?;

        let loaded = PanderaGenConfig::from_yaml_file(file.path())?;
        assert_eq!(loaded, config);
        Ok(())
    }

    #[test]
    fn test_template_parse() {
        assert!(matches!(
            TemplateKind::parse("panderagen_arrow_schema"),
            Ok(TemplateKind::ArrowSchema)
        ));
        assert!(matches!(
            TemplateKind::parse("jinja_nonsense"),
            Err(LinkMLError::ConfigError(_))
        ));
    }
}
