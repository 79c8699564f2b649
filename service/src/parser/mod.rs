//! Schema parsing module
//!
//! Parses `LinkML` schemas from YAML and JSON. Parsed schemas have element
//! names filled from their map keys.

use linkml_core::{
    error::{LinkMLError, Result},
    types::SchemaDefinition,
};
use std::path::Path;

pub mod json_parser;
pub mod yaml_parser;

pub use json_parser::JsonParser;
pub use yaml_parser::YamlParser;

/// Trait for schema parsers
pub trait SchemaParser: Send + Sync {
    /// Parse schema from string content
    ///
    /// # Errors
    ///
    /// Returns a `LinkMLError` if parsing fails
    fn parse_str(&self, content: &str) -> Result<SchemaDefinition>;

    /// Parse schema from file
    ///
    /// # Errors
    ///
    /// Returns a `LinkMLError` if:
    /// - File cannot be read
    /// - Parsing fails
    fn parse_file(&self, path: &Path) -> Result<SchemaDefinition> {
        let content = std::fs::read_to_string(path).map_err(LinkMLError::IoError)?;

        self.parse_str(&content).map_err(|e| match e {
            LinkMLError::ParseError { message, location } => LinkMLError::ParseError {
                message: format!("{message} in file {}", path.display()),
                location,
            },
            other => other,
        })
    }
}

/// Main parser that delegates to format-specific parsers
#[derive(Default)]
pub struct Parser {
    yaml: YamlParser,
    json: JsonParser,
}

impl Parser {
    /// Create a new parser
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse schema content in the given format (`yaml`, `yml` or `json`)
    ///
    /// # Errors
    ///
    /// Returns `LinkMLError::ParseError` for unsupported formats or invalid content
    pub fn parse_str(&self, content: &str, format: &str) -> Result<SchemaDefinition> {
        match format.to_ascii_lowercase().as_str() {
            "yaml" | "yml" => self.yaml.parse_str(content),
            "json" => self.json.parse_str(content),
            other => Err(LinkMLError::parse(format!("Unsupported schema format: {other}"))),
        }
    }

    /// Parse a schema file, choosing the format from its extension
    ///
    /// # Errors
    ///
    /// Returns `LinkMLError::ParseError` if the extension is missing or unsupported,
    /// or if the file cannot be read or parsed
    pub fn parse_file(&self, path: &Path) -> Result<SchemaDefinition> {
        let extension = path
            .extension()
            .and_then(|s| s.to_str())
            .ok_or_else(|| LinkMLError::parse("No file extension found"))?;

        match extension.to_ascii_lowercase().as_str() {
            "yaml" | "yml" => self.yaml.parse_file(path),
            "json" => self.json.parse_file(path),
            other => Err(LinkMLError::parse(format!("Unsupported schema format: {other}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_dispatch_by_extension() -> linkml_core::Result<()> {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile()?;
        file.write_all(br#"{"id": "https://example.org/j", "name": "j", "classes": {"A": {}}}"#)?;

        let schema = Parser::new().parse_file(file.path())?;
        assert_eq!(schema.name, "j");
        assert_eq!(schema.classes["A"].name, "A");
        Ok(())
    }

    #[test]
    fn test_unsupported_format() {
        let result = Parser::new().parse_str("", "toml");
        assert!(matches!(result, Err(LinkMLError::ParseError { .. })));
    }
}
