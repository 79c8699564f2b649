//! Error types for `LinkML` operations

use thiserror::Error;

/// Main error type for `LinkML` operations
#[derive(Error, Debug)]
pub enum LinkMLError {
    /// Schema parsing errors
    #[error("Failed to parse schema: {message}")]
    ParseError {
        /// Error message
        message: String,
        /// Location in schema if available
        location: Option<String>,
    },

    /// Schema is structurally unusable for generation
    #[error("Schema validation failed: {message}")]
    SchemaValidationError {
        /// Error message
        message: String,
        /// Schema element that failed
        element: Option<String>,
    },

    /// Data validation errors
    #[error("Data validation failed: {message}")]
    DataValidationError {
        /// Error message
        message: String,
        /// Path to invalid data
        path: Option<String>,
    },

    /// Pattern compilation errors
    #[error("Pattern validation failed: {message}")]
    PatternError {
        /// Error message
        message: String,
        /// Pattern that failed
        pattern: Option<String>,
    },

    /// Configuration errors
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// IO errors
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Service errors
    #[error("Service error: {0}")]
    ServiceError(String),

    /// Generic errors with context
    #[error("{message}")]
    Other {
        /// Error message
        message: String,
        /// Optional source error
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

/// Result type alias for `LinkML` operations
pub type Result<T> = std::result::Result<T, LinkMLError>;

impl LinkMLError {
    /// Create a new parse error
    #[must_use]
    pub fn parse(message: impl Into<String>) -> Self {
        Self::ParseError {
            message: message.into(),
            location: None,
        }
    }

    /// Create a new parse error with location
    #[must_use]
    pub fn parse_at(message: impl Into<String>, location: impl Into<String>) -> Self {
        Self::ParseError {
            message: message.into(),
            location: Some(location.into()),
        }
    }

    /// Create a new schema validation error
    #[must_use]
    pub fn schema_validation(message: impl Into<String>) -> Self {
        Self::SchemaValidationError {
            message: message.into(),
            element: None,
        }
    }

    /// Create a schema validation error naming the offending element
    #[must_use]
    pub fn schema_element(message: impl Into<String>, element: impl Into<String>) -> Self {
        Self::SchemaValidationError {
            message: message.into(),
            element: Some(element.into()),
        }
    }

    /// Create a new data validation error
    #[must_use]
    pub fn data_validation(message: impl Into<String>) -> Self {
        Self::DataValidationError {
            message: message.into(),
            path: None,
        }
    }

    /// Create a new configuration error
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::ConfigError(message.into())
    }

    /// Create a new service error
    #[must_use]
    pub fn service(message: impl Into<String>) -> Self {
        Self::ServiceError(message.into())
    }
}

impl From<serde_json::Error> for LinkMLError {
    fn from(err: serde_json::Error) -> Self {
        Self::SerializationError(err.to_string())
    }
}

impl From<serde_yaml::Error> for LinkMLError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::SerializationError(err.to_string())
    }
}

impl From<regex::Error> for LinkMLError {
    fn from(err: regex::Error) -> Self {
        Self::PatternError {
            message: err.to_string(),
            pattern: None,
        }
    }
}

impl From<anyhow::Error> for LinkMLError {
    fn from(err: anyhow::Error) -> Self {
        Self::Other {
            message: err.to_string(),
            source: Some(Box::new(std::io::Error::other(err))),
        }
    }
}
