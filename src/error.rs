//! Error handling for visgraph
//!
//! This module defines the error taxonomy shared by properties, adaptors and
//! the pipeline resolver, plus a Result alias used throughout the crate.

use crate::types::ValueType;
use thiserror::Error;

/// Main error type for visgraph operations
#[derive(Error, Debug)]
pub enum VisError {
    /// Read of a property that has neither a value nor a linked source with one
    #[error("Property has no value")]
    NoValue,

    /// A link would make a property depend on itself
    #[error("Cyclic link detected")]
    CyclicLink,

    /// Two requests for the same property name disagree on its type
    #[error("Type mismatch for '{name}': existing {existing}, requested {requested}")]
    TypeMismatch {
        name: String,
        existing: ValueType,
        requested: ValueType,
    },

    /// A role names a sub-pipeline that the loader does not know
    #[error("Unknown {role} subgraph '{name}'")]
    UnknownSubgraph { role: String, name: String },

    /// A literal was supplied for an input whose type has no parser
    #[error("No parser for input '{input}' of type {value_type}")]
    UnsupportedInputType { input: String, value_type: ValueType },

    /// A sub-pipeline template cannot be instantiated
    #[error("Invalid template '{template}': {message}")]
    InvalidTemplate { template: String, message: String },

    /// Errors related to configuration loading/saving
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic errors with context
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<VisError>,
    },
}

impl VisError {
    /// Add context to an error
    pub fn with_context(self, context: impl Into<String>) -> Self {
        VisError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Shorthand for a template error
    pub fn invalid_template(template: impl Into<String>, message: impl Into<String>) -> Self {
        VisError::InvalidTemplate {
            template: template.into(),
            message: message.into(),
        }
    }

    /// The innermost error, with all context layers removed
    pub fn root_cause(&self) -> &VisError {
        match self {
            VisError::WithContext { source, .. } => source.root_cause(),
            other => other,
        }
    }
}

impl From<serde_json::Error> for VisError {
    fn from(err: serde_json::Error) -> Self {
        VisError::Serialization(err.to_string())
    }
}

impl From<toml::de::Error> for VisError {
    fn from(err: toml::de::Error) -> Self {
        VisError::Serialization(err.to_string())
    }
}

impl From<toml::ser::Error> for VisError {
    fn from(err: toml::ser::Error) -> Self {
        VisError::Serialization(err.to_string())
    }
}

/// Result type alias for visgraph operations
pub type Result<T> = std::result::Result<T, VisError>;

/// Extension trait for adding context to Results
pub trait ResultExt<T> {
    /// Add context to an error result
    fn context(self, context: impl Into<String>) -> Result<T>;

    /// Add context lazily to an error result
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| e.with_context(f()))
    }
}
