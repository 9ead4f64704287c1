//! Error types for schema inference

use thiserror::Error;

/// Result type for schema operations
pub type Result<T> = std::result::Result<T, SchemaError>;

/// Schema inference errors
///
/// Every variant aborts the enclosing build: schema construction is
/// deterministic, so there is nothing to retry.
#[derive(Error, Debug)]
pub enum SchemaError {
    #[error("No schema resolver for type '{type_id}' (at {path})")]
    SchemaResolution { type_id: String, path: String },

    #[error("Type '{type_id}' contains itself with no named record in between (at {path})")]
    CyclicType { type_id: String, path: String },

    #[error("Invalid schema override for {target}: {message}")]
    SchemaOverrideParse { target: String, message: String },

    #[error("Invalid union: {0}")]
    UnionInvariant(String),

    #[error("Duplicate field '{field}' in record {record}")]
    DuplicateField { record: String, field: String },

    #[error("Invalid name '{0}'")]
    InvalidName(String),

    #[error("Invalid enum {name}: {message}")]
    InvalidEnum { name: String, message: String },

    #[error("Invalid default value for {target}: {message}")]
    DefaultValueParse { target: String, message: String },

    #[error("Avro validation failed: {0}")]
    Avro(#[from] apache_avro::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl SchemaError {
    /// Build an override parse error for a type or property
    pub fn override_parse(target: impl Into<String>, message: impl Into<String>) -> Self {
        SchemaError::SchemaOverrideParse {
            target: target.into(),
            message: message.into(),
        }
    }
}
