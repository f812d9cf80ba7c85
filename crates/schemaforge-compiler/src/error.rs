//! Compile error type.

use schemaforge_core::SchemaError;
use thiserror::Error;

/// A schema that failed to compile, tagged with its collection.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("failed to compile schema for collection `{collection}`: {source}")]
pub struct CompileError {
    pub collection: String,
    #[source]
    pub source: SchemaError,
}

impl CompileError {
    pub fn new(collection: impl Into<String>, source: SchemaError) -> Self {
        Self {
            collection: collection.into(),
            source,
        }
    }
}

/// Result type alias for compilation.
pub type Result<T> = std::result::Result<T, CompileError>;
