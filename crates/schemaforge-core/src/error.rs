//! Error types for SchemaForge

use thiserror::Error;

/// Main error type for schema definition, synthesis and entity operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SchemaError {
    /// The schema declares no property marked with `.key()`.
    #[error("schema declares no key property")]
    NoKeyProperty,

    /// The root of a schema must be an object or a definition.
    #[error("schema root must be an object or definition, found {found}")]
    RootNotObject { found: &'static str },

    /// Field names must be non-empty and must not contain `.`.
    #[error("invalid field name `{name}`")]
    InvalidFieldName { name: String },

    /// A modifier was applied to a property kind that cannot carry it.
    #[error("modifier `{modifier}` is not allowed on `{path}`: {reason}")]
    InvalidModifier {
        path: String,
        modifier: &'static str,
        reason: &'static str,
    },

    /// Nesting went past the configured depth limit.
    #[error("schema nesting at `{path}` exceeds max depth {max_depth}")]
    DepthExceeded { path: String, max_depth: usize },

    /// A computed or function property asked for a dependency nobody injected.
    #[error("property `{path}` requires injected value `{name}`")]
    MissingInjection { path: String, name: String },

    /// A handler produced a code model that cannot be synthesized.
    #[error("code synthesis failed: {0}")]
    Synthesis(String),

    /// A raw value could not be decoded into the declared type.
    #[error("cannot deserialize `{path}`: expected {expected}, found {found}")]
    Deserialize {
        path: String,
        expected: String,
        found: &'static str,
    },

    /// A literal property received a value outside its allow-list.
    #[error("value {value} is not allowed for literal property `{path}`")]
    LiteralNotAllowed { path: String, value: String },

    /// Write attempted on a frozen entity or frozen sub-object.
    #[error("cannot write `{path}`: entity is frozen")]
    Frozen { path: String },

    /// Write attempted on a readonly or identity property that already holds a value.
    #[error("cannot write `{path}`: property is readonly")]
    Readonly { path: String },

    /// A write traversed a null or non-object intermediate value.
    #[error("cannot write `{path}`: target is null or not an object")]
    InvalidTarget { path: String },

    /// `Entity::invoke` named a function property the entity does not carry.
    #[error("entity has no function property `{name}`")]
    UnknownFunction { name: String },
}

/// Result type alias for SchemaForge operations
pub type Result<T> = std::result::Result<T, SchemaError>;
