//! Error types for serialization support

/// Errors preparing or restoring an object
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SerializationError {
    /// Path does not lead to a value inside the field
    #[error("invalid path {path} in field {field}")]
    InvalidPath { field: String, path: String },

    /// Persisted entity could not be found again
    #[error("cannot resolve entity {entity_type} with identifier {identifier}")]
    UnresolvedEntity {
        entity_type: String,
        identifier: String,
    },

    /// Persistence manager knows the entity but has no identifier for it
    #[error("no identifier for persisted entity of class {class_name}")]
    MissingIdentifier { class_name: String },

    /// Object has no field of that name
    #[error("unknown field: {0}")]
    UnknownField(String),
}

impl SerializationError {
    /// Create invalid path error
    pub fn invalid_path(field: impl Into<String>, path: impl Into<String>) -> Self {
        Self::InvalidPath {
            field: field.into(),
            path: path.into(),
        }
    }
}
