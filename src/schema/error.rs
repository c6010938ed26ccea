use thiserror::Error;

/// Errors found while reading or checking a schema.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    #[error("unknown type {name:?}")]
    UnknownType { name: String },

    #[error("type {name:?} is defined more than once")]
    DuplicateType { name: String },

    #[error("invalid list identity in type {type_name:?}: {reason}")]
    InvalidIdentity { type_name: String, reason: String },

    #[error("type {name:?} only refers to itself through named references")]
    ReferenceCycle { name: String },

    #[error("malformed schema: {message}")]
    Malformed { message: String },
}
