//! Validation errors.

use crate::fieldpath::Path;
use crate::schema::SchemaError;
use crate::value::ValueKind;
use std::fmt;
use thiserror::Error;

/// ValidationError describes one place where a value does not match its type.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("{path}: expected {expected}, got {actual}")]
    TypeMismatch {
        path: Path,
        expected: String,
        actual: ValueKind,
    },

    #[error("{path}: field not declared in schema: {field}")]
    UnknownField { path: Path, field: String },

    #[error("{path}: associative list item is missing key field {key}")]
    MissingMergeKey { path: Path, key: String },

    #[error("{path}: duplicate entries for key {identity}")]
    DuplicateIdentity { path: Path, identity: String },

    #[error("{path}: key field {key} must be a scalar, got {actual}")]
    InvalidKeyValue {
        path: Path,
        key: String,
        actual: ValueKind,
    },

    #[error(transparent)]
    Schema(#[from] SchemaError),
}

impl ValidationError {
    pub fn type_mismatch(path: &Path, expected: impl Into<String>, actual: ValueKind) -> Self {
        ValidationError::TypeMismatch {
            path: path.clone(),
            expected: expected.into(),
            actual,
        }
    }

    /// The location of the error, if it has one.
    pub fn path(&self) -> Option<&Path> {
        match self {
            ValidationError::TypeMismatch { path, .. }
            | ValidationError::UnknownField { path, .. }
            | ValidationError::MissingMergeKey { path, .. }
            | ValidationError::DuplicateIdentity { path, .. }
            | ValidationError::InvalidKeyValue { path, .. } => Some(path),
            ValidationError::Schema(_) => None,
        }
    }
}

/// ValidationErrors is every error found while validating one value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidationErrors {
    errors: Vec<ValidationError>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        ValidationErrors { errors: Vec::new() }
    }

    pub fn add(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ValidationError> {
        self.errors.iter()
    }
}

impl From<ValidationError> for ValidationErrors {
    fn from(error: ValidationError) -> Self {
        ValidationErrors { errors: vec![error] }
    }
}

impl From<SchemaError> for ValidationErrors {
    fn from(error: SchemaError) -> Self {
        ValidationError::Schema(error).into()
    }
}

impl IntoIterator for ValidationErrors {
    type Item = ValidationError;
    type IntoIter = std::vec::IntoIter<ValidationError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.into_iter()
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, err) in self.errors.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{}", err)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}
