//! Parser for creating typed values from YAML schemas and objects.

use super::typed_value::TypedValue;
use super::validation::ValidationErrors;
use crate::schema::{Schema, SchemaError, DEDUCED_TYPE_NAME};
use crate::value::{self, Value};
use std::sync::Arc;
use thiserror::Error;

/// Error type for parsing operations.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("failed to parse YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("invalid schema: {0}")]
    Schema(#[from] SchemaError),

    #[error("validation failed: {0}")]
    Validation(#[from] ValidationErrors),
}

/// Parser holds a schema read from YAML.
#[derive(Debug, Clone)]
pub struct Parser {
    pub schema: Arc<Schema>,
}

impl Parser {
    /// Creates a new parser from a YAML schema document.
    pub fn new(schema_yaml: &str) -> Result<Parser, ParseError> {
        Ok(Parser {
            schema: Arc::new(Schema::from_yaml(schema_yaml)?),
        })
    }

    pub fn from_schema(schema: Arc<Schema>) -> Parser {
        Parser { schema }
    }

    pub fn type_names(&self) -> Vec<&str> {
        self.schema.type_names().collect()
    }

    /// Returns a ParseableType helper for the given type name.
    pub fn type_by_name(&self, name: &str) -> ParseableType {
        ParseableType {
            schema: Arc::clone(&self.schema),
            type_name: name.to_string(),
        }
    }
}

/// ParseableType produces typed values of one type.
#[derive(Debug, Clone)]
pub struct ParseableType {
    pub schema: Arc<Schema>,
    pub type_name: String,
}

impl ParseableType {
    /// Returns true if the type is defined in the schema.
    pub fn is_valid(&self) -> bool {
        self.schema.resolve_named(&self.type_name).is_ok()
    }

    /// Parses YAML text into a TypedValue.
    pub fn from_yaml(&self, yaml: &str) -> Result<TypedValue, ParseError> {
        let value = value::from_yaml(yaml)?;
        self.from_value(&value)
    }

    /// Validates a generic value into a TypedValue.
    pub fn from_value(&self, value: &Value) -> Result<TypedValue, ParseError> {
        Ok(TypedValue::from_unstructured(&self.schema, &self.type_name, value)?)
    }

    /// A null value of this type.
    pub fn empty(&self) -> Result<TypedValue, ParseError> {
        Ok(TypedValue::empty(&self.schema, &self.type_name)?)
    }
}

/// Returns the type used for documents that have no schema.
pub fn deduced_parseable_type() -> ParseableType {
    ParseableType {
        schema: Schema::deduced(),
        type_name: DEDUCED_TYPE_NAME.to_string(),
    }
}
