//! Schema module defines a targeted schema language for structured merges and diffs.
//!
//! A schema names types. Each type is a scalar, a map, a list with an identity
//! rule for its elements, a reference to another named type, or deduced from
//! the data itself.

mod elements;
mod error;
mod parse;
mod schemaschema;

pub use elements::*;
pub use error::SchemaError;
pub use parse::parse_schema;
pub use schemaschema::SCHEMA_SCHEMA_YAML;
