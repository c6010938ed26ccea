//! # Structured Apply
//!
//! Schema-directed compare and merge of semi-structured documents.
//!
//! Several managers write to one document. Each write is either an update
//! (a partial, imperative write) or an apply (the manager's complete intent).
//! The merger tracks which manager owns which fields, reports conflicts
//! between appliers and removes fields nobody owns any more.
//!
//! ## Modules
//!
//! - [`schema`] - Type schema definition language and its parser
//! - [`value`] - In-memory representation of YAML/JSON documents
//! - [`fieldpath`] - Field paths and the persistent sets used for ownership
//! - [`typed`] - Values bound to a schema type (validation, comparison, overlay)
//! - [`merge`] - Multi-manager merge of update and apply operations

use std::sync::Arc;

pub mod fieldpath;
pub mod merge;
pub mod schema;
pub mod typed;
pub mod value;

pub use fieldpath::{APIVersion, ManagedFields, Path, PathElement, Set as FieldPathSet, VersionedSet};
pub use merge::{
    merge, Conflict, Conflicts, MergeError, MergeOutcome, MergeState, Merger, MergerBuilder,
    Operation,
};
pub use schema::{parse_schema, Schema, SchemaError};
pub use typed::{Comparison, TypedValue, ValidationError, ValidationErrors};
pub use value::Value;

/// Validates `raw` against the named type, producing a typed value.
pub fn validate(
    schema: &Arc<Schema>,
    raw: &Value,
    type_name: &str,
) -> Result<TypedValue, ValidationErrors> {
    TypedValue::from_unstructured(schema, type_name, raw)
}

/// Compares two values of the same type.
pub fn compare(lhs: &TypedValue, rhs: &TypedValue) -> Comparison {
    lhs.compare(rhs)
}
