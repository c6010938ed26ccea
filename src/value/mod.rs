//! Value module - In-memory representation of YAML/JSON documents.
//!
//! These are the untyped trees a generic parser produces; the `typed` module
//! binds them to a schema.

mod value;

pub use value::*;
