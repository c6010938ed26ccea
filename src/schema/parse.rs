//! Decoding of schema documents.
//!
//! A schema document lists named types:
//!
//! ```yaml
//! types:
//! - name: service
//!   map:
//!     fields:
//!     - name: ports
//!       type:
//!         list:
//!           elementType:
//!             namedType: port
//!           elementRelationship: associative
//!           keys: [port, protocol]
//! - name: port
//!   map:
//!     fields:
//!     - name: port
//!       type: {scalar: numeric}
//!     - name: protocol
//!       type: {scalar: string}
//!       default: TCP
//! ```
//!
//! A type reference is either `namedType: <name>` or an inline definition.

use super::{
    Atom, ElementRelationship, ListIdentity, ListType, MapType, ScalarKind, Schema, SchemaError,
    StructField,
};
use crate::value::{self, Value};
use serde::Deserialize;
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Deserialize)]
struct RawSchema {
    #[serde(default)]
    types: Vec<RawTypeDef>,
}

#[derive(Debug, Deserialize)]
struct RawTypeDef {
    name: String,
    #[serde(flatten)]
    atom: RawAtom,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawAtom {
    named_type: Option<String>,
    scalar: Option<ScalarKind>,
    map: Option<RawMap>,
    list: Option<RawList>,
    #[serde(default)]
    deduced: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawMap {
    #[serde(default)]
    fields: Vec<RawField>,
    element_type: Option<Box<RawAtom>>,
    element_relationship: Option<RawRelationship>,
}

#[derive(Debug, Deserialize)]
struct RawField {
    name: String,
    #[serde(rename = "type")]
    ty: RawAtom,
    default: Option<serde_json::Value>,
    #[serde(default)]
    required: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawList {
    element_type: Box<RawAtom>,
    element_relationship: Option<RawRelationship>,
    #[serde(default)]
    keys: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
enum RawRelationship {
    Associative,
    Atomic,
    Separable,
}

/// Parses a schema document held in a generic value.
pub fn parse_schema(document: &Value) -> Result<Schema, SchemaError> {
    let raw: RawSchema = serde_json::from_value(serde_json::Value::from(document))
        .map_err(|e| malformed(e.to_string()))?;
    let types = raw
        .types
        .into_iter()
        .map(|def| {
            let atom = convert(&def.name, def.atom)?;
            Ok((def.name, atom))
        })
        .collect::<Result<Vec<_>, SchemaError>>()?;
    let schema = Schema::new(types)?;
    debug!(types = schema.len(), "parsed schema");
    Ok(schema)
}

impl Schema {
    /// Parses a schema document from YAML text.
    pub fn from_yaml(yaml: &str) -> Result<Schema, SchemaError> {
        let document = value::from_yaml(yaml).map_err(|e| malformed(e.to_string()))?;
        parse_schema(&document)
    }

    /// Parses a schema document from JSON text.
    pub fn from_json(json: &str) -> Result<Schema, SchemaError> {
        let document = value::from_json(json).map_err(|e| malformed(e.to_string()))?;
        parse_schema(&document)
    }
}

fn malformed(message: impl Into<String>) -> SchemaError {
    SchemaError::Malformed { message: message.into() }
}

fn convert(type_name: &str, raw: RawAtom) -> Result<Atom, SchemaError> {
    let set = usize::from(raw.named_type.is_some())
        + usize::from(raw.scalar.is_some())
        + usize::from(raw.map.is_some())
        + usize::from(raw.list.is_some())
        + usize::from(raw.deduced);
    if set != 1 {
        return Err(malformed(format!(
            "type {} must set exactly one of namedType, scalar, map, list, deduced",
            type_name
        )));
    }
    if let Some(name) = raw.named_type {
        return Ok(Atom::Named(name));
    }
    if let Some(kind) = raw.scalar {
        return Ok(Atom::Scalar(kind));
    }
    if let Some(map) = raw.map {
        return convert_map(type_name, map).map(Atom::Map);
    }
    if let Some(list) = raw.list {
        return convert_list(type_name, list).map(Atom::List);
    }
    Ok(Atom::Deduced)
}

fn convert_map(type_name: &str, raw: RawMap) -> Result<MapType, SchemaError> {
    let fields = raw
        .fields
        .into_iter()
        .map(|f| {
            Ok(StructField {
                ty: Arc::new(convert(type_name, f.ty)?),
                default: f.default.as_ref().map(Value::from),
                required: f.required,
                name: f.name,
            })
        })
        .collect::<Result<Vec<_>, SchemaError>>()?;
    let mut map = MapType::new(fields);
    if let Some(element) = raw.element_type {
        map.element_type = Some(Arc::new(convert(type_name, *element)?));
    }
    map.element_relationship = match raw.element_relationship {
        Some(RawRelationship::Atomic) => ElementRelationship::Atomic,
        // Maps are always associative by key.
        Some(RawRelationship::Associative | RawRelationship::Separable) | None => {
            ElementRelationship::Separable
        }
    };
    Ok(map)
}

fn convert_list(type_name: &str, raw: RawList) -> Result<ListType, SchemaError> {
    let element = Arc::new(convert(type_name, *raw.element_type)?);
    let identity = match raw.element_relationship.unwrap_or(RawRelationship::Atomic) {
        RawRelationship::Associative if raw.keys.is_empty() => ListIdentity::ByValue,
        RawRelationship::Associative => ListIdentity::ByKeys(raw.keys),
        RawRelationship::Atomic if raw.keys.is_empty() => ListIdentity::Atomic,
        RawRelationship::Atomic => {
            return Err(SchemaError::InvalidIdentity {
                type_name: type_name.to_string(),
                reason: "keys are only meaningful on associative lists".to_string(),
            })
        }
        RawRelationship::Separable => {
            return Err(malformed(format!(
                "list in type {} cannot be separable",
                type_name
            )))
        }
    };
    Ok(ListType { element, identity })
}
