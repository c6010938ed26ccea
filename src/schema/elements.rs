//! Core schema elements and type definitions.

use super::SchemaError;
use crate::value::Value;
use once_cell::sync::{Lazy, OnceCell};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use std::sync::Arc;

/// Name of the single type in [`Schema::deduced`].
pub const DEDUCED_TYPE_NAME: &str = "__untyped_deduced_";

/// Schema is a set of named types.
///
/// A schema is checked when it is built and never changes afterwards, so it
/// is normally shared behind an `Arc`. Named references are followed only
/// when a walk reaches them, which keeps self-referential types finite.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Schema {
    types: BTreeMap<String, Arc<Atom>>,
}

/// Atom is the definition of one type.
#[derive(Debug, Clone, PartialEq)]
pub enum Atom {
    /// A leaf holding a single value.
    Scalar(ScalarKind),
    /// A map of named fields and/or arbitrary keys.
    Map(MapType),
    /// A sequence of elements of one type.
    List(ListType),
    /// A reference to a named type of the same schema.
    Named(String),
    /// The shape is taken from the data: maps are separable with deduced
    /// values, lists are atomic and everything else is a scalar.
    Deduced,
}

/// Scalar (AKA "primitive") represents a type which has a single value which is
/// either numeric, string, or boolean, or untyped for any of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScalarKind {
    Numeric,
    String,
    Boolean,
    Untyped,
}

impl ScalarKind {
    /// Returns true if `value` is a scalar of this kind.
    pub fn accepts(&self, value: &Value) -> bool {
        match (self, value) {
            (ScalarKind::Numeric, Value::Int(_) | Value::Float(_)) => true,
            (ScalarKind::String, Value::String(_)) => true,
            (ScalarKind::Boolean, Value::Bool(_)) => true,
            (ScalarKind::Untyped, v) => v.is_scalar(),
            _ => false,
        }
    }
}

impl fmt::Display for ScalarKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ScalarKind::Numeric => "numeric",
            ScalarKind::String => "string",
            ScalarKind::Boolean => "boolean",
            ScalarKind::Untyped => "untyped scalar",
        };
        f.write_str(name)
    }
}

/// ElementRelationship states how the entries of a map relate to each other.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ElementRelationship {
    /// Each entry is merged and owned on its own.
    #[default]
    Separable,
    /// The whole map behaves as a single leaf.
    Atomic,
}

/// MapType describes a map: declared struct fields plus, optionally, the
/// type of any other key.
#[derive(Debug, Clone, Default)]
pub struct MapType {
    /// Each struct field appears exactly once in this list.
    pub fields: Vec<StructField>,
    /// Type of keys that are not declared fields. `None` rejects them.
    pub element_type: Option<Arc<Atom>>,
    pub element_relationship: ElementRelationship,
    field_index: OnceCell<HashMap<String, usize>>,
}

impl PartialEq for MapType {
    fn eq(&self, other: &Self) -> bool {
        self.fields == other.fields
            && self.element_type == other.element_type
            && self.element_relationship == other.element_relationship
    }
}

/// StructField pairs a field name with a field type.
#[derive(Debug, Clone, PartialEq)]
pub struct StructField {
    pub name: String,
    pub ty: Arc<Atom>,
    /// Used as the key value when an associative list item omits this field.
    pub default: Option<Value>,
    /// A required field is never pruned when it becomes empty.
    pub required: bool,
}

/// ListType describes a list and how its elements are identified.
#[derive(Debug, Clone, PartialEq)]
pub struct ListType {
    pub element: Arc<Atom>,
    pub identity: ListIdentity,
}

/// ListIdentity is the rule used to match list elements across documents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListIdentity {
    /// The list is a leaf; elements have no identity.
    Atomic,
    /// Elements are maps identified by the values of these fields.
    ByKeys(Vec<String>),
    /// Elements are identified by their whole value.
    ByValue,
}

impl StructField {
    pub fn new(name: impl Into<String>, ty: Atom) -> Self {
        StructField {
            name: name.into(),
            ty: Arc::new(ty),
            default: None,
            required: false,
        }
    }

    pub fn with_default(mut self, default: Value) -> Self {
        self.default = Some(default);
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }
}

impl MapType {
    pub fn new(fields: Vec<StructField>) -> Self {
        MapType {
            fields,
            ..Default::default()
        }
    }

    /// A map with no declared fields whose every key has type `element`.
    pub fn of(element: Atom) -> Self {
        MapType {
            element_type: Some(Arc::new(element)),
            ..Default::default()
        }
    }

    pub fn with_element_type(mut self, element: Atom) -> Self {
        self.element_type = Some(Arc::new(element));
        self
    }

    pub fn atomic(mut self) -> Self {
        self.element_relationship = ElementRelationship::Atomic;
        self
    }

    pub fn is_atomic(&self) -> bool {
        self.element_relationship == ElementRelationship::Atomic
    }

    /// FindField returns the declared field with this name, if it exists.
    pub fn find_field(&self, name: &str) -> Option<&StructField> {
        let index = self.field_index.get_or_init(|| {
            self.fields
                .iter()
                .enumerate()
                .map(|(i, f)| (f.name.clone(), i))
                .collect()
        });
        index.get(name).and_then(|&i| self.fields.get(i))
    }

    /// The type of the entry named `key`, if the map admits it.
    pub fn entry_type(&self, key: &str) -> Option<&Arc<Atom>> {
        match self.find_field(key) {
            Some(field) => Some(&field.ty),
            None => self.element_type.as_ref(),
        }
    }
}

impl ListType {
    pub fn atomic(element: Atom) -> Self {
        ListType {
            element: Arc::new(element),
            identity: ListIdentity::Atomic,
        }
    }

    pub fn by_keys<S: Into<String>>(element: Atom, keys: impl IntoIterator<Item = S>) -> Self {
        ListType {
            element: Arc::new(element),
            identity: ListIdentity::ByKeys(keys.into_iter().map(Into::into).collect()),
        }
    }

    pub fn by_value(element: Atom) -> Self {
        ListType {
            element: Arc::new(element),
            identity: ListIdentity::ByValue,
        }
    }

    pub fn is_atomic(&self) -> bool {
        self.identity == ListIdentity::Atomic
    }
}

impl Atom {
    pub fn named(name: impl Into<String>) -> Self {
        Atom::Named(name.into())
    }

    /// A short description of the shape, for error messages.
    pub fn describe(&self) -> String {
        match self {
            Atom::Scalar(kind) => kind.to_string(),
            Atom::Map(m) if m.is_atomic() => "atomic map".to_string(),
            Atom::Map(_) => "map".to_string(),
            Atom::List(l) => match &l.identity {
                ListIdentity::Atomic => "atomic list".to_string(),
                ListIdentity::ByKeys(keys) => format!("associative list keyed by {}", keys.join(",")),
                ListIdentity::ByValue => "set".to_string(),
            },
            Atom::Named(name) => format!("named type {}", name),
            Atom::Deduced => "deduced".to_string(),
        }
    }
}

static DEDUCED: Lazy<Arc<Schema>> = Lazy::new(|| {
    let mut types = BTreeMap::new();
    types.insert(DEDUCED_TYPE_NAME.to_string(), Arc::new(Atom::Deduced));
    Arc::new(Schema { types })
});

impl Schema {
    /// Builds a schema from named type definitions, checking that every
    /// reference resolves, names are unique, named references do not loop
    /// without reaching a definition, and list identities are well-formed.
    pub fn new<S: Into<String>>(
        types: impl IntoIterator<Item = (S, Atom)>,
    ) -> Result<Schema, SchemaError> {
        let mut map = BTreeMap::new();
        for (name, atom) in types {
            let name = name.into();
            if map.contains_key(&name) {
                return Err(SchemaError::DuplicateType { name });
            }
            map.insert(name, Arc::new(atom));
        }
        let schema = Schema { types: map };
        schema.check()?;
        Ok(schema)
    }

    /// The shared schema holding only [`DEDUCED_TYPE_NAME`].
    pub fn deduced() -> Arc<Schema> {
        Arc::clone(&DEDUCED)
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    pub fn type_names(&self) -> impl Iterator<Item = &str> {
        self.types.keys().map(String::as_str)
    }

    /// FindNamedType returns the definition registered under `name`.
    pub fn find_named_type(&self, name: &str) -> Option<&Arc<Atom>> {
        self.types.get(name)
    }

    /// Returns the definition of `name` with references followed.
    pub fn resolve_named(&self, name: &str) -> Result<Arc<Atom>, SchemaError> {
        self.resolve(&Arc::new(Atom::named(name)))
    }

    /// Resolve follows named references until it reaches a concrete atom.
    pub fn resolve(&self, atom: &Arc<Atom>) -> Result<Arc<Atom>, SchemaError> {
        let mut current = Arc::clone(atom);
        // A chain longer than the number of types has revisited one.
        for _ in 0..=self.types.len() {
            let Atom::Named(name) = current.as_ref() else {
                return Ok(current);
            };
            let next = self
                .types
                .get(name)
                .ok_or_else(|| SchemaError::UnknownType { name: name.clone() })?;
            current = Arc::clone(next);
        }
        match current.as_ref() {
            Atom::Named(name) => Err(SchemaError::ReferenceCycle { name: name.clone() }),
            _ => Ok(current),
        }
    }

    fn check(&self) -> Result<(), SchemaError> {
        for name in self.types.keys() {
            self.check_chain(name)?;
        }
        for (name, atom) in &self.types {
            self.check_atom(name, atom)?;
        }
        Ok(())
    }

    fn check_chain(&self, start: &str) -> Result<(), SchemaError> {
        let mut seen = BTreeSet::new();
        let mut name = start;
        loop {
            if !seen.insert(name) {
                return Err(SchemaError::ReferenceCycle { name: start.to_string() });
            }
            match self.types.get(name).map(|a| a.as_ref()) {
                Some(Atom::Named(next)) => name = next,
                Some(_) => return Ok(()),
                None => return Err(SchemaError::UnknownType { name: name.to_string() }),
            }
        }
    }

    // Inline atoms form finite trees; only named references may loop, and
    // those are not followed here.
    fn check_atom(&self, type_name: &str, atom: &Atom) -> Result<(), SchemaError> {
        match atom {
            Atom::Scalar(_) | Atom::Deduced => Ok(()),
            Atom::Named(name) => match self.types.contains_key(name) {
                true => Ok(()),
                false => Err(SchemaError::UnknownType { name: name.clone() }),
            },
            Atom::Map(map) => {
                let mut names = BTreeSet::new();
                for field in &map.fields {
                    if !names.insert(field.name.as_str()) {
                        return Err(SchemaError::Malformed {
                            message: format!(
                                "type {} declares field {} twice",
                                type_name, field.name
                            ),
                        });
                    }
                    self.check_atom(type_name, &field.ty)?;
                }
                match &map.element_type {
                    Some(element) => self.check_atom(type_name, element),
                    None => Ok(()),
                }
            }
            Atom::List(list) => {
                self.check_atom(type_name, &list.element)?;
                self.check_identity(type_name, list)
            }
        }
    }

    fn check_identity(&self, type_name: &str, list: &ListType) -> Result<(), SchemaError> {
        let invalid = |reason: String| SchemaError::InvalidIdentity {
            type_name: type_name.to_string(),
            reason,
        };
        let element = self.resolve(&list.element)?;
        match &list.identity {
            ListIdentity::Atomic => Ok(()),
            ListIdentity::ByKeys(keys) => {
                if keys.is_empty() {
                    return Err(invalid("associative list declares no keys".to_string()));
                }
                let mut seen = BTreeSet::new();
                for key in keys {
                    if !seen.insert(key.as_str()) {
                        return Err(invalid(format!("key {} is listed twice", key)));
                    }
                }
                match element.as_ref() {
                    Atom::Deduced => Ok(()),
                    Atom::Map(map) => match keys.iter().find(|k| map.find_field(k).is_none()) {
                        Some(missing) => Err(invalid(format!(
                            "key {} is not a field of the element type",
                            missing
                        ))),
                        None => Ok(()),
                    },
                    other => Err(invalid(format!(
                        "keyed list elements must be maps, not {}",
                        other.describe()
                    ))),
                }
            }
            ListIdentity::ByValue => match element.as_ref() {
                Atom::Scalar(_) => Ok(()),
                Atom::Map(map) if map.is_atomic() => Ok(()),
                Atom::List(inner) if inner.is_atomic() => Ok(()),
                other => Err(invalid(format!(
                    "set elements must be scalars or atomic, not {}",
                    other.describe()
                ))),
            },
        }
    }
}
