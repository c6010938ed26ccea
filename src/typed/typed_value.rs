//! TypedValue implementation.

use super::validation::{ValidationError, ValidationErrors};
use crate::fieldpath::{KeyFields, Path, PathElement, Set};
use crate::schema::{Atom, ListIdentity, ListType, MapType, Schema, SchemaError};
use crate::value::{Map, Value};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

/// TypedValue is a value that has been checked against a schema type.
///
/// The value is held as a tree whose nodes know their resolved type, and
/// whose list items carry their identity. Subtrees are shared between
/// values derived from one another, so cloning is cheap.
#[derive(Debug, Clone)]
pub struct TypedValue {
    schema: Arc<Schema>,
    type_name: String,
    pub(crate) root: Tree,
}

/// A node of a typed value together with its resolved type.
#[derive(Debug, Clone)]
pub(crate) struct Tree {
    pub(crate) ty: Arc<Atom>,
    pub(crate) node: Node,
}

#[derive(Debug, Clone)]
pub(crate) enum Node {
    Null,
    Scalar(Value),
    /// An atomic map or list, kept as a single value.
    Atomic(Value),
    Map(Arc<BTreeMap<String, Tree>>),
    /// An associative list, in document order.
    List(Arc<Vec<Item>>),
}

#[derive(Debug, Clone)]
pub(crate) struct Item {
    pub(crate) id: PathElement,
    pub(crate) tree: Tree,
}

/// Validates `value` against the named type and builds its typed form.
pub fn as_typed(
    value: &Value,
    schema: &Arc<Schema>,
    type_name: &str,
) -> Result<TypedValue, ValidationErrors> {
    TypedValue::from_unstructured(schema, type_name, value)
}

impl TypedValue {
    /// Validates `value` against the named type and builds its typed form.
    ///
    /// Every problem found is reported, not only the first.
    pub fn from_unstructured(
        schema: &Arc<Schema>,
        type_name: &str,
        value: &Value,
    ) -> Result<TypedValue, ValidationErrors> {
        let ty = schema.resolve_named(type_name)?;
        let mut builder = Builder {
            schema,
            errors: ValidationErrors::new(),
        };
        let root = builder.build(value, ty, &Path::root());
        if !builder.errors.is_empty() {
            return Err(builder.errors);
        }
        Ok(TypedValue {
            schema: Arc::clone(schema),
            type_name: type_name.to_string(),
            root,
        })
    }

    /// A null value of the named type.
    pub fn empty(schema: &Arc<Schema>, type_name: &str) -> Result<TypedValue, SchemaError> {
        let ty = schema.resolve_named(type_name)?;
        Ok(TypedValue {
            schema: Arc::clone(schema),
            type_name: type_name.to_string(),
            root: Tree { ty, node: Node::Null },
        })
    }

    pub(crate) fn with_root(&self, root: Tree) -> TypedValue {
        TypedValue {
            schema: Arc::clone(&self.schema),
            type_name: self.type_name.clone(),
            root,
        }
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn is_null(&self) -> bool {
        matches!(self.root.node, Node::Null)
    }

    /// Converts back to a generic value. List order is preserved.
    pub fn to_unstructured(&self) -> Value {
        self.root.to_value()
    }

    /// Returns the generic value found at `path`, if any.
    pub fn value_at(&self, path: &Path) -> Option<Value> {
        let mut tree = &self.root;
        let mut elements = path.iter();
        while let Some(pe) = elements.next() {
            match (&tree.node, pe) {
                (Node::Map(children), PathElement::Field(name)) => {
                    tree = children.get(name)?;
                }
                (Node::List(items), id) => {
                    tree = &items.iter().find(|item| &item.id == id)?.tree;
                }
                (Node::Atomic(value), _) => {
                    // Atomic values have no node structure; walk the raw value.
                    let rest: Vec<PathElement> =
                        std::iter::once(pe.clone()).chain(elements.by_ref().cloned()).collect();
                    return raw_value_at(value, &rest).cloned();
                }
                _ => return None,
            }
        }
        Some(tree.to_value())
    }

    /// Returns the set of paths this value sets.
    ///
    /// Scalars, nulls and atomic values are members at their path. Empty maps
    /// and associative lists are members too, except at the root. Each
    /// associative list item is a member and is also walked.
    pub fn to_field_set(&self) -> Set {
        let mut set = Set::new();
        let mut path = Vec::new();
        self.root.collect_paths(&mut path, &mut set);
        set
    }
}

impl Tree {
    pub(crate) fn to_value(&self) -> Value {
        match &self.node {
            Node::Null => Value::Null,
            Node::Scalar(v) | Node::Atomic(v) => v.clone(),
            Node::Map(children) => Value::Map(
                children
                    .iter()
                    .map(|(k, t)| (k.clone(), t.to_value()))
                    .collect::<Map>(),
            ),
            Node::List(items) => Value::List(items.iter().map(|i| i.tree.to_value()).collect()),
        }
    }

    fn collect_paths(&self, path: &mut Vec<PathElement>, set: &mut Set) {
        match &self.node {
            Node::Null | Node::Scalar(_) | Node::Atomic(_) => {
                if !path.is_empty() {
                    set.insert(&Path::from(path.clone()));
                }
            }
            Node::Map(children) => {
                if children.is_empty() && !path.is_empty() {
                    set.insert(&Path::from(path.clone()));
                }
                for (name, child) in children.iter() {
                    path.push(PathElement::Field(name.clone()));
                    child.collect_paths(path, set);
                    path.pop();
                }
            }
            Node::List(items) => {
                if items.is_empty() && !path.is_empty() {
                    set.insert(&Path::from(path.clone()));
                }
                for item in items.iter() {
                    path.push(item.id.clone());
                    set.insert(&Path::from(path.clone()));
                    item.tree.collect_paths(path, set);
                    path.pop();
                }
            }
        }
    }
}

fn raw_value_at<'a>(value: &'a Value, path: &[PathElement]) -> Option<&'a Value> {
    let Some((first, rest)) = path.split_first() else {
        return Some(value);
    };
    let next = match (value, first) {
        (Value::Map(m), PathElement::Field(name)) => m.get(name)?,
        (Value::List(items), PathElement::Index(i)) => items.get(*i)?,
        (Value::List(items), PathElement::Value(v)) => items.iter().find(|item| *item == v)?,
        (Value::List(items), PathElement::Key(key)) => items.iter().find(|item| {
            key.iter()
                .all(|(name, v)| item.as_map().and_then(|m| m.get(name)) == Some(v))
        })?,
        _ => return None,
    };
    raw_value_at(next, rest)
}

struct Builder<'a> {
    schema: &'a Schema,
    errors: ValidationErrors,
}

impl Builder<'_> {
    fn resolve(&mut self, ty: &Arc<Atom>) -> Option<Arc<Atom>> {
        match self.schema.resolve(ty) {
            Ok(resolved) => Some(resolved),
            Err(e) => {
                self.errors.add(e.into());
                None
            }
        }
    }

    fn mismatch(&mut self, path: &Path, ty: &Atom, value: &Value) {
        self.errors
            .add(ValidationError::type_mismatch(path, ty.describe(), value.kind()));
    }

    /// Builds the tree for `value` at `path`. `ty` is already resolved.
    fn build(&mut self, value: &Value, ty: Arc<Atom>, path: &Path) -> Tree {
        let node = match (ty.as_ref(), value) {
            (_, Value::Null) => Node::Null,
            (Atom::Scalar(kind), v) => {
                if !kind.accepts(v) {
                    self.mismatch(path, &ty, v);
                }
                Node::Scalar(v.clone())
            }
            (Atom::Map(map), Value::Map(entries)) => self.build_map(map, entries, path),
            (Atom::List(list), Value::List(items)) => self.build_list(list, items, path),
            (Atom::Deduced, Value::Map(entries)) => {
                let children = entries
                    .iter()
                    .map(|(k, v)| {
                        let child = self.build(v, Arc::clone(&ty), &path.child(PathElement::field(k.as_str())));
                        (k.clone(), child)
                    })
                    .collect();
                Node::Map(Arc::new(children))
            }
            (Atom::Deduced, v @ Value::List(_)) => Node::Atomic(v.clone()),
            (Atom::Deduced, v) => Node::Scalar(v.clone()),
            (Atom::Named(_), _) => {
                return match self.resolve(&ty) {
                    Some(resolved) => self.build(value, resolved, path),
                    None => Tree { ty, node: Node::Null },
                };
            }
            (other, v) => {
                self.mismatch(path, other, v);
                Node::Null
            }
        };
        Tree { ty, node }
    }

    fn child(&mut self, value: &Value, ty: &Arc<Atom>, path: &Path) -> Tree {
        match self.resolve(ty) {
            Some(resolved) => self.build(value, resolved, path),
            None => Tree { ty: Arc::clone(ty), node: Node::Null },
        }
    }

    fn build_map(&mut self, map: &MapType, entries: &Map, path: &Path) -> Node {
        let mut children = BTreeMap::new();
        for (name, value) in entries {
            let Some(ty) = map.entry_type(name) else {
                self.errors.add(ValidationError::UnknownField {
                    path: path.clone(),
                    field: name.clone(),
                });
                continue;
            };
            let child = self.child(value, ty, &path.child(PathElement::field(name.as_str())));
            children.insert(name.clone(), child);
        }
        if map.is_atomic() {
            return Node::Atomic(Value::Map(entries.clone()));
        }
        Node::Map(Arc::new(children))
    }

    fn build_list(&mut self, list: &ListType, items: &[Value], path: &Path) -> Node {
        let keys = match &list.identity {
            ListIdentity::Atomic => {
                for (i, item) in items.iter().enumerate() {
                    self.child(item, &list.element, &path.child(PathElement::Index(i)));
                }
                return Node::Atomic(Value::List(items.to_vec()));
            }
            ListIdentity::ByKeys(keys) => Some(keys),
            ListIdentity::ByValue => None,
        };

        let mut seen = BTreeSet::new();
        let mut built = Vec::with_capacity(items.len());
        for (i, item) in items.iter().enumerate() {
            let id = match keys {
                Some(keys) => match self.key_of(list, keys, item, &path.child(PathElement::Index(i))) {
                    Some(key) => PathElement::Key(key),
                    None => continue,
                },
                None => PathElement::Value(item.clone()),
            };
            if !seen.insert(id.clone()) {
                self.errors.add(ValidationError::DuplicateIdentity {
                    path: path.clone(),
                    identity: id.to_string(),
                });
                continue;
            }
            let tree = self.child(item, &list.element, &path.child(id.clone()));
            built.push(Item { id, tree });
        }
        Node::List(Arc::new(built))
    }

    /// Computes the identity of a keyed list item, using field defaults for
    /// missing keys.
    fn key_of(
        &mut self,
        list: &ListType,
        keys: &[String],
        item: &Value,
        path: &Path,
    ) -> Option<KeyFields> {
        let Value::Map(entries) = item else {
            self.errors
                .add(ValidationError::type_mismatch(path, "map", item.kind()));
            return None;
        };
        let element = self.resolve(&list.element)?;
        let defaults = match element.as_ref() {
            Atom::Map(map) => Some(map),
            _ => None,
        };
        let mut fields = Vec::with_capacity(keys.len());
        let mut ok = true;
        for key in keys {
            let value = entries.get(key).cloned().or_else(|| {
                defaults
                    .and_then(|m| m.find_field(key))
                    .and_then(|f| f.default.clone())
            });
            match value {
                Some(v) if v.is_scalar() => fields.push((key.clone(), v)),
                Some(v) => {
                    self.errors.add(ValidationError::InvalidKeyValue {
                        path: path.clone(),
                        key: key.clone(),
                        actual: v.kind(),
                    });
                    ok = false;
                }
                None => {
                    self.errors.add(ValidationError::MissingMergeKey {
                        path: path.clone(),
                        key: key.clone(),
                    });
                    ok = false;
                }
            }
        }
        ok.then(|| KeyFields::new(fields))
    }
}
