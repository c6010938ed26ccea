//! Path element and path types.

use crate::value::Value;
use std::fmt;

/// KeyFields is the identity of an associative list item: the values of the
/// list's key fields, sorted by field name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct KeyFields(Vec<(String, Value)>);

impl KeyFields {
    /// Builds a key from name/value pairs. Order of the input does not matter.
    pub fn new<K: Into<String>>(fields: impl IntoIterator<Item = (K, Value)>) -> Self {
        let mut fields: Vec<(String, Value)> =
            fields.into_iter().map(|(k, v)| (k.into(), v)).collect();
        fields.sort_by(|a, b| a.0.cmp(&b.0));
        KeyFields(fields)
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(n, v)| (n.as_str(), v))
    }
}

/// PathElement represents one step into a document.
///
/// Elements are totally ordered by kind (in declaration order) and then by
/// payload, so paths built from them sort deterministically.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PathElement {
    /// A map key or struct field.
    Field(String),
    /// An associative list item selected by its key fields.
    Key(KeyFields),
    /// A list item selected by its own value (sets).
    Value(Value),
    /// A positional index. Only used for reporting inside atomic lists.
    Index(usize),
}

impl PathElement {
    pub fn field(name: impl Into<String>) -> Self {
        PathElement::Field(name.into())
    }

    pub fn key<K: Into<String>>(fields: impl IntoIterator<Item = (K, Value)>) -> Self {
        PathElement::Key(KeyFields::new(fields))
    }

    pub fn value(v: impl Into<Value>) -> Self {
        PathElement::Value(v.into())
    }

    pub fn index(i: usize) -> Self {
        PathElement::Index(i)
    }

    pub fn as_field(&self) -> Option<&str> {
        match self {
            PathElement::Field(name) => Some(name),
            _ => None,
        }
    }
}

impl fmt::Display for PathElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathElement::Field(name) => write!(f, ".{}", name),
            PathElement::Key(key) => {
                f.write_str("[")?;
                for (i, (name, value)) in key.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{}={}", name, value)?;
                }
                f.write_str("]")
            }
            PathElement::Value(v) => write!(f, "[={}]", v),
            PathElement::Index(i) => write!(f, "[{}]", i),
        }
    }
}

/// Path is an immutable sequence of path elements, addressing one node.
///
/// Paths compare lexicographically, so a path sorts right before its
/// extensions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Path(Vec<PathElement>);

impl Path {
    /// The empty path, addressing the root.
    pub fn root() -> Self {
        Path(Vec::new())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PathElement> {
        self.0.iter()
    }

    pub fn as_slice(&self) -> &[PathElement] {
        &self.0
    }

    pub fn last(&self) -> Option<&PathElement> {
        self.0.last()
    }

    /// Returns a new path with `element` appended.
    pub fn child(&self, element: PathElement) -> Path {
        let mut elements = Vec::with_capacity(self.0.len() + 1);
        elements.extend_from_slice(&self.0);
        elements.push(element);
        Path(elements)
    }

    /// Returns this path followed by every element of `suffix`.
    pub fn join(&self, suffix: &Path) -> Path {
        let mut elements = self.0.clone();
        elements.extend_from_slice(&suffix.0);
        Path(elements)
    }

    /// Returns the path without its last element, or `None` for the root.
    pub fn parent(&self) -> Option<Path> {
        let (_, rest) = self.0.split_last()?;
        Some(Path(rest.to_vec()))
    }

    /// True if `self` is `other` or one of its ancestors.
    pub fn is_prefix_of(&self, other: &Path) -> bool {
        other.0.starts_with(&self.0)
    }
}

impl From<Vec<PathElement>> for Path {
    fn from(elements: Vec<PathElement>) -> Self {
        Path(elements)
    }
}

impl FromIterator<PathElement> for Path {
    fn from_iter<T: IntoIterator<Item = PathElement>>(iter: T) -> Self {
        Path(iter.into_iter().collect())
    }
}

impl IntoIterator for Path {
    type Item = PathElement;
    type IntoIter = std::vec::IntoIter<PathElement>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a Path {
    type Item = &'a PathElement;
    type IntoIter = std::slice::Iter<'a, PathElement>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("<root>");
        }
        for element in &self.0 {
            write!(f, "{}", element)?;
        }
        Ok(())
    }
}
