//! Comparison of typed values.

use super::typed_value::{Item, Node, Tree, TypedValue};
use crate::fieldpath::{Path, PathElement, Set};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Comparison holds the result of comparing two TypedValues.
///
/// No field will appear in more than one of the three fieldsets.
/// If all of the fieldsets are empty, then the objects must have been equal
/// up to the order of associative list items.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Comparison {
    /// Fields that were in the left-hand side but not the right-hand side.
    pub removed: Set,
    /// Fields that were in both but had different values.
    pub modified: Set,
    /// Fields that were in the right-hand side but not the left-hand side.
    pub added: Set,
}

impl Comparison {
    pub fn new() -> Self {
        Comparison::default()
    }

    /// Returns true if there are no changes.
    pub fn is_same(&self) -> bool {
        self.removed.is_empty() && self.modified.is_empty() && self.added.is_empty()
    }

    /// Paths whose value the right-hand side sets differently: modified or added.
    pub fn changed(&self) -> Set {
        self.modified.union(&self.added)
    }

    /// Excludes the given fields, and everything below them, from the result.
    pub fn exclude_fields(&mut self, fields: &Set) {
        self.removed = self.removed.recursive_difference(fields);
        self.modified = self.modified.recursive_difference(fields);
        self.added = self.added.recursive_difference(fields);
    }
}

impl fmt::Display for Comparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sections = [
            ("Modified", &self.modified),
            ("Added", &self.added),
            ("Removed", &self.removed),
        ];
        let mut first = true;
        for (label, set) in sections {
            if set.is_empty() {
                continue;
            }
            if !first {
                writeln!(f)?;
            }
            first = false;
            write!(f, "- {} Fields:", label)?;
            for path in set.paths() {
                write!(f, "\n  {}", path)?;
            }
        }
        Ok(())
    }
}

impl TypedValue {
    /// Compares this value with `rhs`, which must have the same type.
    ///
    /// Map entries are matched by key and associative list items by identity;
    /// reordering list items is not a change. A null root is treated as an
    /// empty document, so its comparison with an object reports fields rather
    /// than the root.
    pub fn compare(&self, rhs: &TypedValue) -> Comparison {
        debug_assert_eq!(self.type_name(), rhs.type_name(), "comparing values of different types");
        let mut walker = Walker::default();
        let mut path = Vec::new();
        match (&self.root.node, &rhs.root.node) {
            (Node::Null, Node::Null) => {}
            (Node::Null, _) => walker.one_sided(&rhs.root, &mut path, Side::Added),
            (_, Node::Null) => walker.one_sided(&self.root, &mut path, Side::Removed),
            _ => walker.walk(&self.root, &rhs.root, &mut path),
        }
        walker.result
    }
}

#[derive(Clone, Copy)]
enum Side {
    Added,
    Removed,
}

#[derive(Default)]
struct Walker {
    result: Comparison,
}

impl Walker {
    fn record(&mut self, side: Side, path: &[PathElement]) {
        let path = Path::from(path.to_vec());
        match side {
            Side::Added => self.result.added.insert(&path),
            Side::Removed => self.result.removed.insert(&path),
        }
    }

    fn modified(&mut self, path: &[PathElement]) {
        self.result.modified.insert(&Path::from(path.to_vec()));
    }

    /// Reports the children of a root that only one side has.
    fn one_sided(&mut self, tree: &Tree, path: &mut Vec<PathElement>, side: Side) {
        match &tree.node {
            Node::Map(children) => {
                for name in children.keys() {
                    path.push(PathElement::Field(name.clone()));
                    self.record(side, path);
                    path.pop();
                }
            }
            Node::List(items) => {
                for item in items.iter() {
                    path.push(item.id.clone());
                    self.record(side, path);
                    path.pop();
                }
            }
            _ => self.modified(path),
        }
    }

    fn walk(&mut self, lhs: &Tree, rhs: &Tree, path: &mut Vec<PathElement>) {
        match (&lhs.node, &rhs.node) {
            (Node::Null, Node::Null) => {}
            (Node::Scalar(a), Node::Scalar(b)) | (Node::Atomic(a), Node::Atomic(b)) => {
                if a != b {
                    self.modified(path);
                }
            }
            (Node::Map(a), Node::Map(b)) => {
                if !Arc::ptr_eq(a, b) {
                    self.walk_map(a, b, path);
                }
            }
            (Node::List(a), Node::List(b)) => {
                if !Arc::ptr_eq(a, b) {
                    self.walk_list(a, b, path);
                }
            }
            // Different shapes, or null against a value.
            _ => self.modified(path),
        }
    }

    fn walk_map(
        &mut self,
        lhs: &BTreeMap<String, Tree>,
        rhs: &BTreeMap<String, Tree>,
        path: &mut Vec<PathElement>,
    ) {
        for (name, left) in lhs {
            path.push(PathElement::Field(name.clone()));
            match rhs.get(name) {
                Some(right) => self.walk(left, right, path),
                None => self.record(Side::Removed, path),
            }
            path.pop();
        }
        for name in rhs.keys().filter(|k| !lhs.contains_key(*k)) {
            path.push(PathElement::Field(name.clone()));
            self.record(Side::Added, path);
            path.pop();
        }
    }

    fn walk_list(&mut self, lhs: &[Item], rhs: &[Item], path: &mut Vec<PathElement>) {
        let right: BTreeMap<&PathElement, &Tree> =
            rhs.iter().map(|item| (&item.id, &item.tree)).collect();
        let left: BTreeMap<&PathElement, &Tree> =
            lhs.iter().map(|item| (&item.id, &item.tree)).collect();
        for (id, tree) in &left {
            path.push((*id).clone());
            match right.get(id) {
                Some(other) => self.walk(tree, other, path),
                None => self.record(Side::Removed, path),
            }
            path.pop();
        }
        for id in right.keys().filter(|id| !left.contains_key(*id)) {
            path.push((*id).clone());
            self.record(Side::Added, path);
            path.pop();
        }
    }
}
