//! Persistent set of paths, stored as a tree mirroring the document shape.

use super::path::{Path, PathElement};
use std::collections::btree_map;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Child sets keyed by the path element leading to them.
pub type SetNodeMap = BTreeMap<PathElement, Set>;

static NO_CHILDREN: SetNodeMap = BTreeMap::new();

/// Set is a set of [`Path`]s.
///
/// Each node records whether the path leading to it is a member and holds
/// the child sets below it. Nodes are shared between sets through `Arc` and
/// are never modified once shared: set operations return new sets that
/// reuse untouched subtrees of their inputs.
///
/// Invariant: a child set reachable from a node is never empty.
#[derive(Clone, Default, PartialEq, Eq, Hash)]
pub struct Set {
    member: bool,
    children: Option<Arc<SetNodeMap>>,
}

impl Set {
    /// The empty set.
    pub fn new() -> Self {
        Set::default()
    }

    /// A set holding only `path`.
    pub fn singleton(path: &Path) -> Self {
        path.as_slice()
            .iter()
            .rev()
            .fold(Set { member: true, children: None }, |child, pe| {
                let mut map = SetNodeMap::new();
                map.insert(pe.clone(), child);
                Set { member: false, children: Some(Arc::new(map)) }
            })
    }

    fn from_parts(member: bool, children: SetNodeMap) -> Self {
        Set {
            member,
            children: if children.is_empty() { None } else { Some(Arc::new(children)) },
        }
    }

    fn child_map(&self) -> &SetNodeMap {
        self.children.as_deref().unwrap_or(&NO_CHILDREN)
    }

    pub fn is_empty(&self) -> bool {
        !self.member && self.children.is_none()
    }

    /// True if the empty path (this node itself) is a member.
    pub fn contains_root(&self) -> bool {
        self.member
    }

    /// True if no path strictly below this node is a member.
    pub fn is_leaf(&self) -> bool {
        self.children.is_none()
    }

    /// Number of member paths.
    pub fn len(&self) -> usize {
        usize::from(self.member) + self.child_map().values().map(Set::len).sum::<usize>()
    }

    /// Returns true if the set contains the given path.
    pub fn has(&self, path: &Path) -> bool {
        self.subtree(path).is_some_and(|s| s.member)
    }

    /// Returns the set of suffixes of member paths that start with `path`,
    /// or `None` if no member lies at or below `path`.
    pub fn subtree(&self, path: &Path) -> Option<&Set> {
        let mut node = self;
        for pe in path {
            node = node.child_map().get(pe)?;
        }
        Some(node)
    }

    /// The child set reached through a single element.
    pub fn child(&self, pe: &PathElement) -> Option<&Set> {
        self.child_map().get(pe)
    }

    /// Iterates over the immediate children of this node.
    pub fn children(&self) -> btree_map::Iter<'_, PathElement, Set> {
        self.child_map().iter()
    }

    /// Adds `path` to the set. Nodes shared with other sets are copied
    /// before being modified.
    pub fn insert(&mut self, path: &Path) {
        let mut node = self;
        for pe in path {
            let map = Arc::make_mut(node.children.get_or_insert_with(Default::default));
            node = map.entry(pe.clone()).or_default();
        }
        node.member = true;
    }

    /// Returns the set with every member path prefixed by `prefix`.
    pub fn with_prefix(&self, prefix: &Path) -> Set {
        if self.is_empty() {
            return Set::new();
        }
        prefix.as_slice().iter().rev().fold(self.clone(), |child, pe| {
            let mut map = SetNodeMap::new();
            map.insert(pe.clone(), child);
            Set { member: false, children: Some(Arc::new(map)) }
        })
    }

    /// Returns the union of two sets.
    pub fn union(&self, other: &Set) -> Set {
        if other.is_empty() || self.same_node(other) {
            return self.clone();
        }
        if self.is_empty() {
            return other.clone();
        }
        let member = self.member || other.member;
        let children = match (&self.children, &other.children) {
            (None, None) => None,
            (Some(c), None) | (None, Some(c)) => Some(Arc::clone(c)),
            (Some(a), Some(b)) => {
                // Walk the smaller map, copying into the larger one.
                let (big, small) = if a.len() >= b.len() { (a, b) } else { (b, a) };
                let mut merged = SetNodeMap::clone(big);
                for (pe, child) in small.iter() {
                    let joined = match merged.get(pe) {
                        Some(existing) => existing.union(child),
                        None => child.clone(),
                    };
                    merged.insert(pe.clone(), joined);
                }
                Some(Arc::new(merged))
            }
        };
        Set { member, children }
    }

    /// Returns the paths present in both sets.
    pub fn intersection(&self, other: &Set) -> Set {
        if self.same_node(other) {
            return self.clone();
        }
        let (a, b) = (self.child_map(), other.child_map());
        let (small, big) = if a.len() <= b.len() { (a, b) } else { (b, a) };
        let children = small
            .iter()
            .filter_map(|(pe, child)| {
                let shared = child.intersection(big.get(pe)?);
                (!shared.is_empty()).then(|| (pe.clone(), shared))
            })
            .collect();
        Set::from_parts(self.member && other.member, children)
    }

    /// Returns the paths of `self` that are not in `other`.
    pub fn difference(&self, other: &Set) -> Set {
        if other.is_empty() {
            return self.clone();
        }
        if self.same_node(other) {
            return Set::new();
        }
        let member = self.member && !other.member;
        let Some(theirs) = other.children.as_deref() else {
            return Set { member, children: self.children.clone() };
        };
        let children = self
            .children()
            .filter_map(|(pe, child)| {
                let rest = match theirs.get(pe) {
                    Some(o) => child.difference(o),
                    None => child.clone(),
                };
                (!rest.is_empty()).then(|| (pe.clone(), rest))
            })
            .collect();
        Set::from_parts(member, children)
    }

    /// Removes every path that is a member of `prefixes` or lies below one.
    pub fn recursive_difference(&self, prefixes: &Set) -> Set {
        if prefixes.member {
            return Set::new();
        }
        if prefixes.is_empty() {
            return self.clone();
        }
        let children = self
            .children()
            .filter_map(|(pe, child)| {
                let rest = match prefixes.child(pe) {
                    Some(p) => child.recursive_difference(p),
                    None => child.clone(),
                };
                (!rest.is_empty()).then(|| (pe.clone(), rest))
            })
            .collect();
        Set::from_parts(self.member, children)
    }

    /// Keeps only the paths that are a member of `prefixes` or lie below one.
    pub fn under(&self, prefixes: &Set) -> Set {
        if prefixes.member {
            return self.clone();
        }
        let children = self
            .children()
            .filter_map(|(pe, child)| {
                let kept = child.under(prefixes.child(pe)?);
                (!kept.is_empty()).then(|| (pe.clone(), kept))
            })
            .collect();
        Set::from_parts(false, children)
    }

    /// Every member path, in path order.
    pub fn paths(&self) -> Paths<'_> {
        Paths::new(self, false)
    }

    /// Member paths that have no member below them, in path order.
    pub fn leaves(&self) -> Paths<'_> {
        Paths::new(self, true)
    }

    fn same_node(&self, other: &Set) -> bool {
        self.member == other.member
            && match (&self.children, &other.children) {
                (None, None) => true,
                (Some(a), Some(b)) => Arc::ptr_eq(a, b),
                _ => false,
            }
    }
}

impl FromIterator<Path> for Set {
    fn from_iter<T: IntoIterator<Item = Path>>(iter: T) -> Self {
        let mut set = Set::new();
        for path in iter {
            set.insert(&path);
        }
        set
    }
}

impl<'a> FromIterator<&'a Path> for Set {
    fn from_iter<T: IntoIterator<Item = &'a Path>>(iter: T) -> Self {
        let mut set = Set::new();
        for path in iter {
            set.insert(path);
        }
        set
    }
}

impl fmt::Debug for Set {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.paths().map(|p| p.to_string())).finish()
    }
}

impl fmt::Display for Set {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, path) in self.paths().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{}", path)?;
        }
        Ok(())
    }
}

/// Depth-first iterator over the member paths of a [`Set`].
///
/// The iterator borrows the set and can be recreated at any time; it yields
/// paths in their total order because children are visited in element order
/// and a node is reported before its descendants.
pub struct Paths<'a> {
    root: Option<&'a Set>,
    stack: Vec<btree_map::Iter<'a, PathElement, Set>>,
    prefix: Vec<PathElement>,
    leaves_only: bool,
}

impl<'a> Paths<'a> {
    fn new(set: &'a Set, leaves_only: bool) -> Self {
        Paths {
            root: Some(set),
            stack: vec![set.children()],
            prefix: Vec::new(),
            leaves_only,
        }
    }

    fn wanted(&self, node: &Set) -> bool {
        node.member && (!self.leaves_only || node.is_leaf())
    }
}

impl Iterator for Paths<'_> {
    type Item = Path;

    fn next(&mut self) -> Option<Path> {
        if let Some(root) = self.root.take() {
            if self.wanted(root) {
                return Some(Path::root());
            }
        }
        loop {
            let top = self.stack.last_mut()?;
            match top.next() {
                Some((pe, child)) => {
                    self.prefix.push(pe.clone());
                    self.stack.push(child.children());
                    if self.wanted(child) {
                        return Some(Path::from(self.prefix.clone()));
                    }
                }
                None => {
                    // prefix is one shorter than the stack; the root frame has no element.
                    self.stack.pop();
                    self.prefix.pop();
                }
            }
        }
    }
}
