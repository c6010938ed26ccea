//! Structural overlay of one typed value onto another.

use super::typed_value::{Item, Node, Tree, TypedValue};
use crate::fieldpath::PathElement;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

impl TypedValue {
    /// Overlays `obj` onto this value and returns the result.
    ///
    /// Map entries and associative list items present in `obj` are merged
    /// into the matching entry of `self`; everything else `obj` sets (scalars,
    /// nulls, atomic values, shape changes) replaces what was there. Entries
    /// `obj` does not mention are kept unchanged.
    ///
    /// List items already present keep their position. Items new to the list
    /// are appended in the order `obj` lists them.
    ///
    /// A null `obj` is the empty document and changes nothing.
    pub fn overlay(&self, obj: &TypedValue) -> TypedValue {
        debug_assert_eq!(self.type_name(), obj.type_name(), "overlaying values of different types");
        if obj.is_null() {
            return self.clone();
        }
        self.with_root(overlay_tree(&self.root, &obj.root))
    }
}

fn overlay_tree(live: &Tree, obj: &Tree) -> Tree {
    match (&live.node, &obj.node) {
        (Node::Map(a), Node::Map(b)) => {
            if b.is_empty() || Arc::ptr_eq(a, b) {
                return live.clone();
            }
            let mut merged = BTreeMap::clone(a);
            for (name, theirs) in b.iter() {
                let next = match a.get(name) {
                    Some(ours) => overlay_tree(ours, theirs),
                    None => theirs.clone(),
                };
                merged.insert(name.clone(), next);
            }
            Tree {
                ty: Arc::clone(&obj.ty),
                node: Node::Map(Arc::new(merged)),
            }
        }
        (Node::List(a), Node::List(b)) => {
            if b.is_empty() || Arc::ptr_eq(a, b) {
                return live.clone();
            }
            let incoming: BTreeMap<&PathElement, &Tree> =
                b.iter().map(|item| (&item.id, &item.tree)).collect();
            let mut items: Vec<Item> = a
                .iter()
                .map(|item| match incoming.get(&item.id) {
                    Some(theirs) => Item {
                        id: item.id.clone(),
                        tree: overlay_tree(&item.tree, theirs),
                    },
                    None => item.clone(),
                })
                .collect();
            let present: BTreeSet<&PathElement> = a.iter().map(|item| &item.id).collect();
            items.extend(b.iter().filter(|item| !present.contains(&item.id)).cloned());
            Tree {
                ty: Arc::clone(&obj.ty),
                node: Node::List(Arc::new(items)),
            }
        }
        _ => obj.clone(),
    }
}
