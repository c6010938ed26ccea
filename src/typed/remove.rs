//! Removal of released fields from a typed value.

use super::typed_value::{Item, Node, Tree, TypedValue};
use crate::fieldpath::{PathElement, Set};
use crate::schema::{Atom, ListIdentity};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::trace;

impl TypedValue {
    /// Removes the paths in `to_remove` unless something in `keep` lies at or
    /// below them.
    ///
    /// Maps and associative lists left empty by the removal are removed as
    /// well, unless they are the root, a field the schema marks as required,
    /// or themselves a member of `keep`. The key fields of an associative list
    /// item that stays are never removed.
    pub fn remove_items(&self, to_remove: &Set, keep: &Set) -> TypedValue {
        if to_remove.is_empty() {
            return self.clone();
        }
        let root = Rules {
            pinned: true,
            ..Rules::default()
        };
        match prune(&self.root, Some(to_remove), Some(keep), root) {
            Some(tree) => self.with_root(tree),
            None => self.clone(),
        }
    }
}

#[derive(Clone, Copy, Default)]
struct Rules<'a> {
    /// The node is never removed.
    pinned: bool,
    /// The node survives becoming empty.
    required: bool,
    /// Names of children that are pinned.
    key_fields: &'a [String],
}

/// Returns the pruned tree, or `None` if the node goes away.
fn prune(tree: &Tree, remove: Option<&Set>, keep: Option<&Set>, rules: Rules<'_>) -> Option<Tree> {
    let Some(remove) = remove else {
        return Some(tree.clone());
    };
    if remove.contains_root() && keep.is_none() && !rules.pinned {
        return None;
    }
    let keep_child = |pe: &PathElement| keep.and_then(|k| k.child(pe));
    let may_vanish =
        !rules.pinned && !rules.required && !keep.is_some_and(Set::contains_root);

    let node = match &tree.node {
        Node::Map(children) => {
            let map_type = match tree.ty.as_ref() {
                Atom::Map(map) => Some(map),
                _ => None,
            };
            let mut kept = BTreeMap::new();
            for (name, child) in children.iter() {
                let pe = PathElement::Field(name.clone());
                let child_rules = Rules {
                    pinned: rules.key_fields.contains(name),
                    required: map_type
                        .and_then(|m| m.find_field(name))
                        .is_some_and(|f| f.required),
                    key_fields: &[],
                };
                match prune(child, remove.child(&pe), keep_child(&pe), child_rules) {
                    Some(next) => {
                        kept.insert(name.clone(), next);
                    }
                    None => trace!(field = %name, "removed field"),
                }
            }
            if kept.is_empty() && !children.is_empty() && may_vanish {
                return None;
            }
            Node::Map(Arc::new(kept))
        }
        Node::List(items) => {
            let key_fields: &[String] = match tree.ty.as_ref() {
                Atom::List(list) => match &list.identity {
                    ListIdentity::ByKeys(keys) => keys,
                    _ => &[],
                },
                _ => &[],
            };
            let mut kept = Vec::with_capacity(items.len());
            for item in items.iter() {
                let item_rules = Rules {
                    key_fields,
                    ..Rules::default()
                };
                match prune(&item.tree, remove.child(&item.id), keep_child(&item.id), item_rules) {
                    Some(tree) => kept.push(Item { id: item.id.clone(), tree }),
                    None => trace!(item = %item.id, "removed list item"),
                }
            }
            if kept.is_empty() && !items.is_empty() && may_vanish {
                return None;
            }
            Node::List(Arc::new(kept))
        }
        other => other.clone(),
    };
    Some(Tree {
        ty: Arc::clone(&tree.ty),
        node,
    })
}
