//! Field path module - Paths into documents, sets of paths, and per-manager
//! ownership of those sets.

mod path;
mod set;

pub use path::*;
pub use set::*;

use std::collections::BTreeMap;
use std::fmt;

/// APIVersion is the version label a manager wrote its object with.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct APIVersion(String);

impl APIVersion {
    pub fn new(version: impl Into<String>) -> Self {
        APIVersion(version.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for APIVersion {
    fn from(s: &str) -> Self {
        APIVersion(s.to_string())
    }
}

impl From<String> for APIVersion {
    fn from(s: String) -> Self {
        APIVersion(s)
    }
}

impl fmt::Display for APIVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// VersionedSet is what one manager owns, along with the version it last
/// wrote and whether that write was an apply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionedSet {
    pub set: Set,
    pub api_version: APIVersion,
    pub applied: bool,
}

impl VersionedSet {
    pub fn new(set: Set, api_version: APIVersion, applied: bool) -> Self {
        VersionedSet { set, api_version, applied }
    }
}

/// ManagedFields maps manager names to the fields they own.
///
/// Entries whose set is empty are never stored. Iteration is ordered by
/// manager name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ManagedFields {
    managers: BTreeMap<String, VersionedSet>,
}

impl ManagedFields {
    pub fn new() -> Self {
        ManagedFields::default()
    }

    pub fn len(&self) -> usize {
        self.managers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.managers.is_empty()
    }

    pub fn get(&self, manager: &str) -> Option<&VersionedSet> {
        self.managers.get(manager)
    }

    /// The set owned by `manager`, or the empty set.
    pub fn owned_by(&self, manager: &str) -> Set {
        self.managers.get(manager).map(|vs| vs.set.clone()).unwrap_or_default()
    }

    /// Stores `vs` for `manager`, or removes the manager if the set is empty.
    pub fn insert(&mut self, manager: impl Into<String>, vs: VersionedSet) {
        let manager = manager.into();
        if vs.set.is_empty() {
            self.managers.remove(&manager);
        } else {
            self.managers.insert(manager, vs);
        }
    }

    pub fn remove(&mut self, manager: &str) -> Option<VersionedSet> {
        self.managers.remove(manager)
    }

    pub fn contains(&self, manager: &str) -> bool {
        self.managers.contains_key(manager)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &VersionedSet)> {
        self.managers.iter()
    }

    pub fn managers(&self) -> impl Iterator<Item = &String> {
        self.managers.keys()
    }

    /// Union of every manager's set.
    pub fn all_owned(&self) -> Set {
        self.managers.values().fold(Set::new(), |acc, vs| acc.union(&vs.set))
    }

    /// Union of the sets of every manager except `manager`.
    pub fn owned_by_others(&self, manager: &str) -> Set {
        self.managers
            .iter()
            .filter(|(name, _)| name.as_str() != manager)
            .fold(Set::new(), |acc, (_, vs)| acc.union(&vs.set))
    }

    /// Managers whose set contains `path`.
    pub fn owners_of<'a>(&'a self, path: &'a Path) -> impl Iterator<Item = &'a str> + 'a {
        self.managers
            .iter()
            .filter(move |(_, vs)| vs.set.has(path))
            .map(|(name, _)| name.as_str())
    }

    /// Applies `f` to every manager other than `manager`, dropping any entry
    /// left empty.
    pub fn retain_others(&mut self, manager: &str, mut f: impl FnMut(&Set) -> Set) {
        self.managers.retain(|name, vs| {
            if name != manager {
                vs.set = f(&vs.set);
            }
            !vs.set.is_empty()
        });
    }
}

impl FromIterator<(String, VersionedSet)> for ManagedFields {
    fn from_iter<T: IntoIterator<Item = (String, VersionedSet)>>(iter: T) -> Self {
        let mut mf = ManagedFields::new();
        for (manager, vs) in iter {
            mf.insert(manager, vs);
        }
        mf
    }
}

impl fmt::Display for ManagedFields {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (manager, vs) in &self.managers {
            writeln!(f, "{}:", manager)?;
            writeln!(f, "- Applied: {}", vs.applied)?;
            writeln!(f, "- APIVersion: {}", vs.api_version)?;
            writeln!(f, "- Set: {:?}", vs.set)?;
        }
        Ok(())
    }
}
