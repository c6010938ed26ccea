//! Conflict types for merge operations.

use crate::fieldpath::{Path, Set};
use crate::value::Value;
use std::fmt;

/// Conflict is one field an apply tried to change while another manager
/// owned it.
#[derive(Debug, Clone, PartialEq)]
pub struct Conflict {
    /// Position of the rejected operation in the submitted sequence.
    pub index: usize,
    /// The manager whose apply was rejected.
    pub manager: String,
    /// The manager that owns the field.
    pub owner: String,
    pub path: Path,
    /// Value at `path` in the live object, if any.
    pub live_value: Option<Value>,
    /// Value at `path` in the applied object, if any.
    pub applied_value: Option<Value>,
}

struct OptionalValue<'a>(&'a Option<Value>);

impl fmt::Display for OptionalValue<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(v) => write!(f, "{}", v),
            None => f.write_str("<unset>"),
        }
    }
}

impl fmt::Display for Conflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "operation {} by {:?} conflicts with {:?} at {} (live {}, applied {})",
            self.index,
            self.manager,
            self.owner,
            self.path,
            OptionalValue(&self.live_value),
            OptionalValue(&self.applied_value),
        )
    }
}

impl std::error::Error for Conflict {}

/// Conflicts is a collection of conflicts.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Conflicts {
    conflicts: Vec<Conflict>,
}

impl Conflicts {
    pub fn new() -> Self {
        Conflicts::default()
    }

    pub fn add(&mut self, conflict: Conflict) {
        self.conflicts.push(conflict);
    }

    pub fn extend(&mut self, other: Conflicts) {
        self.conflicts.extend(other.conflicts);
    }

    pub fn is_empty(&self) -> bool {
        self.conflicts.is_empty()
    }

    pub fn len(&self) -> usize {
        self.conflicts.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Conflict> {
        self.conflicts.iter()
    }

    /// Conflicts raised by the operation at `index`.
    pub fn for_operation(&self, index: usize) -> impl Iterator<Item = &Conflict> {
        self.conflicts.iter().filter(move |c| c.index == index)
    }

    /// The conflicting paths as a Set.
    pub fn to_set(&self) -> Set {
        self.conflicts.iter().map(|c| &c.path).collect()
    }
}

impl IntoIterator for Conflicts {
    type Item = Conflict;
    type IntoIter = std::vec::IntoIter<Conflict>;

    fn into_iter(self) -> Self::IntoIter {
        self.conflicts.into_iter()
    }
}

impl fmt::Display for Conflicts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, conflict) in self.conflicts.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{}", conflict)?;
        }
        Ok(())
    }
}

impl std::error::Error for Conflicts {}
