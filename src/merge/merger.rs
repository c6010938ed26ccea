//! Folding of manager operations into a live object.

use super::{Conflict, Conflicts, Operation};
use crate::fieldpath::{ManagedFields, Set, VersionedSet};
use crate::schema::{Schema, SchemaError};
use crate::typed::{TypedValue, ValidationErrors};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, trace};

/// Errors that abort a merge. Conflicts are not errors; see [`MergeOutcome`].
#[derive(Debug, Error)]
pub enum MergeError {
    #[error("operation {index} from manager {manager:?} is invalid: {errors}")]
    Validation {
        index: usize,
        manager: String,
        errors: ValidationErrors,
    },

    #[error(transparent)]
    Schema(#[from] SchemaError),
}

/// MergeState is the live object and who owns which of its fields.
#[derive(Debug, Clone)]
pub struct MergeState {
    pub live: TypedValue,
    pub managers: ManagedFields,
}

impl MergeState {
    pub fn new(live: TypedValue, managers: ManagedFields) -> Self {
        MergeState { live, managers }
    }

    /// A null object of the named type with no owners.
    pub fn empty(schema: &Arc<Schema>, type_name: &str) -> Result<Self, SchemaError> {
        Ok(MergeState {
            live: TypedValue::empty(schema, type_name)?,
            managers: ManagedFields::new(),
        })
    }
}

/// MergeOutcome is the state after every operation, plus the conflicts that
/// caused operations to be rejected.
#[derive(Debug, Clone)]
pub struct MergeOutcome {
    pub live: TypedValue,
    pub managers: ManagedFields,
    pub conflicts: Conflicts,
}

/// MergerBuilder is a builder for creating a Merger.
#[derive(Debug, Default)]
pub struct MergerBuilder {
    ignored_fields: Set,
}

impl MergerBuilder {
    pub fn new() -> Self {
        MergerBuilder::default()
    }

    /// Fields, and everything below them, that no manager ever owns. They
    /// are still written to the live object.
    pub fn ignored_fields(mut self, fields: Set) -> Self {
        self.ignored_fields = fields;
        self
    }

    pub fn build(self) -> Merger {
        Merger {
            ignored_fields: self.ignored_fields,
        }
    }
}

/// Merger folds operations into a live object, one at a time, in order.
#[derive(Debug, Clone, Default)]
pub struct Merger {
    ignored_fields: Set,
}

/// Merges `ops` into an empty object of the named type, starting from
/// `prior_managers`.
pub fn merge(
    schema: &Arc<Schema>,
    type_name: &str,
    prior_managers: ManagedFields,
    ops: &[Operation],
) -> Result<MergeOutcome, MergeError> {
    let state = MergeState::new(TypedValue::empty(schema, type_name)?, prior_managers);
    Merger::default().merge(state, ops)
}

impl Merger {
    pub fn builder() -> MergerBuilder {
        MergerBuilder::new()
    }

    /// Applies each operation to `state` in turn.
    ///
    /// An operation whose object does not validate aborts the whole merge
    /// with an error. An apply that conflicts with another manager is
    /// skipped; its conflicts are reported in the outcome and the following
    /// operations still run.
    pub fn merge(&self, state: MergeState, ops: &[Operation]) -> Result<MergeOutcome, MergeError> {
        let MergeState { mut live, mut managers } = state;
        let mut conflicts = Conflicts::new();

        for (index, op) in ops.iter().enumerate() {
            let manager = op.manager();
            let obj = TypedValue::from_unstructured(live.schema(), live.type_name(), op.object())
                .map_err(|errors| MergeError::Validation {
                    index,
                    manager: manager.to_string(),
                    errors,
                })?;
            let touched = obj.to_field_set().recursive_difference(&self.ignored_fields);
            debug!(
                index,
                manager = %manager,
                kind = op.kind(),
                version = %op.api_version(),
                touched = touched.len(),
                "merging operation"
            );

            match op {
                Operation::Update { api_version, .. } => {
                    live = live.overlay(&obj);
                    let owned = managers.owned_by(manager).union(&touched);
                    managers.insert(manager, VersionedSet::new(owned, api_version.clone(), false));
                }
                Operation::Apply { api_version, force, .. } => {
                    let merged = live.overlay(&obj);
                    let changed = live
                        .compare(&merged)
                        .changed()
                        .recursive_difference(&self.ignored_fields);

                    if !force {
                        let found = find_conflicts(index, manager, &live, &obj, &managers, &changed);
                        if !found.is_empty() {
                            debug!(index, manager = %manager, conflicts = found.len(), "apply rejected");
                            conflicts.extend(found);
                            continue;
                        }
                    }

                    let previous = managers.owned_by(manager);
                    managers.retain_others(manager, |owned| {
                        owned.difference(&touched).recursive_difference(&changed)
                    });
                    managers.insert(manager, VersionedSet::new(touched.clone(), api_version.clone(), true));

                    let released = previous.difference(&touched);
                    let to_remove = released.difference(&managers.owned_by_others(manager));
                    if !to_remove.is_empty() {
                        debug!(
                            index,
                            manager = %manager,
                            released = released.len(),
                            removed = to_remove.len(),
                            "removing released fields"
                        );
                    }
                    live = merged.remove_items(&to_remove, &managers.all_owned());
                }
            }
        }

        Ok(MergeOutcome {
            live,
            managers,
            conflicts,
        })
    }
}

/// Every path another manager owns at or below a path this apply changes.
fn find_conflicts(
    index: usize,
    manager: &str,
    live: &TypedValue,
    obj: &TypedValue,
    managers: &ManagedFields,
    changed: &Set,
) -> Conflicts {
    let mut found = Conflicts::new();
    if changed.is_empty() {
        return found;
    }
    for (owner, vs) in managers.iter().filter(|(owner, _)| owner.as_str() != manager) {
        for path in vs.set.under(changed).paths() {
            trace!(owner = %owner, path = %path, "conflict");
            found.add(Conflict {
                index,
                manager: manager.to_string(),
                owner: owner.clone(),
                live_value: live.value_at(&path),
                applied_value: obj.value_at(&path),
                path,
            });
        }
    }
    found
}
