//! Tests for folding update and apply operations.

#[cfg(test)]
mod tests {
    use crate::fieldpath::{APIVersion, ManagedFields, Path, PathElement, Set, VersionedSet};
    use crate::merge::{merge, MergeError, MergeOutcome, MergeState, Merger, Operation};
    use crate::schema::Schema;
    use crate::typed::TypedValue;
    use crate::value::{from_yaml, Value};
    use pretty_assertions::assert_eq;
    use std::sync::Arc;

    const SCHEMA: &str = r#"types:
- name: obj
  map:
    fields:
    - name: x
      type:
        scalar: numeric
    - name: y
      type:
        scalar: string
    - name: labels
      type:
        map:
          elementType:
            scalar: string
    - name: items
      type:
        list:
          elementType:
            namedType: item
          elementRelationship: associative
          keys: [name]
    - name: tags
      type:
        list:
          elementType:
            scalar: string
          elementRelationship: associative
    - name: status
      type:
        map:
          elementType:
            scalar: string
- name: item
  map:
    fields:
    - name: name
      type:
        scalar: string
    - name: value
      type:
        scalar: numeric
"#;

    fn schema() -> Arc<Schema> {
        Arc::new(Schema::from_yaml(SCHEMA).unwrap())
    }

    fn yaml(s: &str) -> Value {
        from_yaml(s).unwrap()
    }

    fn apply(manager: &str, object: &str) -> Operation {
        Operation::apply(manager, "v1", yaml(object))
    }

    fn force_apply(manager: &str, object: &str) -> Operation {
        Operation::force_apply(manager, "v1", yaml(object))
    }

    fn update(manager: &str, object: &str) -> Operation {
        Operation::update(manager, "v1", yaml(object))
    }

    fn run(ops: &[Operation]) -> MergeOutcome {
        merge(&schema(), "obj", ManagedFields::new(), ops).unwrap()
    }

    fn field(name: &str) -> PathElement {
        PathElement::field(name)
    }

    fn item(name: &str) -> PathElement {
        PathElement::key([("name", Value::from(name))])
    }

    fn set(paths: Vec<Vec<PathElement>>) -> Set {
        paths.into_iter().map(Path::from).collect()
    }

    fn assert_live(outcome: &MergeOutcome, expected: &str) {
        assert_eq!(outcome.live.to_unstructured(), yaml(expected));
    }

    #[test]
    fn test_update_unions_ownership() {
        let outcome = run(&[update("a", "x: 1"), update("a", "y: one")]);
        assert_live(&outcome, "x: 1\ny: one");
        assert_eq!(
            outcome.managers.get("a"),
            Some(&VersionedSet::new(
                set(vec![vec![field("x")], vec![field("y")]]),
                APIVersion::new("v1"),
                false,
            ))
        );
        assert!(outcome.conflicts.is_empty());
    }

    #[test]
    fn test_update_overwrites_without_conflict() {
        let outcome = run(&[apply("a", "x: 1"), update("b", "x: 2")]);
        assert_live(&outcome, "x: 2");
        assert!(outcome.conflicts.is_empty());
        assert!(outcome.managers.owned_by("a").has(&Path::from(vec![field("x")])));
        assert!(outcome.managers.owned_by("b").has(&Path::from(vec![field("x")])));
    }

    #[test]
    fn test_apply_replaces_ownership_and_releases() {
        let outcome = run(&[apply("a", "x: 1\ny: one"), apply("a", "x: 1")]);
        assert_live(&outcome, "x: 1");
        assert_eq!(outcome.managers.owned_by("a"), set(vec![vec![field("x")]]));
        assert!(outcome.managers.get("a").unwrap().applied);
    }

    #[test]
    fn test_apply_keeps_fields_shared_with_updater() {
        let outcome = run(&[
            apply("a", "x: 1\ny: one"),
            update("b", "y: one"),
            apply("a", "x: 1"),
        ]);
        assert_live(&outcome, "x: 1\ny: one");
        assert_eq!(outcome.managers.owned_by("a"), set(vec![vec![field("x")]]));
        assert_eq!(outcome.managers.owned_by("b"), set(vec![vec![field("y")]]));
    }

    #[test]
    fn test_release_prunes_emptied_maps() {
        let outcome = run(&[apply("a", "x: 1\nlabels: {app: web}"), apply("a", "x: 1")]);
        assert_live(&outcome, "x: 1");
    }

    #[test]
    fn test_conflict_rejects_apply_and_continues() {
        let outcome = run(&[
            update("b", "x: 1"),
            apply("a", "x: 2\ny: one"),
            apply("a", "y: two"),
        ]);
        assert_live(&outcome, "x: 1\ny: two");

        assert_eq!(outcome.conflicts.len(), 1);
        let conflict = outcome.conflicts.iter().next().unwrap();
        assert_eq!(conflict.index, 1);
        assert_eq!(conflict.manager, "a");
        assert_eq!(conflict.owner, "b");
        assert_eq!(conflict.path, Path::from(vec![field("x")]));
        assert_eq!(conflict.live_value, Some(Value::from(1)));
        assert_eq!(conflict.applied_value, Some(Value::from(2)));

        assert_eq!(outcome.managers.owned_by("a"), set(vec![vec![field("y")]]));
        assert_eq!(outcome.managers.owned_by("b"), set(vec![vec![field("x")]]));
    }

    #[test]
    fn test_conflicts_are_collected_per_path() {
        let outcome = run(&[
            update("b", "x: 1\nlabels: {app: web, tier: db}"),
            apply("a", "x: 2\nlabels: {app: api, tier: cache}"),
        ]);
        assert_eq!(outcome.conflicts.len(), 3);
        assert_eq!(outcome.conflicts.for_operation(1).count(), 3);
        assert_live(&outcome, "x: 1\nlabels: {app: web, tier: db}");
    }

    #[test]
    fn test_same_value_takes_ownership_without_conflict() {
        let outcome = run(&[update("b", "x: 1"), apply("a", "x: 1")]);
        assert!(outcome.conflicts.is_empty());
        assert_eq!(outcome.managers.owned_by("a"), set(vec![vec![field("x")]]));
        assert!(!outcome.managers.contains("b"));
    }

    #[test]
    fn test_replacing_owned_subtree_with_null_conflicts() {
        let outcome = run(&[update("b", "labels: {app: web}"), apply("a", "labels: null")]);
        assert_eq!(outcome.conflicts.len(), 1);
        assert_eq!(
            outcome.conflicts.to_set(),
            set(vec![vec![field("labels"), field("app")]])
        );
        assert_live(&outcome, "labels: {app: web}");
    }

    #[test]
    fn test_force_apply_takes_ownership() {
        let outcome = run(&[apply("b", "x: 1\ny: one"), force_apply("a", "x: 2")]);
        assert!(outcome.conflicts.is_empty());
        assert_live(&outcome, "x: 2\ny: one");
        assert_eq!(outcome.managers.owned_by("a"), set(vec![vec![field("x")]]));
        assert_eq!(outcome.managers.owned_by("b"), set(vec![vec![field("y")]]));
    }

    #[test]
    fn test_force_apply_drops_emptied_managers() {
        let outcome = run(&[update("b", "x: 1"), force_apply("a", "x: 2")]);
        assert!(!outcome.managers.contains("b"));
        assert_eq!(outcome.managers.len(), 1);
    }

    #[test]
    fn test_keyed_list_first_seen_order() {
        let outcome = run(&[
            apply("a", "items: [{name: x, value: 1}, {name: y, value: 2}]"),
            update("b", "items: [{name: y, value: 3}, {name: z, value: 4}]"),
        ]);
        assert_live(
            &outcome,
            "items: [{name: x, value: 1}, {name: y, value: 3}, {name: z, value: 4}]",
        );
    }

    #[test]
    fn test_keyed_list_force_apply_splits_ownership() {
        let outcome = run(&[
            apply("a", "items: [{name: x, value: 1}, {name: y, value: 2}]"),
            force_apply("b", "items: [{name: y, value: 3}, {name: z, value: 4}]"),
        ]);
        let x = vec![field("items"), item("x")];
        let owned_by_a = set(vec![
            x.clone(),
            [x.clone(), vec![field("name")]].concat(),
            [x, vec![field("value")]].concat(),
        ]);
        assert_eq!(outcome.managers.owned_by("a"), owned_by_a);
        assert_eq!(outcome.managers.owned_by("b").len(), 6);
    }

    #[test]
    fn test_keyed_list_release_removes_item() {
        let outcome = run(&[
            apply("a", "items: [{name: x, value: 1}, {name: y, value: 2}]"),
            apply("a", "items: [{name: y, value: 2}]"),
        ]);
        assert_live(&outcome, "items: [{name: y, value: 2}]");
    }

    #[test]
    fn test_set_list_release() {
        let outcome = run(&[apply("a", "tags: [a, b, c]"), apply("a", "tags: [c, a]")]);
        assert_live(&outcome, "tags: [a, c]");
    }

    #[test]
    fn test_ignored_fields_are_written_but_not_owned() {
        let merger = Merger::builder()
            .ignored_fields(set(vec![vec![field("status")]]))
            .build();
        let state = MergeState::empty(&schema(), "obj").unwrap();
        let outcome = merger
            .merge(
                state,
                &[
                    apply("a", "x: 1\nstatus: {phase: up}"),
                    update("b", "status: {phase: down}"),
                    apply("a", "x: 1"),
                ],
            )
            .unwrap();
        assert_live(&outcome, "x: 1\nstatus: {phase: down}");
        assert_eq!(outcome.managers.owned_by("a"), set(vec![vec![field("x")]]));
        assert!(!outcome.managers.contains("b"));
    }

    #[test]
    fn test_validation_error_aborts_merge() {
        let result = merge(
            &schema(),
            "obj",
            ManagedFields::new(),
            &[apply("a", "x: 1"), update("b", "nope: 1")],
        );
        match result {
            Err(MergeError::Validation { index, manager, errors }) => {
                assert_eq!(index, 1);
                assert_eq!(manager, "b");
                assert_eq!(errors.len(), 1);
            }
            other => panic!("expected a validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_unknown_root_type_is_a_schema_error() {
        let result = merge(&schema(), "missing", ManagedFields::new(), &[]);
        assert!(matches!(result, Err(MergeError::Schema(_))));
    }

    #[test]
    fn test_merge_from_existing_state() {
        let schema = schema();
        let live = TypedValue::from_unstructured(&schema, "obj", &yaml("x: 1\ny: one")).unwrap();
        let mut managers = ManagedFields::new();
        managers.insert(
            "b",
            VersionedSet::new(set(vec![vec![field("y")]]), APIVersion::new("v0"), false),
        );

        let outcome = Merger::default()
            .merge(MergeState::new(live, managers), &[apply("a", "y: two")])
            .unwrap();
        assert_eq!(outcome.conflicts.len(), 1);
        assert_live(&outcome, "x: 1\ny: one");
        assert_eq!(outcome.managers.get("b").unwrap().api_version, APIVersion::new("v0"));
    }

    #[test]
    fn test_apply_is_idempotent() {
        let object = "x: 1\nlabels: {app: web}\nitems: [{name: x, value: 1}]";
        let once = run(&[apply("a", object)]);
        let twice = run(&[apply("a", object), apply("a", object)]);
        assert_eq!(once.live.to_unstructured(), twice.live.to_unstructured());
        assert_eq!(once.managers, twice.managers);
    }

    #[test]
    fn test_api_version_is_recorded() {
        let outcome = run(&[
            Operation::apply("a", "v1", yaml("x: 1")),
            Operation::update("a", "v2", yaml("y: one")),
        ]);
        let vs = outcome.managers.get("a").unwrap();
        assert_eq!(vs.api_version, APIVersion::new("v2"));
        assert!(!vs.applied);
    }
}
