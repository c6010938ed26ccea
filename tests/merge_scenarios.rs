//! End-to-end merge scenarios against a deployment-like schema.

mod common;

use common::{apply, deployment_schema, force_apply, init_tracing, update, yaml};
use pretty_assertions::assert_eq;
use structured_apply::schema::DEDUCED_TYPE_NAME;
use structured_apply::{
    compare, merge, validate, FieldPathSet, ManagedFields, MergeError, MergeOutcome, Operation,
    Path, PathElement, Schema, Value,
};

fn run(ops: &[Operation]) -> MergeOutcome {
    init_tracing();
    merge(&deployment_schema(), "deployment", ManagedFields::new(), ops).unwrap()
}

fn path(fields: &[&str]) -> Path {
    fields.iter().copied().map(PathElement::field).collect()
}

fn assert_exclusive(outcome: &MergeOutcome) {
    for p in outcome.managers.all_owned().paths() {
        let owners: Vec<&str> = outcome.managers.owners_of(&p).collect();
        assert_eq!(owners.len(), 1, "{} is owned by {:?}", p, owners);
    }
}

#[test]
fn apply_conflict_leaves_live_value() {
    let outcome = run(&[
        apply("alice", "spec: {replicas: 1}"),
        apply("bob", "spec: {replicas: 2}"),
    ]);

    assert_eq!(outcome.conflicts.len(), 1);
    let conflict = outcome.conflicts.iter().next().unwrap();
    assert_eq!(conflict.index, 1);
    assert_eq!(conflict.manager, "bob");
    assert_eq!(conflict.owner, "alice");
    assert_eq!(conflict.path, path(&["spec", "replicas"]));
    assert_eq!(conflict.live_value, Some(Value::from(1)));
    assert_eq!(conflict.applied_value, Some(Value::from(2)));

    assert_eq!(outcome.live.to_unstructured(), yaml("spec: {replicas: 1}"));
    assert!(!outcome.managers.contains("bob"));
}

#[test]
fn apply_ownership_is_exclusive() {
    let outcome = run(&[
        apply("alice", "metadata: {name: web, labels: {app: web}}\nspec: {replicas: 1}"),
        force_apply("bob", "spec: {replicas: 3, paused: false}"),
        apply("carol", "metadata: {labels: {tier: front}}"),
        force_apply("alice", "metadata: {name: web, labels: {app: web}}\nspec: {paused: true}"),
    ]);
    assert!(outcome.conflicts.is_empty());
    assert_exclusive(&outcome);
    assert_eq!(
        outcome.live.to_unstructured(),
        yaml("metadata: {name: web, labels: {app: web, tier: front}}\nspec: {replicas: 3, paused: true}")
    );
    assert_eq!(
        outcome.managers.owned_by("bob"),
        [path(&["spec", "replicas"])].into_iter().collect::<FieldPathSet>()
    );
}

#[test]
fn associative_list_keeps_first_seen_order() {
    let outcome = run(&[
        apply(
            "alice",
            "spec:\n  ports:\n  - {containerPort: 80, name: x}\n  - {containerPort: 81, name: y}",
        ),
        update(
            "bob",
            "spec:\n  ports:\n  - {containerPort: 81, name: y2}\n  - {containerPort: 82, name: z}",
        ),
    ]);
    assert_eq!(
        outcome.live.to_unstructured(),
        yaml(
            "spec:\n  ports:\n  - {containerPort: 80, name: x}\n  - {containerPort: 81, name: y2}\n  - {containerPort: 82, name: z}"
        )
    );
}

#[test]
fn release_on_apply_removes_unclaimed_fields() {
    let outcome = run(&[
        apply("alice", "spec: {replicas: 1, paused: true}"),
        apply("alice", "spec: {replicas: 1}"),
    ]);
    assert_eq!(outcome.live.to_unstructured(), yaml("spec: {replicas: 1}"));
    assert!(!outcome
        .managers
        .owned_by("alice")
        .has(&path(&["spec", "paused"])));
}

#[test]
fn release_keeps_fields_claimed_by_others() {
    let outcome = run(&[
        apply("alice", "spec: {replicas: 1, paused: true}"),
        update("bob", "spec: {paused: true}"),
        apply("alice", "spec: {replicas: 1}"),
    ]);
    assert_eq!(outcome.live.to_unstructured(), yaml("spec: {replicas: 1, paused: true}"));
}

#[test]
fn required_fields_survive_release() {
    let outcome = run(&[
        apply("alice", "metadata: {name: web}\nspec: {replicas: 1}"),
        apply("alice", "spec: {replicas: 1}"),
    ]);
    assert_eq!(outcome.live.to_unstructured(), yaml("metadata: {}\nspec: {replicas: 1}"));
}

#[test]
fn defaulted_key_identifies_item() {
    let outcome = run(&[
        apply("alice", "spec:\n  ports:\n  - {containerPort: 80}"),
        update("bob", "spec:\n  ports:\n  - {containerPort: 80, protocol: TCP, name: http}"),
    ]);
    let ports = outcome.live.value_at(&path(&["spec", "ports"])).unwrap();
    assert_eq!(ports.as_list().map(<[Value]>::len), Some(1));

    let item = PathElement::key([
        ("containerPort", Value::from(80)),
        ("protocol", Value::from("TCP")),
    ]);
    let item_path = path(&["spec", "ports"]).child(item);
    assert!(outcome.managers.owned_by("alice").has(&item_path));
    assert!(outcome.managers.owned_by("bob").has(&item_path));
}

#[test]
fn atomic_map_is_replaced_wholesale() {
    let outcome = run(&[
        apply("alice", "spec: {selector: {app: web}}"),
        apply("bob", "spec: {selector: {tier: db}}"),
        force_apply("bob", "spec: {selector: {tier: db}}"),
    ]);
    assert_eq!(outcome.conflicts.len(), 1);
    assert_eq!(outcome.live.to_unstructured(), yaml("spec: {selector: {tier: db}}"));
    assert!(!outcome.managers.contains("alice"));
}

#[test]
fn set_items_merge_by_value() {
    let outcome = run(&[
        apply("alice", "spec: {finalizers: [a, b]}"),
        apply("bob", "spec: {finalizers: [c, a]}"),
    ]);
    assert!(outcome.conflicts.is_empty());
    assert_eq!(outcome.live.to_unstructured(), yaml("spec: {finalizers: [a, b, c]}"));
    assert_exclusive(&outcome);
}

#[test]
fn invalid_object_aborts_with_context() {
    let result = merge(
        &deployment_schema(),
        "deployment",
        ManagedFields::new(),
        &[
            apply("alice", "spec: {replicas: 1}"),
            update("bob", "spec: {replicas: many, bogus: 1}"),
        ],
    );
    match result {
        Err(MergeError::Validation { index, manager, errors }) => {
            assert_eq!(index, 1);
            assert_eq!(manager, "bob");
            assert_eq!(errors.len(), 2);
        }
        other => panic!("expected a validation error, got {:?}", other),
    }
}

#[test]
fn untyped_status_accepts_any_scalar() {
    let outcome = run(&[update("kubelet", "status: {ready: true, count: 3, phase: up}")]);
    assert_eq!(outcome.managers.owned_by("kubelet").len(), 3);
}

#[test]
fn deduced_documents_merge() {
    init_tracing();
    let outcome = merge(
        &Schema::deduced(),
        DEDUCED_TYPE_NAME,
        ManagedFields::new(),
        &[
            apply("alice", "a: {b: 1, c: [1, 2]}"),
            apply("bob", "a: {d: x}"),
            apply("alice", "a: {c: [3]}"),
        ],
    )
    .unwrap();
    assert!(outcome.conflicts.is_empty());
    assert_eq!(outcome.live.to_unstructured(), yaml("a: {c: [3], d: x}"));
}

#[test]
fn validate_and_compare_from_the_crate_root() {
    let schema = deployment_schema();
    let lhs = validate(&schema, &yaml("spec: {replicas: 1, paused: true}"), "deployment").unwrap();
    let rhs = validate(&schema, &yaml("spec: {replicas: 2, args: [x]}"), "deployment").unwrap();
    let comparison = compare(&lhs, &rhs);
    assert_eq!(
        comparison.modified,
        [path(&["spec", "replicas"])].into_iter().collect::<FieldPathSet>()
    );
    assert_eq!(
        comparison.added,
        [path(&["spec", "args"])].into_iter().collect::<FieldPathSet>()
    );
    assert_eq!(
        comparison.removed,
        [path(&["spec", "paused"])].into_iter().collect::<FieldPathSet>()
    );
    assert!(compare(&lhs, &lhs).is_same());
}
