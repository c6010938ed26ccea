//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use std::sync::Arc;
use structured_apply::value::from_yaml;
use structured_apply::{Operation, Schema, Value};
use tracing_subscriber::EnvFilter;

pub const DEPLOYMENT_SCHEMA: &str = r#"types:
- name: deployment
  map:
    fields:
    - name: metadata
      type:
        namedType: metadata
      required: true
    - name: spec
      type:
        namedType: spec
    - name: status
      type:
        map:
          elementType:
            scalar: untyped
- name: metadata
  map:
    fields:
    - name: name
      type:
        scalar: string
    - name: labels
      type:
        map:
          elementType:
            scalar: string
- name: spec
  map:
    fields:
    - name: replicas
      type:
        scalar: numeric
    - name: paused
      type:
        scalar: boolean
    - name: selector
      type:
        map:
          elementType:
            scalar: string
          elementRelationship: atomic
    - name: ports
      type:
        list:
          elementType:
            namedType: port
          elementRelationship: associative
          keys: [containerPort, protocol]
    - name: finalizers
      type:
        list:
          elementType:
            scalar: string
          elementRelationship: associative
    - name: args
      type:
        list:
          elementType:
            scalar: string
- name: port
  map:
    fields:
    - name: containerPort
      type:
        scalar: numeric
    - name: protocol
      type:
        scalar: string
      default: TCP
    - name: name
      type:
        scalar: string
"#;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter(EnvFilter::from_default_env())
        .try_init();
}

pub fn deployment_schema() -> Arc<Schema> {
    Arc::new(Schema::from_yaml(DEPLOYMENT_SCHEMA).unwrap())
}

pub fn yaml(s: &str) -> Value {
    from_yaml(s).unwrap()
}

pub fn apply(manager: &str, object: &str) -> Operation {
    Operation::apply(manager, "apps/v1", yaml(object))
}

pub fn force_apply(manager: &str, object: &str) -> Operation {
    Operation::force_apply(manager, "apps/v1", yaml(object))
}

pub fn update(manager: &str, object: &str) -> Operation {
    Operation::update(manager, "apps/v1", yaml(object))
}
