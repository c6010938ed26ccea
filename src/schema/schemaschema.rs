//! Schema schema definition - a schema that can validate other schemas.

/// SchemaSchemaYAML describes schema documents in the format read by
/// [`parse_schema`](super::parse_schema). It validates itself.
pub const SCHEMA_SCHEMA_YAML: &str = r#"types:
- name: schema
  map:
    fields:
    - name: types
      type:
        list:
          elementRelationship: associative
          elementType:
            namedType: typeDef
          keys:
          - name
- name: typeDef
  map:
    fields:
    - name: name
      type:
        scalar: string
      required: true
    - name: namedType
      type:
        scalar: string
    - name: scalar
      type:
        scalar: string
    - name: map
      type:
        namedType: map
    - name: list
      type:
        namedType: list
    - name: deduced
      type:
        scalar: boolean
- name: typeRef
  map:
    fields:
    - name: namedType
      type:
        scalar: string
    - name: scalar
      type:
        scalar: string
    - name: map
      type:
        namedType: map
    - name: list
      type:
        namedType: list
    - name: deduced
      type:
        scalar: boolean
- name: map
  map:
    fields:
    - name: fields
      type:
        list:
          elementRelationship: associative
          elementType:
            namedType: structField
          keys:
          - name
    - name: elementType
      type:
        namedType: typeRef
    - name: elementRelationship
      type:
        scalar: string
- name: structField
  map:
    fields:
    - name: name
      type:
        scalar: string
    - name: type
      type:
        namedType: typeRef
    - name: default
      type:
        deduced: true
    - name: required
      type:
        scalar: boolean
- name: list
  map:
    fields:
    - name: elementType
      type:
        namedType: typeRef
    - name: elementRelationship
      type:
        scalar: string
    - name: keys
      type:
        list:
          elementType:
            scalar: string
"#;
