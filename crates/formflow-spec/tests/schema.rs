mod common;

use formflow_spec::{FieldKind, FieldSpec, FormSchema, SchemaError, SectionSpec};
use serde_json::json;

fn schema_with(sections: Vec<SectionSpec>) -> FormSchema {
    FormSchema {
        id: "test".into(),
        title: "Test".into(),
        version: "0.1.0".into(),
        description: None,
        sections,
    }
}

#[test]
fn fixture_loads_with_terminal_review_step() {
    let schema = common::visa_schema();
    assert_eq!(schema.step_count(), 6);
    assert_eq!(schema.terminal_step(), 5);
    assert_eq!(schema.section(5).map(|s| s.id.as_str()), Some("review"));
    assert_eq!(schema.section_by_id("travel").map(|(at, _)| at), Some(2));
}

#[test]
fn find_field_descends_into_blocks_and_templates() {
    let schema = common::visa_schema();
    let nested = schema
        .find_field(&common::path("travel.principal_surname"))
        .expect("nested block field");
    assert_eq!(nested.title, "Principal Applicant Surnames");

    let item = schema
        .find_field(&common::path("companions.companions[abc].relationship"))
        .expect("template field");
    assert_eq!(item.kind, FieldKind::Scalar);
    let missing = common::path("companions.missing");
    assert!(schema.find_field(&missing).is_none());
}

#[test]
fn rejects_empty_forms() {
    let err = schema_with(Vec::new()).check().unwrap_err();
    assert!(matches!(err, SchemaError::NoSections(_)));
}

#[test]
fn rejects_duplicate_sections_and_fields() {
    let sections = vec![SectionSpec::new("a", "A"), SectionSpec::new("a", "Again")];
    let err = schema_with(sections).check().unwrap_err();
    assert!(matches!(err, SchemaError::DuplicateSection(id) if id == "a"));

    let section = SectionSpec::new("a", "A")
        .field(FieldSpec::scalar("name"))
        .block(SectionSpec::new("inner", "").field(FieldSpec::scalar("name")));
    let err = schema_with(vec![section]).check().unwrap_err();
    assert!(matches!(err, SchemaError::DuplicateField { field, .. } if field == "name"));
}

#[test]
fn rejects_flag_colliding_with_field() {
    let section = SectionSpec::new("a", "A")
        .field(FieldSpec::scalar("ssn").with_override("other"))
        .field(FieldSpec::scalar("other"));
    let err = schema_with(vec![section]).check().unwrap_err();
    assert!(matches!(err, SchemaError::FlagCollision { flag, .. } if flag == "other"));
}

#[test]
fn rejects_nested_groups_and_missing_templates() {
    let nested = FieldSpec::group("outer", vec![FieldSpec::group("inner", Vec::new())]);
    let err = schema_with(vec![SectionSpec::new("a", "A").field(nested)])
        .check()
        .unwrap_err();
    assert!(matches!(err, SchemaError::NestedGroup(id) if id == "inner"));

    let bare = FieldSpec::new("people", FieldKind::Group);
    let err = schema_with(vec![SectionSpec::new("a", "A").field(bare)])
        .check()
        .unwrap_err();
    assert!(matches!(err, SchemaError::MissingTemplate(id) if id == "people"));
}

#[test]
fn rejects_reserved_characters_and_bad_patterns() {
    let err = schema_with(vec![SectionSpec::new("a.b", "A")])
        .check()
        .unwrap_err();
    assert!(matches!(err, SchemaError::InvalidIdentifier(_)));

    let raw = json!({
        "id": "f", "title": "F", "version": "1",
        "sections": [{
            "id": "a",
            "entries": [{ "type": "field", "id": "x", "constraint": { "pattern": "([" } }]
        }]
    });
    let err = FormSchema::from_json(&raw.to_string()).unwrap_err();
    assert!(matches!(err, SchemaError::InvalidPattern { field, .. } if field == "x"));
}

#[test]
fn fields_default_to_required_scalars() {
    let raw = json!({
        "id": "f", "title": "F", "version": "1",
        "sections": [{ "id": "a", "entries": [{ "type": "field", "id": "x" }] }]
    });
    let schema = FormSchema::from_json(&raw.to_string()).expect("valid schema");
    let field = schema.sections[0].find_field("x").expect("field");
    assert!(field.required);
    assert_eq!(field.kind, FieldKind::Scalar);
}
