mod common;

use formflow_spec::{AnswerSnapshot, ReviewContent, build_review};
use serde_json::json;

#[test]
fn review_lists_every_section_in_order() {
    let schema = common::visa_schema();
    let snapshot = AnswerSnapshot::from(json!({
        "personal": {"surname": "Doe"},
        "travel": {},
        "passport": {"passport_number": " "}
    }));
    let review = build_review(&schema, &snapshot);

    let ids: Vec<&str> = review.sections.iter().map(|s| s.id.as_str()).collect();
    assert_eq!(
        ids,
        vec!["personal", "nationality", "travel", "companions", "passport", "review"]
    );
    let provided: Vec<bool> = review
        .sections
        .iter()
        .map(|s| s.content.is_provided())
        .collect();
    assert_eq!(provided, vec![true, false, false, false, false, false]);
    assert_eq!(review.sections[0].title, "Personal Information");
}

#[test]
fn review_serializes_with_state_tag() {
    let schema = common::visa_schema();
    let review = build_review(&schema, &AnswerSnapshot::new());
    let value = serde_json::to_value(&review.sections[0]).expect("serialize");
    assert_eq!(value["content"], json!({"state": "not_provided"}));
    assert_eq!(review.sections[0].content, ReviewContent::NotProvided);
}
