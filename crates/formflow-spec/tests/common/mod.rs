#![allow(dead_code)]

use formflow_spec::{AnswerSnapshot, FieldPath, FormSchema, ValidationOptions};
use serde_json::Value;
use time::macros::date;

pub const VISA_FORM: &str = include_str!("../fixtures/visa_form.json");

pub fn visa_schema() -> FormSchema {
    FormSchema::from_json(VISA_FORM).expect("fixture schema is valid")
}

pub fn opts() -> ValidationOptions {
    ValidationOptions::at(date!(2026 - 01 - 15))
}

pub fn path(raw: &str) -> FieldPath {
    raw.parse().expect("valid field path")
}

pub const VISA_ANSWERS: &str = include_str!("../fixtures/visa_answers.json");

/// Answers that satisfy every section of the visa form.
pub fn complete_answers() -> Value {
    serde_json::from_str(VISA_ANSWERS).expect("fixture answers are valid JSON")
}

pub fn complete_snapshot() -> AnswerSnapshot {
    AnswerSnapshot::from(complete_answers())
}
