use regex::Regex;
use serde_json::{Map, Value};
use time::macros::date;
use time::{Date, Month, OffsetDateTime};

use crate::answers::{AnswerSnapshot, ValidationError, ValidationResult, is_blank};
use crate::spec::{Constraint, DateRule, FieldKind, FieldSpec, FormSchema};
use crate::visibility::{VisibleField, resolve};

/// Earliest date accepted by [`DateRule::Historical`].
pub const MIN_HISTORICAL_DATE: Date = date!(1915 - 05 - 15);

const MONTHS: [&str; 12] = [
    "JAN", "FEB", "MAR", "APR", "MAY", "JUN", "JUL", "AUG", "SEP", "OCT", "NOV", "DEC",
];

/// Inputs validation needs from the outside world.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidationOptions {
    pub today: Date,
}

impl Default for ValidationOptions {
    fn default() -> Self {
        Self {
            today: OffsetDateTime::now_utc().date(),
        }
    }
}

impl ValidationOptions {
    pub fn at(today: Date) -> Self {
        Self { today }
    }
}

/// Validates every visible field of step `step`, group items included.
/// Overridden fields are skipped. An unknown step is trivially valid.
pub fn validate_section(
    schema: &FormSchema,
    snapshot: &AnswerSnapshot,
    step: usize,
    opts: &ValidationOptions,
) -> ValidationResult {
    let Some(section) = resolve(schema, snapshot, step) else {
        return ValidationResult::from_parts(Vec::new(), Vec::new());
    };

    let mut errors = Vec::new();
    let mut missing_required = Vec::new();
    for field in section.flatten() {
        if field.overridden {
            continue;
        }
        let path = field.path.to_string();
        if field.spec.is_group() {
            if field.required && field.items.is_empty() {
                errors.push(ValidationError::new(
                    &path,
                    "at least one entry is required",
                    "empty_group",
                ));
            }
            continue;
        }
        match snapshot.get(&field.path) {
            Some(value) if !is_blank(value) && !is_partial_date(field.spec, value) => {
                if let Some(error) = validate_value(&path, field.spec, value, opts) {
                    errors.push(error);
                }
            }
            Some(value) if is_partial_date(field.spec, value) && !field.required => {
                errors.push(ValidationError::new(&path, "date is incomplete", "incomplete_date"));
            }
            _ => {
                if field.required {
                    missing_required.push(path);
                }
            }
        }
    }
    ValidationResult::from_parts(errors, missing_required)
}

/// Validates every section of the form.
pub fn validate_document(
    schema: &FormSchema,
    snapshot: &AnswerSnapshot,
    opts: &ValidationOptions,
) -> ValidationResult {
    let mut result = ValidationResult::from_parts(Vec::new(), Vec::new());
    for step in 0..schema.step_count() {
        result.merge(validate_section(schema, snapshot, step, opts));
    }
    result
}

/// Whether a visible field still needs an answer before its step can advance.
pub fn needs_answer(field: &VisibleField<'_>, snapshot: &AnswerSnapshot) -> bool {
    field.required
        && !field.spec.is_group()
        && snapshot
            .get(&field.path)
            .is_none_or(|value| is_blank(value) || is_partial_date(field.spec, value))
}

fn is_partial_date(field: &FieldSpec, value: &Value) -> bool {
    matches!(field.kind, FieldKind::CompositeDate)
        && value.as_object().is_some_and(|parts| {
            ["day", "month", "year"]
                .iter()
                .any(|part| parts.get(*part).is_none_or(is_blank))
        })
}

fn validate_value(
    path: &str,
    field: &FieldSpec,
    value: &Value,
    opts: &ValidationOptions,
) -> Option<ValidationError> {
    match field.kind {
        FieldKind::Scalar => validate_scalar(path, field, value),
        FieldKind::CompositeDate => match value.as_object() {
            Some(parts) => validate_date(path, field, parts, opts),
            None => Some(ValidationError::new(path, "type mismatch", "type_mismatch")),
        },
        FieldKind::Group => None,
    }
}

fn validate_scalar(path: &str, field: &FieldSpec, value: &Value) -> Option<ValidationError> {
    let text = match value {
        Value::String(text) => text.clone(),
        Value::Number(number) => number.to_string(),
        Value::Bool(flag) => flag.to_string(),
        _ => return Some(ValidationError::new(path, "type mismatch", "type_mismatch")),
    };

    if let Some(choices) = &field.choices
        && !choices.contains(&text)
    {
        return Some(ValidationError::new(path, "invalid option", "enum_mismatch"));
    }

    if let Some(constraint) = &field.constraint
        && value.is_string()
    {
        return enforce_constraint(path, &text, constraint);
    }
    None
}

fn enforce_constraint(path: &str, text: &str, constraint: &Constraint) -> Option<ValidationError> {
    if let Some(pattern) = &constraint.pattern
        && let Ok(regex) = Regex::new(pattern)
        && !regex.is_match(text)
    {
        return Some(ValidationError::new(path, "value does not match pattern", "pattern_mismatch"));
    }

    let len = text.chars().count();
    if let Some(min_len) = constraint.min_len
        && len < min_len
    {
        return Some(ValidationError::new(
            path,
            format!("must be at least {min_len} characters"),
            "min_length",
        ));
    }

    if let Some(max_len) = constraint.max_len
        && len > max_len
    {
        return Some(ValidationError::new(
            path,
            format!("must be at most {max_len} characters"),
            "max_length",
        ));
    }
    None
}

fn validate_date(
    path: &str,
    field: &FieldSpec,
    parts: &Map<String, Value>,
    opts: &ValidationOptions,
) -> Option<ValidationError> {
    let date = match parse_date(parts) {
        Ok(date) => date,
        Err(message) => return Some(ValidationError::new(path, message, "invalid_date")),
    };
    for rule in &field.date_rules {
        let broken = match rule {
            DateRule::Past if date > opts.today => {
                Some(("date cannot be in the future", "date_in_future"))
            }
            DateRule::Future if date <= opts.today => {
                Some(("date must be in the future", "date_not_future"))
            }
            DateRule::Historical if date < MIN_HISTORICAL_DATE => {
                Some(("date must be on or after 15 May 1915", "date_too_early"))
            }
            _ => None,
        };
        if let Some((message, code)) = broken {
            return Some(ValidationError::new(path, message, code));
        }
    }
    None
}

/// Parses `{day, month, year}` where month is `JAN`..`DEC` or `1`..`12`
/// and year has four digits.
pub fn parse_date(parts: &Map<String, Value>) -> Result<Date, &'static str> {
    let day = part_text(parts, "day")
        .and_then(|text| text.parse::<u8>().ok())
        .ok_or("day must be a number")?;
    let month = part_text(parts, "month")
        .and_then(|text| parse_month(&text))
        .ok_or("month must be JAN..DEC or 1..12")?;
    let year_text = part_text(parts, "year").ok_or("year is missing")?;
    if year_text.len() != 4 || !year_text.chars().all(|c| c.is_ascii_digit()) {
        return Err("year must have four digits");
    }
    let year = year_text
        .parse::<i32>()
        .map_err(|_| "year must have four digits")?;
    Date::from_calendar_date(year, month, day).map_err(|_| "day is not valid for the month")
}

fn part_text(parts: &Map<String, Value>, key: &str) -> Option<String> {
    match parts.get(key)? {
        Value::String(text) => Some(text.trim().to_string()),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}

fn parse_month(text: &str) -> Option<Month> {
    let upper = text.to_ascii_uppercase();
    let number = match MONTHS.iter().position(|name| *name == upper) {
        Some(index) => index as u8 + 1,
        None => text.parse::<u8>().ok()?,
    };
    Month::try_from(number).ok()
}
