use serde_json::{Map, Value};

use crate::answers::{AnswerSnapshot, SnapshotDiff, SnapshotError};
use crate::edit::cascade;
use crate::path::FieldPath;
use crate::spec::{FieldSpec, FormSchema};
use crate::visibility::field_visibility;

/// Whether the "does not apply" flag of `field` is set in `scope`.
pub fn is_overridden(scope: Option<&Map<String, Value>>, field: &FieldSpec) -> bool {
    let Some(flag) = field.override_flag.as_deref() else {
        return false;
    };
    scope
        .and_then(|scope| scope.get(flag))
        .is_some_and(flag_value)
}

fn flag_value(value: &Value) -> bool {
    match value {
        Value::Bool(value) => *value,
        Value::String(text) => matches!(text.to_lowercase().as_str(), "true" | "y" | "yes"),
        _ => false,
    }
}

/// The required rule applies only to a visible, required field whose
/// override flag is not set.
pub fn required_rule_active(field: &FieldSpec, visible: bool, overridden: bool) -> bool {
    visible && field.required && !overridden
}

/// Stores the override flag of the field at `path`.
///
/// Setting the flag clears the field and every field of the same scope that
/// shares its `group_key`, then clears whatever those values were keeping
/// open. Clearing the flag never restores values.
pub fn set_override(
    schema: &FormSchema,
    snapshot: &mut AnswerSnapshot,
    path: &FieldPath,
    flag: bool,
) -> Result<SnapshotDiff, SnapshotError> {
    let field = schema
        .find_field(path)
        .ok_or_else(|| SnapshotError::UnknownField(path.to_string()))?;
    let flag_key = field
        .override_flag
        .clone()
        .ok_or_else(|| SnapshotError::NoOverride(path.to_string()))?;

    let mut targets = vec![field.id.clone()];
    if let Some(key) = field.group_key.as_deref() {
        targets.extend(
            schema
                .scope_fields(path)
                .into_iter()
                .filter(|other| other.id != field.id && other.group_key.as_deref() == Some(key))
                .map(|other| other.id.clone()),
        );
    }

    let mut next = snapshot.clone();
    let before = field_visibility(schema, &next);
    let flag_path = path.sibling(flag_key);
    next.set(&flag_path, Value::Bool(flag))?;

    let mut diff = SnapshotDiff::default();
    diff.set.insert(flag_path.to_string(), Value::Bool(flag));
    if flag {
        for target in targets {
            let target_path = path.sibling(target);
            if next.remove(&target_path).is_some() {
                diff.cleared.push(target_path.to_string());
            }
        }
        cascade(schema, &mut next, &before, &mut diff);
    }
    *snapshot = next;
    Ok(diff)
}
