use std::collections::BTreeMap;

use serde_json::Value;

use crate::answers::{AnswerSnapshot, SnapshotDiff, SnapshotError};
use crate::groups::ensure_visible_groups;
use crate::path::FieldPath;
use crate::spec::FormSchema;
use crate::visibility::field_visibility;

/// Writes `value` at `path` and cascades the consequences.
///
/// `null` clears the value. Every field that was visible before the edit and
/// is hidden afterwards loses its value and override flag, repeated until
/// nothing else closes. Groups that became visible receive their first item.
/// On error the snapshot is left untouched.
pub fn apply_edit(
    schema: &FormSchema,
    snapshot: &mut AnswerSnapshot,
    path: &FieldPath,
    value: Value,
) -> Result<SnapshotDiff, SnapshotError> {
    let field = schema
        .find_field(path)
        .ok_or_else(|| SnapshotError::UnknownField(path.to_string()))?;
    if field.is_group() {
        return Err(SnapshotError::GroupValue(path.to_string()));
    }

    let mut next = snapshot.clone();
    let before = field_visibility(schema, &next);
    let mut diff = SnapshotDiff::default();

    if value.is_null() {
        if next.remove(path).is_some() {
            diff.cleared.push(path.to_string());
        }
    } else {
        next.set(path, value.clone())?;
        diff.set.insert(path.to_string(), value);
    }

    cascade(schema, &mut next, &before, &mut diff);
    *snapshot = next;
    Ok(diff)
}

/// Clears every field that was visible in `before` and is hidden now,
/// repeated until nothing else closes, then seeds newly visible groups.
pub(crate) fn cascade(
    schema: &FormSchema,
    snapshot: &mut AnswerSnapshot,
    before: &BTreeMap<FieldPath, bool>,
    diff: &mut SnapshotDiff,
) {
    loop {
        let after = field_visibility(schema, snapshot);
        let closed: Vec<FieldPath> = before
            .iter()
            .filter(|(path, visible)| **visible && after.get(*path) == Some(&false))
            .map(|(path, _)| path.clone())
            .collect();
        let cleared = clear_paths(schema, snapshot, &closed);
        if cleared.is_empty() {
            break;
        }
        diff.cleared.extend(cleared);
    }
    diff.seeded_groups = ensure_visible_groups(schema, snapshot);
}

/// Removes every value whose field is currently hidden, until stable.
/// Returns the cleared paths.
pub fn purge_hidden(schema: &FormSchema, snapshot: &mut AnswerSnapshot) -> Vec<String> {
    let mut cleared = Vec::new();
    loop {
        let hidden: Vec<FieldPath> = hidden_paths(field_visibility(schema, snapshot));
        let removed = clear_paths(schema, snapshot, &hidden);
        if removed.is_empty() {
            return cleared;
        }
        cleared.extend(removed);
    }
}

fn hidden_paths(visibility: BTreeMap<FieldPath, bool>) -> Vec<FieldPath> {
    visibility
        .into_iter()
        .filter(|(_, visible)| !visible)
        .map(|(path, _)| path)
        .collect()
}

fn clear_paths(
    schema: &FormSchema,
    snapshot: &mut AnswerSnapshot,
    paths: &[FieldPath],
) -> Vec<String> {
    let mut cleared = Vec::new();
    for path in paths {
        let mut removed = snapshot.remove(path).is_some();
        if let Some(flag) = schema
            .find_field(path)
            .and_then(|field| field.override_flag.as_deref())
        {
            removed |= snapshot.remove(&path.sibling(flag)).is_some();
        }
        if removed {
            cleared.push(path.to_string());
        }
    }
    cleared
}
