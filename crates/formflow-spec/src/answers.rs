use std::collections::BTreeMap;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::path::{FieldPath, ItemId};

/// Reserved key holding the stable id inside each group item object.
pub const ITEM_ID_KEY: &str = "$id";

/// Current answers of one form instance: `{ section_id: { field_id: value } }`.
///
/// Group fields hold an array of item objects, each tagged with
/// [`ITEM_ID_KEY`]. Items stored without an id are addressed by position
/// (`#0`, `#1`, ...) among the group's objects until an id is minted.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct AnswerSnapshot(Map<String, Value>);

/// Errors raised while addressing or mutating a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SnapshotError {
    #[error("invalid field path '{0}'")]
    InvalidPath(String),
    #[error("unknown field '{0}'")]
    UnknownField(String),
    #[error("no item '{item}' in group '{group}'")]
    UnknownItem { group: String, item: ItemId },
    #[error("'{0}' is not a repeatable group")]
    NotAGroup(String),
    #[error("'{0}' is a repeatable group; use add/remove item")]
    GroupValue(String),
    #[error("field '{0}' declares no override flag")]
    NoOverride(String),
}

/// Changes produced by one edit event.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SnapshotDiff {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub set: BTreeMap<String, Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cleared: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub seeded_groups: Vec<String>,
}

impl SnapshotDiff {
    pub fn is_empty(&self) -> bool {
        self.set.is_empty() && self.cleared.is_empty() && self.seeded_groups.is_empty()
    }

    pub fn merge(&mut self, other: SnapshotDiff) {
        self.set.extend(other.set);
        self.cleared.extend(other.cleared);
        self.seeded_groups.extend(other.seeded_groups);
    }
}

/// Validation error metadata reported by the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ValidationError {
    pub path: String,
    pub message: String,
    pub code: String,
}

impl ValidationError {
    pub fn new(path: impl ToString, message: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            path: path.to_string(),
            message: message.into(),
            code: code.into(),
        }
    }
}

/// Result of validating one section or the whole document.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
pub struct ValidationResult {
    pub valid: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<ValidationError>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub missing_required: Vec<String>,
}

impl ValidationResult {
    pub fn from_parts(errors: Vec<ValidationError>, missing_required: Vec<String>) -> Self {
        Self {
            valid: errors.is_empty() && missing_required.is_empty(),
            errors,
            missing_required,
        }
    }

    pub fn merge(&mut self, other: ValidationResult) {
        self.errors.extend(other.errors);
        self.missing_required.extend(other.missing_required);
        self.valid = self.errors.is_empty() && self.missing_required.is_empty();
    }

    /// Whether `path` has any reported problem.
    pub fn mentions(&self, path: &str) -> bool {
        self.missing_required.iter().any(|missing| missing == path)
            || self.errors.iter().any(|error| error.path == path)
    }
}

/// Missing, `null`, whitespace-only strings and objects whose parts are all
/// blank count as unanswered.
pub fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(text) => text.trim().is_empty(),
        Value::Object(map) => map
            .iter()
            .filter(|(key, _)| key.as_str() != ITEM_ID_KEY)
            .all(|(_, value)| is_blank(value)),
        _ => false,
    }
}

impl AnswerSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Non-object payloads yield an empty snapshot.
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Object(map) => Self(map),
            _ => Self::default(),
        }
    }

    pub fn to_value(&self) -> Value {
        Value::Object(self.0.clone())
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn sections(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    pub fn section(&self, id: &str) -> Option<&Map<String, Value>> {
        self.0.get(id).and_then(Value::as_object)
    }

    pub fn section_mut(&mut self, id: &str) -> &mut Map<String, Value> {
        let slot = self
            .0
            .entry(id.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        if !slot.is_object() {
            *slot = Value::Object(Map::new());
        }
        slot.as_object_mut().expect("section slot is an object")
    }

    /// Map holding the value addressed by `path`: the section map, or the
    /// item object for item paths.
    pub fn scope(&self, path: &FieldPath) -> Option<&Map<String, Value>> {
        let section = self.section(&path.section)?;
        match &path.item {
            None => Some(section),
            Some(item) => section
                .get(&path.field)?
                .as_array()?
                .iter()
                .filter_map(Value::as_object)
                .enumerate()
                .find(|(index, entry)| item_matches(*index, entry, &item.id))
                .map(|(_, entry)| entry),
        }
    }

    pub fn scope_mut(
        &mut self,
        path: &FieldPath,
    ) -> Result<&mut Map<String, Value>, SnapshotError> {
        let Some(item) = &path.item else {
            return Ok(self.section_mut(&path.section));
        };
        let unknown = || SnapshotError::UnknownItem {
            group: path.group_path().to_string(),
            item: item.id.clone(),
        };
        self.0
            .get_mut(&path.section)
            .and_then(Value::as_object_mut)
            .and_then(|section| section.get_mut(&path.field))
            .and_then(Value::as_array_mut)
            .ok_or_else(unknown)?
            .iter_mut()
            .filter_map(Value::as_object_mut)
            .enumerate()
            .find(|(index, entry)| item_matches(*index, entry, &item.id))
            .map(|(_, entry)| entry)
            .ok_or_else(unknown)
    }

    pub fn get(&self, path: &FieldPath) -> Option<&Value> {
        self.scope(path)?.get(path.leaf())
    }

    pub fn set(&mut self, path: &FieldPath, value: Value) -> Result<(), SnapshotError> {
        let key = path.leaf().to_string();
        self.scope_mut(path)?.insert(key, value);
        Ok(())
    }

    /// Removes the value at `path`; missing scopes are left untouched.
    pub fn remove(&mut self, path: &FieldPath) -> Option<Value> {
        let section = self.0.get_mut(&path.section)?.as_object_mut()?;
        let scope = match &path.item {
            None => section,
            Some(item) => section
                .get_mut(&path.field)?
                .as_array_mut()?
                .iter_mut()
                .filter_map(Value::as_object_mut)
                .enumerate()
                .find(|(index, entry)| item_matches(*index, entry, &item.id))
                .map(|(_, entry)| entry)?,
        };
        scope.remove(path.leaf())
    }

    pub fn is_answered(&self, path: &FieldPath) -> bool {
        self.get(path).is_some_and(|value| !is_blank(value))
    }
}

pub(crate) fn item_id_of(entry: &Map<String, Value>) -> Option<&str> {
    entry.get(ITEM_ID_KEY).and_then(Value::as_str)
}

/// Key of the `index`-th item object of a group: its stored id, or
/// `#<index>` for items persisted without one.
pub(crate) fn item_key(index: usize, entry: &Map<String, Value>) -> ItemId {
    item_id_of(entry).map_or_else(|| ItemId::from(format!("#{index}")), ItemId::from)
}

pub(crate) fn item_matches(index: usize, entry: &Map<String, Value>, id: &ItemId) -> bool {
    match item_id_of(entry) {
        Some(own) => own == id.as_str(),
        None => position_of(id) == Some(index),
    }
}

fn position_of(id: &ItemId) -> Option<usize> {
    id.as_str().strip_prefix('#')?.parse().ok()
}

impl From<Value> for AnswerSnapshot {
    fn from(value: Value) -> Self {
        Self::from_value(value)
    }
}
