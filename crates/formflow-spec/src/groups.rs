use serde_json::{Map, Value};

use crate::answers::{AnswerSnapshot, ITEM_ID_KEY, SnapshotError, item_id_of, item_matches};
use crate::path::{FieldPath, ItemId};
use crate::spec::{FieldSpec, FormSchema};
use crate::visibility::field_visibility;

/// One sub-record of a repeatable group.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupItem {
    pub id: ItemId,
    pub values: Map<String, Value>,
}

impl GroupItem {
    pub fn blank() -> Self {
        Self {
            id: ItemId::generate(),
            values: Map::new(),
        }
    }

    fn to_value(&self) -> Value {
        let mut map = self.values.clone();
        map.insert(ITEM_ID_KEY.into(), Value::String(self.id.to_string()));
        Value::Object(map)
    }
}

/// Ordered items of one group. Never empty.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupInstance {
    items: Vec<GroupItem>,
}

impl Default for GroupInstance {
    fn default() -> Self {
        Self::new()
    }
}

impl GroupInstance {
    /// A group holding one blank item.
    pub fn new() -> Self {
        Self {
            items: vec![GroupItem::blank()],
        }
    }

    /// Reads a persisted group array. Items without an id get a fresh one,
    /// non-object entries are dropped and an empty array yields one blank item.
    pub fn from_value(value: Option<&Value>) -> Self {
        let items: Vec<GroupItem> = value
            .and_then(Value::as_array)
            .into_iter()
            .flatten()
            .filter_map(Value::as_object)
            .map(|entry| {
                let id = item_id_of(entry).map_or_else(ItemId::generate, ItemId::from);
                let mut values = entry.clone();
                values.remove(ITEM_ID_KEY);
                GroupItem { id, values }
            })
            .collect();
        if items.is_empty() {
            Self::new()
        } else {
            Self { items }
        }
    }

    pub fn to_value(&self) -> Value {
        Value::Array(self.items.iter().map(GroupItem::to_value).collect())
    }

    pub fn items(&self) -> &[GroupItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Appends a blank item and returns its id.
    pub fn add(&mut self) -> ItemId {
        let item = GroupItem::blank();
        let id = item.id.clone();
        self.items.push(item);
        id
    }

    /// Removes the item with `id`. Removing the last item or an unknown id
    /// is a no-op returning `false`.
    pub fn remove(&mut self, id: &ItemId) -> bool {
        if self.items.len() <= 1 {
            return false;
        }
        let Some(index) = self.items.iter().position(|item| &item.id == id) else {
            return false;
        };
        self.items.remove(index);
        true
    }
}

fn group_field<'a>(
    schema: &'a FormSchema,
    path: &FieldPath,
) -> Result<&'a FieldSpec, SnapshotError> {
    if path.item.is_some() {
        return Err(SnapshotError::NotAGroup(path.to_string()));
    }
    let field = schema
        .find_field(path)
        .ok_or_else(|| SnapshotError::UnknownField(path.to_string()))?;
    if !field.is_group() {
        return Err(SnapshotError::NotAGroup(path.to_string()));
    }
    Ok(field)
}

pub fn add_item(
    schema: &FormSchema,
    snapshot: &mut AnswerSnapshot,
    group: &FieldPath,
) -> Result<ItemId, SnapshotError> {
    group_field(schema, group)?;
    let mut instance = GroupInstance::from_value(snapshot.get(group));
    let id = instance.add();
    snapshot.set(group, instance.to_value())?;
    Ok(id)
}

pub fn remove_item(
    schema: &FormSchema,
    snapshot: &mut AnswerSnapshot,
    group: &FieldPath,
    item: &ItemId,
) -> Result<bool, SnapshotError> {
    group_field(schema, group)?;
    let current = snapshot.get(group);
    let position = current
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(Value::as_object)
        .enumerate()
        .position(|(index, entry)| item_matches(index, entry, item));
    let mut instance = GroupInstance::from_value(current);
    let target = position
        .and_then(|index| instance.items.get(index))
        .map(|entry| entry.id.clone());
    let Some(target) = target else {
        return Ok(false);
    };
    if !instance.remove(&target) {
        return Ok(false);
    }
    snapshot.set(group, instance.to_value())?;
    Ok(true)
}

/// Seeds one blank item into every visible group that has none and mints
/// ids for persisted items lacking one. Returns the paths of groups written.
pub fn ensure_visible_groups(schema: &FormSchema, snapshot: &mut AnswerSnapshot) -> Vec<String> {
    let groups: Vec<FieldPath> = field_visibility(schema, snapshot)
        .into_iter()
        .filter(|(path, visible)| *visible && path.item.is_none())
        .map(|(path, _)| path)
        .filter(|path| schema.find_field(path).is_some_and(FieldSpec::is_group))
        .collect();

    let mut seeded = Vec::new();
    for path in groups {
        let current = snapshot.get(&path);
        let complete = current
            .and_then(Value::as_array)
            .is_some_and(|items| {
                !items.is_empty()
                    && items
                        .iter()
                        .all(|item| item.as_object().and_then(item_id_of).is_some())
            });
        if complete {
            continue;
        }
        let instance = GroupInstance::from_value(current);
        if snapshot.set(&path, instance.to_value()).is_ok() {
            seeded.push(path.to_string());
        }
    }
    seeded
}
