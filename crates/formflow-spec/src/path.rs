use std::fmt;
use std::str::FromStr;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::answers::SnapshotError;

/// Stable identifier of one repeatable-group item. Survives removal of
/// sibling items, unlike a positional index.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct ItemId(String);

impl ItemId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ItemId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for ItemId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Field inside one group item.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ItemRef {
    pub id: ItemId,
    pub field: String,
}

/// Address of a value inside an answer snapshot.
///
/// Renders as `section.field` or, for group item fields,
/// `section.group[item_id].field`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FieldPath {
    pub section: String,
    pub field: String,
    pub item: Option<ItemRef>,
}

impl FieldPath {
    pub fn new(section: impl Into<String>, field: impl Into<String>) -> Self {
        Self {
            section: section.into(),
            field: field.into(),
            item: None,
        }
    }

    pub fn item_field(
        section: impl Into<String>,
        group: impl Into<String>,
        item: ItemId,
        field: impl Into<String>,
    ) -> Self {
        Self {
            section: section.into(),
            field: group.into(),
            item: Some(ItemRef {
                id: item,
                field: field.into(),
            }),
        }
    }

    /// Key of the value inside its scope map.
    pub fn leaf(&self) -> &str {
        match &self.item {
            Some(item) => &item.field,
            None => &self.field,
        }
    }

    /// Path of another key in the same scope.
    pub fn sibling(&self, key: impl Into<String>) -> Self {
        let mut path = self.clone();
        match &mut path.item {
            Some(item) => item.field = key.into(),
            None => path.field = key.into(),
        }
        path
    }

    /// Path of the group owning an item path.
    pub fn group_path(&self) -> Self {
        Self::new(self.section.clone(), self.field.clone())
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.item {
            Some(item) => write!(
                f,
                "{}.{}[{}].{}",
                self.section, self.field, item.id, item.field
            ),
            None => write!(f, "{}.{}", self.section, self.field),
        }
    }
}

impl FromStr for FieldPath {
    type Err = SnapshotError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let invalid = || SnapshotError::InvalidPath(raw.to_string());
        let (section, rest) = raw.split_once('.').ok_or_else(invalid)?;
        if section.is_empty() || rest.is_empty() {
            return Err(invalid());
        }
        let Some((group, tail)) = rest.split_once('[') else {
            if rest.contains([']', '.']) {
                return Err(invalid());
            }
            return Ok(Self::new(section, rest));
        };
        let (item, field) = tail.split_once("].").ok_or_else(invalid)?;
        if group.is_empty() || item.is_empty() || field.is_empty() || field.contains(['.', '[']) {
            return Err(invalid());
        }
        Ok(Self::item_field(section, group, ItemId::from(item), field))
    }
}

impl Serialize for FieldPath {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for FieldPath {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}
