use serde_json::{Map, Value};

use crate::answers::AnswerSnapshot;

/// Builds the context visibility expressions are evaluated against.
///
/// Every section is addressable as `section.field`, the fields of the
/// current section are also in scope by bare id, the full snapshot sits under
/// `answers`, and for group item fields the item object sits under `item`.
pub fn build_expression_context(
    snapshot: &AnswerSnapshot,
    section_id: &str,
    item: Option<&Map<String, Value>>,
) -> Value {
    let mut map = Map::new();
    for (key, value) in snapshot.sections() {
        map.insert(key.clone(), value.clone());
    }
    if let Some(section) = snapshot.section(section_id) {
        for (key, value) in section {
            map.insert(key.clone(), value.clone());
        }
    }
    map.insert("answers".into(), snapshot.to_value());
    if let Some(item) = item {
        map.insert("item".into(), Value::Object(item.clone()));
    }
    Value::Object(map)
}

/// Adds `item` to an already built section context.
pub(crate) fn with_item(section_ctx: &Value, item: &Map<String, Value>) -> Value {
    let mut ctx = section_ctx.clone();
    if let Some(map) = ctx.as_object_mut() {
        map.insert("item".into(), Value::Object(item.clone()));
    }
    ctx
}
