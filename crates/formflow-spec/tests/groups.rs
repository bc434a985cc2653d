mod common;

use common::path;
use formflow_spec::{
    AnswerSnapshot, GroupInstance, ItemId, SnapshotError, add_item, ensure_visible_groups,
    remove_item,
};
use proptest::prelude::*;
use serde_json::{Value, json};

fn companions_snapshot() -> AnswerSnapshot {
    AnswerSnapshot::from(json!({
        "companions": {
            "has_companions": "Y",
            "companions": [{"$id": "first", "companion_surname": "Roe"}]
        }
    }))
}

fn item_ids(snapshot: &AnswerSnapshot) -> Vec<String> {
    snapshot
        .get(&path("companions.companions"))
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item.get("$id").and_then(Value::as_str).map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}

#[test]
fn add_then_remove_by_stable_id() {
    let schema = common::visa_schema();
    let mut snapshot = companions_snapshot();
    let group = path("companions.companions");

    let second = add_item(&schema, &mut snapshot, &group).expect("add");
    let third = add_item(&schema, &mut snapshot, &group).expect("add");
    assert_eq!(item_ids(&snapshot).len(), 3);

    let removed = remove_item(&schema, &mut snapshot, &group, &second);
    assert_eq!(removed, Ok(true));
    assert_eq!(
        item_ids(&snapshot),
        vec!["first".to_string(), third.to_string()]
    );
    assert_eq!(
        snapshot.get(&path("companions.companions[first].companion_surname")),
        Some(&json!("Roe"))
    );
}

#[test]
fn removing_last_or_unknown_item_is_a_no_op() {
    let schema = common::visa_schema();
    let mut snapshot = companions_snapshot();
    let group = path("companions.companions");

    let only = ItemId::from("first");
    let removed = remove_item(&schema, &mut snapshot, &group, &only);
    assert_eq!(removed, Ok(false));
    add_item(&schema, &mut snapshot, &group).expect("add");
    let ghost = ItemId::from("ghost");
    let removed = remove_item(&schema, &mut snapshot, &group, &ghost);
    assert_eq!(removed, Ok(false));
    assert_eq!(item_ids(&snapshot).len(), 2);
}

#[test]
fn group_operations_reject_non_groups() {
    let schema = common::visa_schema();
    let mut snapshot = companions_snapshot();
    let scalar = path("companions.has_companions");
    assert_eq!(
        add_item(&schema, &mut snapshot, &scalar),
        Err(SnapshotError::NotAGroup("companions.has_companions".into()))
    );
}

#[test]
fn ensure_visible_groups_seeds_and_mints_ids() {
    let schema = common::visa_schema();
    let mut seeded = AnswerSnapshot::from(json!({"companions": {"has_companions": "Y"}}));
    assert_eq!(
        ensure_visible_groups(&schema, &mut seeded),
        vec!["companions.companions".to_string()]
    );
    assert_eq!(item_ids(&seeded).len(), 1);
    assert!(ensure_visible_groups(&schema, &mut seeded).is_empty());

    let mut legacy = AnswerSnapshot::from(json!({
        "companions": {
            "has_companions": "Y",
            "companions": [{"companion_surname": "Roe"}, {"$id": "kept"}]
        }
    }));
    ensure_visible_groups(&schema, &mut legacy);
    let ids = item_ids(&legacy);
    assert_eq!(ids.len(), 2);
    assert_eq!(ids[1], "kept");

    let mut hidden = AnswerSnapshot::from(json!({"companions": {"has_companions": "N"}}));
    assert!(ensure_visible_groups(&schema, &mut hidden).is_empty());
}

#[test]
fn group_instance_from_empty_value_has_one_item() {
    assert_eq!(GroupInstance::from_value(None).len(), 1);
    assert_eq!(GroupInstance::from_value(Some(&json!([]))).len(), 1);
    assert_eq!(GroupInstance::from_value(Some(&json!([1, "x"]))).len(), 1);
}

#[derive(Debug, Clone)]
enum Op {
    Add,
    Remove(usize),
    RemoveUnknown,
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        Just(Op::Add),
        (0usize..8).prop_map(Op::Remove),
        Just(Op::RemoveUnknown),
    ]
}

proptest! {
    #[test]
    fn group_never_becomes_empty(ops in proptest::collection::vec(op(), 0..40)) {
        let mut instance = GroupInstance::new();
        for op in ops {
            match op {
                Op::Add => {
                    instance.add();
                }
                Op::Remove(index) => {
                    let target = instance.items()[index % instance.len()].id.clone();
                    let before = instance.len();
                    let removed = instance.remove(&target);
                    prop_assert_eq!(removed, before > 1);
                }
                Op::RemoveUnknown => {
                    let before = instance.len();
                    prop_assert!(!instance.remove(&ItemId::from("unknown")));
                    prop_assert_eq!(instance.len(), before);
                }
            }
            prop_assert!(instance.len() >= 1);
        }
    }
}

#[test]
fn items_without_stored_id_are_removed_by_position() {
    let schema = common::visa_schema();
    let mut snapshot = AnswerSnapshot::from(json!({
        "companions": {
            "has_companions": "Y",
            "companions": [{"companion_surname": "Roe"}, {"companion_surname": "Poe"}]
        }
    }));
    let group = path("companions.companions");

    let second = ItemId::from("#1");
    let removed = remove_item(&schema, &mut snapshot, &group, &second);
    assert_eq!(removed, Ok(true));
    let surnames: Vec<Value> = snapshot
        .get(&group)
        .and_then(Value::as_array)
        .expect("items")
        .iter()
        .map(|item| item["companion_surname"].clone())
        .collect();
    assert_eq!(surnames, vec![json!("Roe")]);
    let beyond = ItemId::from("#5");
    let removed = remove_item(&schema, &mut snapshot, &group, &beyond);
    assert_eq!(removed, Ok(false));
}
