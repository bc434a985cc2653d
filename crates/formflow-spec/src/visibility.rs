use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::answers::{AnswerSnapshot, item_key};
use crate::context::{build_expression_context, with_item};
use crate::expr::Expr;
use crate::overrides::{is_overridden, required_rule_active};
use crate::path::{FieldPath, ItemId};
use crate::spec::{FieldSpec, FormSchema, SectionSpec};

pub type VisibilityMap = BTreeMap<String, bool>;

/// Fields of one step that are currently relevant, in declaration order.
#[derive(Debug, Clone, Serialize)]
pub struct VisibleSection<'a> {
    pub ordinal: usize,
    pub id: &'a str,
    pub title: &'a str,
    /// `false` when the section's own gate is closed; `fields` is then empty.
    pub visible: bool,
    pub fields: Vec<VisibleField<'a>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct VisibleField<'a> {
    pub path: FieldPath,
    pub spec: &'a FieldSpec,
    /// Whether the required rule currently applies.
    pub required: bool,
    pub overridden: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub items: Vec<VisibleItem<'a>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct VisibleItem<'a> {
    pub id: ItemId,
    pub fields: Vec<VisibleField<'a>>,
}

impl VisibleSection<'_> {
    /// Visible fields including those inside group items.
    pub fn flatten(&self) -> Vec<&VisibleField<'_>> {
        let mut out = Vec::new();
        for field in &self.fields {
            out.push(field);
            for item in &field.items {
                out.extend(item.fields.iter());
            }
        }
        out
    }
}

/// A missing gate is open; an undecided gate is closed.
pub fn is_shown(gate: Option<&Expr>, ctx: &Value) -> bool {
    gate.is_none_or(|expr| expr.evaluate_bool(ctx) == Some(true))
}

/// Projects the visible fields of step `step`. Never mutates `snapshot`.
pub fn resolve<'a>(
    schema: &'a FormSchema,
    snapshot: &AnswerSnapshot,
    step: usize,
) -> Option<VisibleSection<'a>> {
    let section = schema.section(step)?;
    let ctx = build_expression_context(snapshot, &section.id, None);
    let visible = is_shown(section.visible_if.as_ref(), &ctx);
    let fields = if visible {
        section_fields(section, snapshot, &ctx)
    } else {
        Vec::new()
    };
    Some(VisibleSection {
        ordinal: step,
        id: &section.id,
        title: &section.title,
        visible,
        fields,
    })
}

pub fn resolve_all<'a>(
    schema: &'a FormSchema,
    snapshot: &AnswerSnapshot,
) -> Vec<VisibleSection<'a>> {
    (0..schema.step_count())
        .filter_map(|step| resolve(schema, snapshot, step))
        .collect()
}

/// Visibility of every known field path, hidden ones included.
pub fn field_visibility(
    schema: &FormSchema,
    snapshot: &AnswerSnapshot,
) -> BTreeMap<FieldPath, bool> {
    let mut map = BTreeMap::new();
    for section in &schema.sections {
        let ctx = build_expression_context(snapshot, &section.id, None);
        let section_open = is_shown(section.visible_if.as_ref(), &ctx);
        for scoped in section.scoped_fields() {
            let path = FieldPath::new(section.id.clone(), scoped.field.id.clone());
            let visible = section_open
                && scoped.gates.iter().all(|gate| is_shown(Some(*gate), &ctx))
                && is_shown(scoped.field.visible_if.as_ref(), &ctx);
            if scoped.field.is_group() {
                for (item_id, item) in group_items(snapshot, &path) {
                    let item_ctx = with_item(&ctx, item);
                    for template in scoped.field.template() {
                        let item_path = FieldPath::item_field(
                            section.id.clone(),
                            scoped.field.id.clone(),
                            item_id.clone(),
                            template.id.clone(),
                        );
                        let shown = visible && is_shown(template.visible_if.as_ref(), &item_ctx);
                        map.insert(item_path, shown);
                    }
                }
            }
            map.insert(path, visible);
        }
    }
    map
}

pub fn visibility_map(schema: &FormSchema, snapshot: &AnswerSnapshot) -> VisibilityMap {
    field_visibility(schema, snapshot)
        .into_iter()
        .map(|(path, visible)| (path.to_string(), visible))
        .collect()
}

fn section_fields<'a>(
    section: &'a SectionSpec,
    snapshot: &AnswerSnapshot,
    ctx: &Value,
) -> Vec<VisibleField<'a>> {
    let scope = snapshot.section(&section.id);
    let mut out = Vec::new();
    for scoped in section.scoped_fields() {
        let open = scoped.gates.iter().all(|gate| is_shown(Some(*gate), ctx))
            && is_shown(scoped.field.visible_if.as_ref(), ctx);
        if !open {
            continue;
        }
        let path = FieldPath::new(section.id.clone(), scoped.field.id.clone());
        let mut field = visible_field(path.clone(), scoped.field, scope);
        if scoped.field.is_group() {
            field.items = group_items(snapshot, &path)
                .map(|(id, item)| {
                    let item_ctx = with_item(ctx, item);
                    let fields = scoped
                        .field
                        .template()
                        .iter()
                        .filter(|template| is_shown(template.visible_if.as_ref(), &item_ctx))
                        .map(|template| {
                            let item_path = FieldPath::item_field(
                                section.id.clone(),
                                scoped.field.id.clone(),
                                id.clone(),
                                template.id.clone(),
                            );
                            visible_field(item_path, template, Some(item))
                        })
                        .collect();
                    VisibleItem { id, fields }
                })
                .collect();
        }
        out.push(field);
    }
    out
}

fn visible_field<'a>(
    path: FieldPath,
    spec: &'a FieldSpec,
    scope: Option<&Map<String, Value>>,
) -> VisibleField<'a> {
    let overridden = is_overridden(scope, spec);
    VisibleField {
        path,
        spec,
        required: required_rule_active(spec, true, overridden),
        overridden,
        items: Vec::new(),
    }
}

/// Every item object of the group at `path` with its key. Items without a
/// stored id are keyed by position.
pub(crate) fn group_items<'s>(
    snapshot: &'s AnswerSnapshot,
    path: &FieldPath,
) -> impl Iterator<Item = (ItemId, &'s Map<String, Value>)> {
    snapshot
        .section(&path.section)
        .and_then(|section| section.get(&path.field))
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(Value::as_object)
        .enumerate()
        .map(|(index, item)| (item_key(index, item), item))
}
