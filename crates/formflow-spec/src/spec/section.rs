use crate::expr::Expr;
use crate::spec::field::FieldSpec;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// One entry of a section: a field, or a nested block that shares the
/// section's answer scope and may carry its own visibility gate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SectionEntry {
    Field(FieldSpec),
    Block(SectionSpec),
}

/// A wizard step (top level) or a conditional block (nested).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SectionSpec {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visible_if: Option<Expr>,
    #[serde(default)]
    pub entries: Vec<SectionEntry>,
}

/// A field together with the block gates enclosing it.
#[derive(Debug, Clone)]
pub struct ScopedField<'a> {
    pub field: &'a FieldSpec,
    pub gates: Vec<&'a Expr>,
}

impl SectionSpec {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            visible_if: None,
            entries: Vec::new(),
        }
    }

    pub fn field(mut self, field: FieldSpec) -> Self {
        self.entries.push(SectionEntry::Field(field));
        self
    }

    pub fn block(mut self, block: SectionSpec) -> Self {
        self.entries.push(SectionEntry::Block(block));
        self
    }

    pub fn visible_if(mut self, expr: Expr) -> Self {
        self.visible_if = Some(expr);
        self
    }

    /// Every field of this scope in declaration order, blocks flattened.
    /// The section's own gate is not included in `gates`.
    pub fn scoped_fields(&self) -> Vec<ScopedField<'_>> {
        let mut out = Vec::new();
        collect_scoped(&self.entries, &mut Vec::new(), &mut out);
        out
    }

    pub fn fields(&self) -> impl Iterator<Item = &FieldSpec> {
        self.scoped_fields().into_iter().map(|scoped| scoped.field)
    }

    pub fn find_field(&self, id: &str) -> Option<&FieldSpec> {
        self.fields().find(|field| field.id == id)
    }
}

fn collect_scoped<'a>(
    entries: &'a [SectionEntry],
    gates: &mut Vec<&'a Expr>,
    out: &mut Vec<ScopedField<'a>>,
) {
    for entry in entries {
        match entry {
            SectionEntry::Field(field) => out.push(ScopedField {
                field,
                gates: gates.clone(),
            }),
            SectionEntry::Block(block) => {
                let pushed = if let Some(expr) = &block.visible_if {
                    gates.push(expr);
                    true
                } else {
                    false
                };
                collect_scoped(&block.entries, gates, out);
                if pushed {
                    gates.pop();
                }
            }
        }
    }
}
