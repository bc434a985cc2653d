use crate::expr::Expr;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Shape of the value a field stores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    /// A single string, number or boolean.
    #[default]
    Scalar,
    /// An object with `day`, `month` and `year` parts.
    CompositeDate,
    /// An ordered list of sub-records built from a [`GroupSpec`] template.
    Group,
}

/// Calendar checks applied to a complete date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum DateRule {
    /// Not later than today.
    Past,
    /// Strictly after today.
    Future,
    /// Not earlier than 15 May 1915.
    Historical,
}

/// Textual constraints enforced on non-blank string values.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
pub struct Constraint {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_len: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_len: Option<usize>,
}

/// Template for the items of a repeatable group.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
pub struct GroupSpec {
    #[serde(default)]
    pub fields: Vec<FieldSpec>,
}

/// Definition of a single answerable field.
///
/// `id` is a local key: it is unique inside its section (or inside a group
/// item template) and becomes the key under which the value is stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct FieldSpec {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub kind: FieldKind,
    #[serde(default = "default_required")]
    pub required: bool,
    /// Key of the boolean "does not apply" flag stored next to the field.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub override_flag: Option<String>,
    /// Fields sharing a key are cleared together when one of them is overridden.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visible_if: Option<Expr>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub choices: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constraint: Option<Constraint>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub date_rules: Vec<DateRule>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<GroupSpec>,
}

fn default_required() -> bool {
    true
}

impl FieldSpec {
    pub fn new(id: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            id: id.into(),
            title: String::new(),
            kind,
            required: true,
            override_flag: None,
            group_key: None,
            visible_if: None,
            choices: None,
            constraint: None,
            date_rules: Vec::new(),
            group: None,
        }
    }

    pub fn scalar(id: impl Into<String>) -> Self {
        Self::new(id, FieldKind::Scalar)
    }

    pub fn date(id: impl Into<String>) -> Self {
        Self::new(id, FieldKind::CompositeDate)
    }

    pub fn group(id: impl Into<String>, fields: Vec<FieldSpec>) -> Self {
        let mut spec = Self::new(id, FieldKind::Group);
        spec.group = Some(GroupSpec { fields });
        spec
    }

    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    pub fn with_override(mut self, flag: impl Into<String>) -> Self {
        self.override_flag = Some(flag.into());
        self
    }

    pub fn with_group_key(mut self, key: impl Into<String>) -> Self {
        self.group_key = Some(key.into());
        self
    }

    pub fn visible_if(mut self, expr: Expr) -> Self {
        self.visible_if = Some(expr);
        self
    }

    pub fn with_choices<I, S>(mut self, choices: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.choices = Some(choices.into_iter().map(Into::into).collect());
        self
    }

    pub fn is_group(&self) -> bool {
        matches!(self.kind, FieldKind::Group)
    }

    /// Item template fields, empty for non-group fields.
    pub fn template(&self) -> &[FieldSpec] {
        self.group
            .as_ref()
            .map(|group| group.fields.as_slice())
            .unwrap_or_default()
    }

    pub fn template_field(&self, id: &str) -> Option<&FieldSpec> {
        self.template().iter().find(|field| field.id == id)
    }
}
