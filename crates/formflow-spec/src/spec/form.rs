use std::collections::BTreeSet;

use regex::Regex;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::path::FieldPath;
use crate::spec::field::FieldSpec;
use crate::spec::section::SectionSpec;

/// Top-level description of a multi-step form. Each section is one wizard
/// step; the last section is the terminal review/submit step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct FormSchema {
    pub id: String,
    pub title: String,
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub sections: Vec<SectionSpec>,
}

/// Consistency problems found while loading a schema.
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("failed to parse form schema: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("form '{0}' declares no sections")]
    NoSections(String),
    #[error("duplicate section id '{0}'")]
    DuplicateSection(String),
    #[error("duplicate field id '{field}' in scope '{scope}'")]
    DuplicateField { scope: String, field: String },
    #[error("identifier '{0}' may not contain '.', '[' or ']'")]
    InvalidIdentifier(String),
    #[error("group field '{0}' has no item template")]
    MissingTemplate(String),
    #[error("group field '{0}' nests another group")]
    NestedGroup(String),
    #[error("override flag '{flag}' collides with a field id in scope '{scope}'")]
    FlagCollision { scope: String, flag: String },
    #[error("field '{field}' has an invalid pattern: {source}")]
    InvalidPattern {
        field: String,
        #[source]
        source: regex::Error,
    },
}

impl FormSchema {
    /// Parses a JSON schema document and runs [`FormSchema::check`].
    pub fn from_json(raw: &str) -> Result<Self, SchemaError> {
        let schema: FormSchema = serde_json::from_str(raw)?;
        schema.check()?;
        Ok(schema)
    }

    pub fn step_count(&self) -> usize {
        self.sections.len()
    }

    pub fn terminal_step(&self) -> usize {
        self.sections.len().saturating_sub(1)
    }

    pub fn section(&self, step: usize) -> Option<&SectionSpec> {
        self.sections.get(step)
    }

    pub fn section_by_id(&self, id: &str) -> Option<(usize, &SectionSpec)> {
        self.sections
            .iter()
            .enumerate()
            .find(|(_, section)| section.id == id)
    }

    /// Looks up the definition addressed by `path`, descending into the
    /// group template for item paths.
    pub fn find_field(&self, path: &FieldPath) -> Option<&FieldSpec> {
        let (_, section) = self.section_by_id(&path.section)?;
        let field = section.find_field(&path.field)?;
        match &path.item {
            None => Some(field),
            Some(item) => field.template_field(&item.field),
        }
    }

    /// Definitions sharing the scope of `path`: the item template for item
    /// paths, the whole section otherwise.
    pub fn scope_fields(&self, path: &FieldPath) -> Vec<&FieldSpec> {
        let Some((_, section)) = self.section_by_id(&path.section) else {
            return Vec::new();
        };
        match &path.item {
            None => section.fields().collect(),
            Some(_) => section
                .find_field(&path.field)
                .map(|group| group.template().iter().collect())
                .unwrap_or_default(),
        }
    }

    pub fn check(&self) -> Result<(), SchemaError> {
        if self.sections.is_empty() {
            return Err(SchemaError::NoSections(self.id.clone()));
        }
        let mut section_ids = BTreeSet::new();
        for section in &self.sections {
            check_identifier(&section.id)?;
            if !section_ids.insert(section.id.as_str()) {
                return Err(SchemaError::DuplicateSection(section.id.clone()));
            }
            let fields: Vec<&FieldSpec> = section.fields().collect();
            check_scope(&section.id, &fields)?;
            for field in fields.iter().filter(|field| field.is_group()) {
                let template = field
                    .group
                    .as_ref()
                    .ok_or_else(|| SchemaError::MissingTemplate(field.id.clone()))?;
                if let Some(nested) = template.fields.iter().find(|inner| inner.is_group()) {
                    return Err(SchemaError::NestedGroup(nested.id.clone()));
                }
                let scope = format!("{}.{}", section.id, field.id);
                check_scope(&scope, &template.fields.iter().collect::<Vec<_>>())?;
            }
        }
        Ok(())
    }
}

fn check_scope(scope: &str, fields: &[&FieldSpec]) -> Result<(), SchemaError> {
    let mut ids = BTreeSet::new();
    for field in fields {
        check_identifier(&field.id)?;
        if !ids.insert(field.id.as_str()) {
            return Err(SchemaError::DuplicateField {
                scope: scope.to_string(),
                field: field.id.clone(),
            });
        }
        if let Some(pattern) = field.constraint.as_ref().and_then(|c| c.pattern.as_ref()) {
            Regex::new(pattern).map_err(|source| SchemaError::InvalidPattern {
                field: field.id.clone(),
                source,
            })?;
        }
    }
    let flags = fields.iter().filter_map(|field| field.override_flag.as_deref());
    for flag in flags {
        check_identifier(flag)?;
        if ids.contains(flag) {
            return Err(SchemaError::FlagCollision {
                scope: scope.to_string(),
                flag: flag.to_string(),
            });
        }
    }
    Ok(())
}

fn check_identifier(id: &str) -> Result<(), SchemaError> {
    if id.is_empty() || id.contains(['.', '[', ']']) {
        return Err(SchemaError::InvalidIdentifier(id.to_string()));
    }
    Ok(())
}
