use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::answers::{AnswerSnapshot, is_blank};
use crate::spec::FormSchema;

/// Read-only projection of a snapshot for the viewer, one entry per section
/// in schema order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewDocument {
    pub form_id: String,
    pub title: String,
    pub sections: Vec<ReviewSection>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewSection {
    pub id: String,
    pub title: String,
    pub content: ReviewContent,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", content = "answers", rename_all = "snake_case")]
pub enum ReviewContent {
    Provided(Map<String, Value>),
    NotProvided,
}

impl ReviewContent {
    pub fn is_provided(&self) -> bool {
        matches!(self, ReviewContent::Provided(_))
    }
}

pub fn build_review(schema: &FormSchema, snapshot: &AnswerSnapshot) -> ReviewDocument {
    let sections = schema
        .sections
        .iter()
        .map(|section| {
            let content = match snapshot.section(&section.id) {
                Some(answers) if answers.values().any(|value| !is_blank(value)) => {
                    ReviewContent::Provided(answers.clone())
                }
                _ => ReviewContent::NotProvided,
            };
            ReviewSection {
                id: section.id.clone(),
                title: section.title.clone(),
                content,
            }
        })
        .collect();
    ReviewDocument {
        form_id: schema.id.clone(),
        title: schema.title.clone(),
        sections,
    }
}
