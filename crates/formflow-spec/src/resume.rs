use std::collections::BTreeMap;

use crate::answers::AnswerSnapshot;
use crate::spec::FormSchema;

/// Section id to wizard step.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SectionOrdinals(BTreeMap<String, usize>);

impl SectionOrdinals {
    pub fn from_schema(schema: &FormSchema) -> Self {
        schema
            .sections
            .iter()
            .enumerate()
            .map(|(ordinal, section)| (section.id.clone(), ordinal))
            .collect()
    }

    pub fn get(&self, section: &str) -> Option<usize> {
        self.0.get(section).copied()
    }
}

impl<S: Into<String>> FromIterator<(S, usize)> for SectionOrdinals {
    fn from_iter<I: IntoIterator<Item = (S, usize)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(id, n)| (id.into(), n)).collect())
    }
}

/// Step at which a persisted draft reopens: the highest ordinal among
/// sections holding at least one key. Unknown sections are ignored; an empty
/// snapshot reopens at 0.
pub fn infer_resume_point(snapshot: &AnswerSnapshot, ordinals: &SectionOrdinals) -> usize {
    snapshot
        .sections()
        .filter(|(_, value)| value.as_object().is_some_and(|fields| !fields.is_empty()))
        .filter_map(|(id, _)| ordinals.get(id))
        .max()
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn picks_highest_non_empty_section() {
        let ordinals: SectionOrdinals = [("A", 0), ("B", 1), ("C", 2)].into_iter().collect();
        let snapshot = AnswerSnapshot::from(json!({"A": {"x": 1}, "C": {"y": 2}}));
        assert_eq!(infer_resume_point(&snapshot, &ordinals), 2);
    }

    #[test]
    fn ignores_empty_and_unknown_sections() {
        let ordinals: SectionOrdinals = [("A", 0), ("B", 1), ("C", 2)].into_iter().collect();
        let snapshot = AnswerSnapshot::from(json!({"A": {"x": 1}, "C": {}, "Z": {"q": true}}));
        assert_eq!(infer_resume_point(&snapshot, &ordinals), 0);
        assert_eq!(infer_resume_point(&AnswerSnapshot::new(), &ordinals), 0);
    }

    #[test]
    fn non_object_sections_do_not_count() {
        let ordinals: SectionOrdinals = [("A", 0), ("B", 1)].into_iter().collect();
        let snapshot = AnswerSnapshot::from(json!({"B": "stray"}));
        assert_eq!(infer_resume_point(&snapshot, &ordinals), 0);
    }
}
