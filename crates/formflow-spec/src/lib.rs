#![allow(missing_docs)]

pub mod answers;
pub mod context;
pub mod edit;
pub mod expr;
pub mod groups;
pub mod identity;
pub mod overrides;
pub mod path;
pub mod progress;
pub mod resume;
pub mod review;
pub mod spec;
pub mod validate;
pub mod visibility;

pub use answers::{
    AnswerSnapshot, ITEM_ID_KEY, SnapshotDiff, SnapshotError, ValidationError, ValidationResult,
    is_blank,
};
pub use context::build_expression_context;
pub use edit::{apply_edit, purge_hidden};
pub use expr::Expr;
pub use groups::{GroupInstance, GroupItem, add_item, ensure_visible_groups, remove_item};
pub use identity::{ApplicationId, ApplicationStatus, IdentityError};
pub use overrides::{is_overridden, required_rule_active, set_override};
pub use path::{FieldPath, ItemId, ItemRef};
pub use progress::{NavigationError, SectionProgress, WizardError, WizardState, section_progress};
pub use resume::{SectionOrdinals, infer_resume_point};
pub use review::{ReviewContent, ReviewDocument, ReviewSection, build_review};
pub use spec::{
    Constraint, DateRule, FieldKind, FieldSpec, FormSchema, GroupSpec, SchemaError, ScopedField,
    SectionEntry, SectionSpec,
};
pub use validate::{ValidationOptions, validate_document, validate_section};
pub use visibility::{
    VisibilityMap, VisibleField, VisibleItem, VisibleSection, field_visibility, is_shown, resolve,
    resolve_all, visibility_map,
};
