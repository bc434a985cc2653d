pub mod field;
pub mod form;
pub mod section;

pub use field::{Constraint, DateRule, FieldKind, FieldSpec, GroupSpec};
pub use form::{FormSchema, SchemaError};
pub use section::{ScopedField, SectionEntry, SectionSpec};
