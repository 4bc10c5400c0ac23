pub mod catalog;
pub mod codes;
pub mod field;
pub mod rules;

pub use catalog::{default_record, path, standard_rules, standard_schema, FormDefinition, SECTIONS};
pub use codes::{label_for, CodedEnum};
pub use field::{FieldKind, FieldSchema, FieldSpec, Pattern, SchemaError};
pub use rules::{ConditionalRule, Predicate};
