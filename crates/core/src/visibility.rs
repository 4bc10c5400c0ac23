use std::collections::BTreeSet;

use crate::record::FormRecord;
use crate::schema::catalog::SECTIONS;
use crate::schema::{ConditionalRule, FieldSchema};

pub type ActiveFields = BTreeSet<&'static str>;

/// Field paths the current record makes subject to checks.
///
/// Starts from every schema path and drops each rule's dependent unless its
/// trigger predicate holds right now. Recompute after every edit.
pub fn active_fields(
    schema: &FieldSchema,
    rules: &[ConditionalRule],
    record: &FormRecord,
) -> ActiveFields {
    let mut active: ActiveFields = schema.paths().collect();
    for rule in rules {
        if !rule.holds(record) {
            active.remove(rule.dependent);
        }
    }
    active
}

/// Copy of `record` holding only schema fields that are active.
///
/// Dormant values stay in the source record so toggling a trigger back
/// restores them; they simply never reach the payload. Every section object
/// is present in the result even when empty.
pub fn prune_inactive(schema: &FieldSchema, active: &ActiveFields, record: &FormRecord) -> FormRecord {
    let mut pruned = FormRecord::new();
    for section in SECTIONS {
        pruned.ensure_section(section);
    }
    for path in schema.paths().filter(|path| active.contains(path)) {
        if let Some(value) = record.get(path) {
            pruned.set(path, value.clone());
        }
    }
    pruned
}
