use serde_json::Value;

use crate::record::FormRecord;

/// Condition evaluated against the trigger field's current value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Predicate {
    /// Trigger is a string equal to the code.
    Equals(&'static str),
    /// Trigger is boolean `true`.
    IsTrue,
    /// Trigger is an array holding the code.
    Contains(&'static str),
}

impl Predicate {
    pub fn holds(&self, value: Option<&Value>) -> bool {
        let Some(value) = value else {
            return false;
        };

        match self {
            Self::Equals(expected) => value.as_str() == Some(*expected),
            Self::IsTrue => value.as_bool() == Some(true),
            Self::Contains(expected) => value
                .as_array()
                .is_some_and(|items| items.iter().any(|item| item.as_str() == Some(*expected))),
        }
    }
}

/// `dependent` is active only while `trigger` satisfies `predicate`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConditionalRule {
    pub trigger: &'static str,
    pub predicate: Predicate,
    pub dependent: &'static str,
}

impl ConditionalRule {
    pub const fn new(trigger: &'static str, predicate: Predicate, dependent: &'static str) -> Self {
        Self { trigger, predicate, dependent }
    }

    pub fn holds(&self, record: &FormRecord) -> bool {
        self.predicate.holds(record.get(self.trigger))
    }
}
