use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::record::FormRecord;
use crate::schema::field::{FieldKind, FieldSchema, FieldSpec};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueCode {
    OutOfRange,
    PatternMismatch,
    WrongLength,
    NotAMember,
    ArrayTooShort,
    RequiredButMissing,
    TypeMismatch,
    UnknownField,
}

impl IssueCode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::OutOfRange => "out_of_range",
            Self::PatternMismatch => "pattern_mismatch",
            Self::WrongLength => "wrong_length",
            Self::NotAMember => "not_a_member",
            Self::ArrayTooShort => "array_too_short",
            Self::RequiredButMissing => "required_but_missing",
            Self::TypeMismatch => "type_mismatch",
            Self::UnknownField => "unknown_field",
        }
    }
}

/// One field, one reason. Blocks only the step that owns the field.
#[derive(Clone, Debug, Error, PartialEq, Eq, Serialize, Deserialize)]
#[error("{path}: {message}")]
pub struct FieldIssue {
    pub path: String,
    pub code: IssueCode,
    pub message: String,
}

impl FieldIssue {
    pub fn new(path: impl Into<String>, code: IssueCode, message: impl Into<String>) -> Self {
        Self { path: path.into(), code, message: message.into() }
    }
}

impl FieldSchema {
    /// Checks a single value against the field's type and constraints.
    pub fn validate_field(&self, path: &str, value: &Value) -> Result<(), FieldIssue> {
        match self.get(path) {
            Some(field) => check_value(field, value),
            None => Err(FieldIssue::new(path, IssueCode::UnknownField, "is not a known field")),
        }
    }

    /// Validates the fields named in `active`, in schema order.
    ///
    /// Absent optional fields pass; present ones must be valid. Fields outside
    /// `active` are ignored whatever the record holds for them.
    pub fn validate_record(
        &self,
        record: &FormRecord,
        active: &BTreeSet<&'static str>,
    ) -> Vec<FieldIssue> {
        let mut issues = Vec::new();

        for field in self.fields().iter().filter(|field| active.contains(field.path)) {
            match record.get(field.path) {
                None if field.required => issues.push(FieldIssue::new(
                    field.path,
                    IssueCode::RequiredButMissing,
                    "is required",
                )),
                None => {}
                Some(value) => {
                    if let Err(issue) = check_value(field, value) {
                        issues.push(issue);
                    }
                }
            }
        }

        issues
    }
}

fn check_value(field: &FieldSpec, value: &Value) -> Result<(), FieldIssue> {
    let fail = |code: IssueCode, message: String| -> Result<(), FieldIssue> {
        Err(FieldIssue::new(field.path, code, message))
    };

    match &field.kind {
        FieldKind::Text { min_len, max_len, pattern } => {
            let Some(text) = value.as_str() else {
                return fail(IssueCode::TypeMismatch, "expected text".to_string());
            };
            let length = text.chars().count();
            let too_short = min_len.is_some_and(|min| length < min);
            let too_long = max_len.is_some_and(|max| length > max);
            if too_short || too_long {
                return fail(IssueCode::WrongLength, length_message(*min_len, *max_len));
            }
            if let Some(pattern) = pattern {
                if !pattern.is_match(text) {
                    return fail(IssueCode::PatternMismatch, pattern.hint().to_string());
                }
            }
            Ok(())
        }
        FieldKind::Number { min, max } => {
            let Some(number) = value.as_f64() else {
                return fail(IssueCode::TypeMismatch, "expected a number".to_string());
            };
            let below = min.is_some_and(|min| number < min);
            let above = max.is_some_and(|max| number > max);
            if below || above {
                return fail(IssueCode::OutOfRange, range_message(*min, *max));
            }
            Ok(())
        }
        FieldKind::Boolean => {
            if value.is_boolean() {
                Ok(())
            } else {
                fail(IssueCode::TypeMismatch, "expected true or false".to_string())
            }
        }
        FieldKind::Enum { members } => {
            let Some(code) = value.as_str() else {
                return fail(IssueCode::TypeMismatch, "expected one of the listed options".into());
            };
            if members.iter().any(|member| *member == code) {
                Ok(())
            } else {
                fail(IssueCode::NotAMember, membership_message(code, members))
            }
        }
        FieldKind::EnumArray { members, min_items } => {
            let Some(items) = value.as_array() else {
                return fail(IssueCode::TypeMismatch, "expected a list of options".to_string());
            };
            for item in items {
                let Some(code) = item.as_str() else {
                    return fail(IssueCode::TypeMismatch, "expected a list of options".to_string());
                };
                if !members.iter().any(|member| *member == code) {
                    return fail(IssueCode::NotAMember, membership_message(code, members));
                }
            }
            if items.len() < *min_items {
                return fail(
                    IssueCode::ArrayTooShort,
                    format!("select at least {min_items} option(s)"),
                );
            }
            Ok(())
        }
        FieldKind::NumberChoice { allowed } => {
            let Some(number) = value.as_f64() else {
                return fail(IssueCode::TypeMismatch, "expected a number".to_string());
            };
            if allowed.iter().any(|candidate| (candidate - number).abs() < f64::EPSILON) {
                Ok(())
            } else {
                let listed: Vec<String> = allowed.iter().map(|n| n.to_string()).collect();
                fail(IssueCode::NotAMember, format!("must be one of {}", listed.join(", ")))
            }
        }
    }
}

fn length_message(min: Option<usize>, max: Option<usize>) -> String {
    match (min, max) {
        (Some(min), Some(max)) => format!("must be between {min} and {max} characters"),
        (Some(min), None) => format!("must be at least {min} character(s)"),
        (None, Some(max)) => format!("must be at most {max} characters"),
        (None, None) => "has an invalid length".to_string(),
    }
}

fn range_message(min: Option<f64>, max: Option<f64>) -> String {
    match (min, max) {
        (Some(min), Some(max)) => format!("must be between {min} and {max}"),
        (Some(min), None) => format!("must be at least {min}"),
        (None, Some(max)) => format!("must be at most {max}"),
        (None, None) => "is out of range".to_string(),
    }
}

fn membership_message(code: &str, members: &[&'static str]) -> String {
    format!("`{code}` is not one of: {}", members.join(", "))
}
