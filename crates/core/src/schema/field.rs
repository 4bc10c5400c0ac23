use std::collections::HashMap;
use std::fmt;

use regex::Regex;
use thiserror::Error;

/// A regex that must match the whole value, not a substring.
#[derive(Clone)]
pub struct Pattern {
    source: &'static str,
    hint: &'static str,
    regex: Regex,
}

impl Pattern {
    pub fn whole(source: &'static str, hint: &'static str) -> Result<Self, SchemaError> {
        let regex = Regex::new(&format!("^(?:{source})$"))
            .map_err(|error| SchemaError::InvalidPattern { pattern: source, reason: error.to_string() })?;
        Ok(Self { source, hint, regex })
    }

    pub fn source(&self) -> &'static str {
        self.source
    }

    /// Human-facing description of the expected format.
    pub fn hint(&self) -> &'static str {
        self.hint
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }
}

impl fmt::Debug for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pattern").field("source", &self.source).finish()
    }
}

#[derive(Clone, Debug)]
pub enum FieldKind {
    Text { min_len: Option<usize>, max_len: Option<usize>, pattern: Option<Pattern> },
    Number { min: Option<f64>, max: Option<f64> },
    Boolean,
    Enum { members: Vec<&'static str> },
    EnumArray { members: Vec<&'static str>, min_items: usize },
    /// Closed set of numeric literals, e.g. rack tiers 5 through 8.
    NumberChoice { allowed: &'static [f64] },
}

impl FieldKind {
    pub fn type_tag(&self) -> &'static str {
        match self {
            Self::Text { .. } => "string",
            Self::Number { .. } => "number",
            Self::Boolean => "boolean",
            Self::Enum { .. } => "enum",
            Self::EnumArray { .. } => "array",
            Self::NumberChoice { .. } => "number",
        }
    }
}

/// One schema entry. `required` applies only while the field is active.
#[derive(Clone, Debug)]
pub struct FieldSpec {
    pub path: &'static str,
    pub kind: FieldKind,
    pub required: bool,
}

impl FieldSpec {
    pub fn required(path: &'static str, kind: FieldKind) -> Self {
        Self { path, kind, required: true }
    }

    pub fn optional(path: &'static str, kind: FieldKind) -> Self {
        Self { path, kind, required: false }
    }

    /// Top-level section the field lives under.
    pub fn section(&self) -> &'static str {
        self.path.split('.').next().unwrap_or(self.path)
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum SchemaError {
    #[error("field path `{0}` is declared more than once")]
    DuplicatePath(&'static str),
    #[error("pattern `{pattern}` does not compile: {reason}")]
    InvalidPattern { pattern: &'static str, reason: String },
    #[error("conditional rule references unknown field `{0}`")]
    UnknownRuleField(&'static str),
    #[error("step `{step}` owns unknown field `{path}`")]
    UnknownStepField { step: &'static str, path: &'static str },
    #[error("field `{0}` is not owned by exactly one step")]
    StepOwnership(&'static str),
}

/// Ordered field declarations with unique dotted paths.
#[derive(Clone, Debug)]
pub struct FieldSchema {
    fields: Vec<FieldSpec>,
    index: HashMap<&'static str, usize>,
}

impl FieldSchema {
    pub fn new(fields: Vec<FieldSpec>) -> Result<Self, SchemaError> {
        let mut index = HashMap::with_capacity(fields.len());
        for (position, field) in fields.iter().enumerate() {
            if index.insert(field.path, position).is_some() {
                return Err(SchemaError::DuplicatePath(field.path));
            }
        }
        Ok(Self { fields, index })
    }

    pub fn get(&self, path: &str) -> Option<&FieldSpec> {
        self.index.get(path).map(|position| &self.fields[*position])
    }

    pub fn contains(&self, path: &str) -> bool {
        self.index.contains_key(path)
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    pub fn paths(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.fields.iter().map(|field| field.path)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::{FieldKind, FieldSchema, FieldSpec, Pattern, SchemaError};

    #[test]
    fn duplicate_paths_are_rejected() {
        let error = FieldSchema::new(vec![
            FieldSpec::required("customer.name", FieldKind::Boolean),
            FieldSpec::optional("customer.name", FieldKind::Boolean),
        ])
        .expect_err("duplicate path");

        assert_eq!(error, SchemaError::DuplicatePath("customer.name"));
    }

    #[test]
    fn patterns_are_anchored_to_the_whole_value() {
        let pattern = Pattern::whole("[0-9]{3}", "three digits").expect("pattern compiles");

        assert!(pattern.is_match("123"));
        assert!(!pattern.is_match("a123"));
        assert!(!pattern.is_match("1234"));
    }

    #[test]
    fn broken_patterns_surface_schema_errors() {
        let error = Pattern::whole("([0-9]", "unbalanced").expect_err("pattern must not compile");
        assert!(matches!(error, SchemaError::InvalidPattern { pattern: "([0-9]", .. }));
    }

    #[test]
    fn section_is_the_first_path_segment() {
        let field = FieldSpec::optional("system.hvac.ac", FieldKind::Boolean);
        assert_eq!(field.section(), "system");
    }
}
