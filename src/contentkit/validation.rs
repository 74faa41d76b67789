//! # Item Validation
//!
//! Before an [`Item`](crate::item::Item) is written to the override storage its
//! fields are checked against a list of [`Rule`]s.
//!
//! - **Default**: every field the item has is required (not blank).
//! - **Custom**: rules given to the item or the manager replace the default
//!   set entirely; they are not merged with it.
//!
//! Length and pattern rules skip empty values, so combine them with
//! [`Rule::required`] when a value must also be present.

use crate::error::{ContentError, Result};
use crate::model::Fields;
use regex::Regex;
use std::collections::BTreeMap;

#[derive(Debug, Clone)]
pub enum RuleKind {
    Required,
    MinLength(usize),
    MaxLength(usize),
    Pattern(Regex),
}

#[derive(Debug, Clone)]
pub struct Rule {
    pub fields: Vec<String>,
    pub kind: RuleKind,
    pub message: Option<String>,
}

impl Rule {
    pub fn new<I, S>(fields: I, kind: RuleKind) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            fields: fields.into_iter().map(Into::into).collect(),
            kind,
            message: None,
        }
    }

    pub fn required<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(fields, RuleKind::Required)
    }

    pub fn min_length<I, S>(fields: I, min: usize) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(fields, RuleKind::MinLength(min))
    }

    pub fn max_length<I, S>(fields: I, max: usize) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(fields, RuleKind::MaxLength(max))
    }

    pub fn pattern<I, S>(fields: I, pattern: &str) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let regex = Regex::new(pattern)
            .map_err(|e| ContentError::Config(format!("Invalid pattern '{}': {}", pattern, e)))?;
        Ok(Self::new(fields, RuleKind::Pattern(regex)))
    }

    /// Replaces the default error message.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    fn check(&self, field: &str, value: Option<&str>) -> Option<String> {
        let value = value.unwrap_or("");
        let failed = match &self.kind {
            RuleKind::Required => value.trim().is_empty(),
            _ if value.is_empty() => false,
            RuleKind::MinLength(min) => value.chars().count() < *min,
            RuleKind::MaxLength(max) => value.chars().count() > *max,
            RuleKind::Pattern(regex) => !regex.is_match(value),
        };
        if !failed {
            return None;
        }

        if let Some(message) = &self.message {
            return Some(message.replace("{field}", field));
        }
        Some(match &self.kind {
            RuleKind::Required => format!("{} cannot be blank.", field),
            RuleKind::MinLength(min) => {
                format!("{} should contain at least {} characters.", field, min)
            }
            RuleKind::MaxLength(max) => {
                format!("{} should contain at most {} characters.", field, max)
            }
            RuleKind::Pattern(_) => format!("{} is invalid.", field),
        })
    }
}

/// Error messages per field, in rule order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    errors: BTreeMap<String, Vec<String>>,
}

impl ValidationErrors {
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn has(&self, field: &str) -> bool {
        self.errors.contains_key(field)
    }

    pub fn get(&self, field: &str) -> &[String] {
        self.errors.get(field).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn first(&self, field: &str) -> Option<&str> {
        self.get(field).first().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Vec<String>)> {
        self.errors.iter()
    }

    fn add(&mut self, field: &str, message: String) {
        self.errors
            .entry(field.to_string())
            .or_default()
            .push(message);
    }
}

/// One `Required` rule covering every field.
pub fn default_rules(fields: &Fields) -> Vec<Rule> {
    vec![Rule::required(fields.keys().cloned())]
}

pub fn validate(fields: &Fields, rules: &[Rule]) -> ValidationErrors {
    let mut errors = ValidationErrors::default();
    for rule in rules {
        for field in &rule.fields {
            let value = fields.get(field).map(String::as_str);
            if let Some(message) = rule.check(field, value) {
                errors.add(field, message);
            }
        }
    }
    errors
}
