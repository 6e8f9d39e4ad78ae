//! Field rules
//!
//! A [`FieldRule`] describes one field: its type, whether it may be absent,
//! how strings are normalised, and the constraints checked afterwards. Rules
//! are built once and shared as [`SharedRule`] so every schema that embeds a
//! rule sees the same definition.

use serde_json::Value;
use std::sync::Arc;

pub type SharedRule = Arc<FieldRule>;

/// Declared type of a field
#[derive(Debug, Clone)]
pub enum FieldType {
    String,
    Number,
    Integer,
    Boolean,
    /// RFC 3339 timestamp
    Date,
    /// String drawn from a fixed value set
    Enum(Vec<&'static str>),
    /// Array whose elements follow another rule
    Array(SharedRule),
}

impl FieldType {
    pub fn name(&self) -> &'static str {
        match self {
            FieldType::String | FieldType::Enum(_) => "string",
            FieldType::Number => "number",
            FieldType::Integer => "integer",
            FieldType::Boolean => "boolean",
            FieldType::Date => "date",
            FieldType::Array(_) => "array",
        }
    }
}

/// String normalisation, applied in declaration order before constraints
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Normalize {
    Trim,
    Lowercase,
}

/// A single check; each carries the message reported when it fails
#[derive(Debug, Clone)]
pub enum Constraint {
    MinLength(usize, &'static str),
    MaxLength(usize, &'static str),
    Email(&'static str),
    Predicate(fn(&str) -> bool, &'static str),
    Min(f64, &'static str),
    Max(f64, &'static str),
    MinItems(usize, &'static str),
    /// Dates only: must not lie before the moment of validation
    NotBeforeNow(&'static str),
}

/// Value used when an optional field is absent
#[derive(Debug, Clone)]
pub enum DefaultValue {
    Value(Value),
    /// Copy the coerced value of an earlier field
    SameAs(&'static str),
}

#[derive(Debug, Clone)]
pub struct FieldRule {
    pub field_type: FieldType,
    pub required: bool,
    pub normalize: Vec<Normalize>,
    pub constraints: Vec<Constraint>,
    pub default: Option<DefaultValue>,
}

impl FieldRule {
    pub fn string() -> RuleBuilder {
        RuleBuilder::new(FieldType::String)
    }

    pub fn number() -> RuleBuilder {
        RuleBuilder::new(FieldType::Number)
    }

    pub fn integer() -> RuleBuilder {
        RuleBuilder::new(FieldType::Integer)
    }

    pub fn boolean() -> RuleBuilder {
        RuleBuilder::new(FieldType::Boolean)
    }

    pub fn date() -> RuleBuilder {
        RuleBuilder::new(FieldType::Date)
    }

    pub fn one_of(values: &[&'static str]) -> RuleBuilder {
        RuleBuilder::new(FieldType::Enum(values.to_vec()))
    }

    pub fn array(element: SharedRule) -> RuleBuilder {
        RuleBuilder::new(FieldType::Array(element))
    }
}

/// Fluent builder for [`FieldRule`]
#[derive(Debug, Clone)]
pub struct RuleBuilder {
    rule: FieldRule,
}

impl RuleBuilder {
    fn new(field_type: FieldType) -> Self {
        Self {
            rule: FieldRule {
                field_type,
                required: true,
                normalize: Vec::new(),
                constraints: Vec::new(),
                default: None,
            },
        }
    }

    pub fn optional(mut self) -> Self {
        self.rule.required = false;
        self
    }

    pub fn trim(mut self) -> Self {
        self.rule.normalize.push(Normalize::Trim);
        self
    }

    pub fn lowercase(mut self) -> Self {
        self.rule.normalize.push(Normalize::Lowercase);
        self
    }

    pub fn min_length(mut self, len: usize, message: &'static str) -> Self {
        self.rule.constraints.push(Constraint::MinLength(len, message));
        self
    }

    pub fn max_length(mut self, len: usize, message: &'static str) -> Self {
        self.rule.constraints.push(Constraint::MaxLength(len, message));
        self
    }

    pub fn email(mut self, message: &'static str) -> Self {
        self.rule.constraints.push(Constraint::Email(message));
        self
    }

    pub fn predicate(mut self, check: fn(&str) -> bool, message: &'static str) -> Self {
        self.rule.constraints.push(Constraint::Predicate(check, message));
        self
    }

    pub fn min(mut self, bound: f64, message: &'static str) -> Self {
        self.rule.constraints.push(Constraint::Min(bound, message));
        self
    }

    pub fn max(mut self, bound: f64, message: &'static str) -> Self {
        self.rule.constraints.push(Constraint::Max(bound, message));
        self
    }

    pub fn min_items(mut self, count: usize, message: &'static str) -> Self {
        self.rule.constraints.push(Constraint::MinItems(count, message));
        self
    }

    pub fn not_before_now(mut self, message: &'static str) -> Self {
        self.rule.constraints.push(Constraint::NotBeforeNow(message));
        self
    }

    /// A default makes the field optional
    pub fn default_value(mut self, value: Value) -> Self {
        self.rule.required = false;
        self.rule.default = Some(DefaultValue::Value(value));
        self
    }

    /// Default to another field's value; makes the field optional
    pub fn default_from(mut self, field: &'static str) -> Self {
        self.rule.required = false;
        self.rule.default = Some(DefaultValue::SameAs(field));
        self
    }

    pub fn build(self) -> SharedRule {
        Arc::new(self.rule)
    }
}
