//! Schema evaluation
//!
//! Every declared field is visited once, in declaration order:
//!
//! 1. absent + optional: the default is applied, if any;
//! 2. absent + required: `required` is reported;
//! 3. the raw value is coerced to the declared type;
//! 4. strings are normalised, then constraints run in order and the first
//!    failing message is kept.
//!
//! Errors accumulate across fields so callers get the whole report at once.
//!
//! Values on the path and query channels arrive as strings. Numbers and
//! booleans are parsed from them, and a value that does not parse is treated
//! as absent rather than rejected: `?from=abc` behaves like no `from` at all
//! and falls back to the field's default. Body values must already carry
//! their JSON type.

use super::{
    rule::{Constraint, DefaultValue, FieldRule, FieldType, Normalize},
    schema::{CrossCheck, Schema},
    FieldError, ValidationError,
};
use chrono::{DateTime, Utc};
use serde_json::{Map, Number, Value};
use std::cmp::Ordering;
use validator::ValidateEmail;

/// Request channel a schema is applied to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    Body,
    Params,
    Query,
}

impl Channel {
    /// Whether raw values arrive as strings
    fn is_textual(self) -> bool {
        matches!(self, Channel::Params | Channel::Query)
    }
}

const REQUIRED: &str = "required";

/// Outcome of coercing one raw value
enum Coerced {
    Value(Value),
    /// Unparsable scalar on a textual channel
    Absent,
    Invalid(String),
}

/// Validate `raw` against `schema`, returning the coerced value bag
pub fn validate(
    schema: &Schema,
    channel: Channel,
    raw: &Value,
) -> Result<Map<String, Value>, ValidationError> {
    let empty = Map::new();
    let input = match raw {
        Value::Object(map) => map,
        Value::Null => &empty,
        other => {
            return Err(ValidationError::new(vec![FieldError::new(
                Vec::new(),
                format!("expected object, received {}", json_type(other)),
            )]))
        }
    };

    let mut output = Map::new();
    let mut errors = Vec::new();

    for field in &schema.fields {
        let path = vec![field.name.to_string()];
        let present = input.get(field.name).filter(|v| !v.is_null());

        let coerced = match present {
            None => None,
            Some(value) => match coerce(&field.rule, channel, value, &path) {
                Ok(Some(value)) => Some(value),
                Ok(None) => None,
                Err(mut field_errors) => {
                    errors.append(&mut field_errors);
                    continue;
                }
            },
        };

        match coerced {
            Some(value) => {
                output.insert(field.name.to_string(), value);
            }
            None => match &field.rule.default {
                Some(DefaultValue::Value(value)) => {
                    output.insert(field.name.to_string(), value.clone());
                }
                Some(DefaultValue::SameAs(source)) => {
                    if let Some(value) = output.get(*source).cloned() {
                        output.insert(field.name.to_string(), value);
                    } else if field.required {
                        errors.push(FieldError::new(path, REQUIRED));
                    }
                }
                None if field.required => errors.push(FieldError::new(path, REQUIRED)),
                None => {}
            },
        }
    }

    if schema.closed {
        for key in input.keys() {
            if schema.field(key).is_none() {
                errors.push(FieldError::new(vec![key.clone()], "unrecognized field"));
            }
        }
    }

    for check in &schema.checks {
        let CrossCheck::NotLess {
            field,
            than,
            message,
        } = *check;

        // Only compare values that passed their own rules
        if let (Some(a), Some(b)) = (output.get(field), output.get(than)) {
            if compare(a, b) == Some(Ordering::Less) {
                errors.push(FieldError::new(vec![field.to_string()], message));
            }
        }
    }

    if errors.is_empty() {
        Ok(output)
    } else {
        tracing::debug!(
            schema = schema.name,
            ?channel,
            error_count = errors.len(),
            "Validation failed"
        );
        Err(ValidationError::new(errors))
    }
}

/// Coerce, normalise and check one present value
///
/// `Ok(None)` means the value counts as absent.
fn coerce(
    rule: &FieldRule,
    channel: Channel,
    raw: &Value,
    path: &[String],
) -> Result<Option<Value>, Vec<FieldError>> {
    let single = |message: String| vec![FieldError::new(path.to_vec(), message)];

    if let FieldType::Array(element) = &rule.field_type {
        let items = match raw {
            Value::Array(items) => items.clone(),
            Value::String(s) if channel.is_textual() => s
                .split(',')
                .filter(|part| !part.trim().is_empty())
                .map(|part| Value::String(part.to_string()))
                .collect(),
            other => return Err(single(mismatch("array", other))),
        };

        let mut values = Vec::with_capacity(items.len());
        let mut errors = Vec::new();
        for (index, item) in items.iter().enumerate() {
            let mut item_path = path.to_vec();
            item_path.push(index.to_string());
            match coerce(element, channel, item, &item_path) {
                Ok(Some(value)) => values.push(value),
                Ok(None) => errors.push(FieldError::new(item_path, REQUIRED)),
                Err(mut item_errors) => errors.append(&mut item_errors),
            }
        }
        if !errors.is_empty() {
            return Err(errors);
        }

        let value = Value::Array(values);
        return match check_constraints(rule, &value) {
            Some(message) => Err(single(message.to_string())),
            None => Ok(Some(value)),
        };
    }

    let value = match coerce_scalar(&rule.field_type, channel, raw) {
        Coerced::Value(value) => value,
        Coerced::Absent => return Ok(None),
        Coerced::Invalid(message) => return Err(single(message)),
    };

    let value = match value {
        Value::String(s) => Value::String(normalize(&rule.normalize, s)),
        other => other,
    };

    if let (FieldType::Enum(allowed), Value::String(s)) = (&rule.field_type, &value) {
        if !allowed.contains(&s.as_str()) {
            return Err(single(format!("must be one of: {}", allowed.join(", "))));
        }
    }

    match check_constraints(rule, &value) {
        Some(message) => Err(single(message.to_string())),
        None => Ok(Some(value)),
    }
}

fn coerce_scalar(field_type: &FieldType, channel: Channel, raw: &Value) -> Coerced {
    let textual = channel.is_textual();

    match (field_type, raw) {
        (FieldType::String | FieldType::Enum(_), Value::String(s)) => {
            Coerced::Value(Value::String(s.clone()))
        }

        (FieldType::Number, Value::Number(n)) => Coerced::Value(Value::Number(n.clone())),
        (FieldType::Number, Value::String(s)) if textual => s
            .trim()
            .parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
            .map_or(Coerced::Absent, |n| Coerced::Value(Value::Number(n))),

        (FieldType::Integer, Value::Number(n)) => match n.as_i64() {
            Some(i) => Coerced::Value(Value::from(i)),
            None => Coerced::Invalid("expected integer, received number".to_string()),
        },
        (FieldType::Integer, Value::String(s)) if textual => s
            .trim()
            .parse::<i64>()
            .map_or(Coerced::Absent, |i| Coerced::Value(Value::from(i))),

        (FieldType::Boolean, Value::Bool(b)) => Coerced::Value(Value::Bool(*b)),
        (FieldType::Boolean, Value::String(s)) if textual => match s.trim() {
            "true" => Coerced::Value(Value::Bool(true)),
            "false" => Coerced::Value(Value::Bool(false)),
            _ => Coerced::Absent,
        },

        (FieldType::Date, Value::String(s)) => match DateTime::parse_from_rfc3339(s.trim()) {
            Ok(date) => Coerced::Value(Value::String(date.with_timezone(&Utc).to_rfc3339())),
            Err(_) => Coerced::Invalid("invalid date".to_string()),
        },

        (field_type, other) => Coerced::Invalid(mismatch(field_type.name(), other)),
    }
}

fn normalize(steps: &[Normalize], mut value: String) -> String {
    for step in steps {
        value = match step {
            Normalize::Trim => value.trim().to_string(),
            Normalize::Lowercase => value.to_lowercase(),
        };
    }
    value
}

/// First failing constraint message, if any
fn check_constraints(rule: &FieldRule, value: &Value) -> Option<&'static str> {
    rule.constraints
        .iter()
        .find(|constraint| !satisfies(constraint, value))
        .map(|constraint| match constraint {
            Constraint::MinLength(_, m)
            | Constraint::MaxLength(_, m)
            | Constraint::Email(m)
            | Constraint::Predicate(_, m)
            | Constraint::Min(_, m)
            | Constraint::Max(_, m)
            | Constraint::MinItems(_, m)
            | Constraint::NotBeforeNow(m) => *m,
        })
}

fn satisfies(constraint: &Constraint, value: &Value) -> bool {
    match (constraint, value) {
        (Constraint::MinLength(len, _), Value::String(s)) => s.chars().count() >= *len,
        (Constraint::MaxLength(len, _), Value::String(s)) => s.chars().count() <= *len,
        (Constraint::Email(_), Value::String(s)) => s.validate_email(),
        (Constraint::Predicate(check, _), Value::String(s)) => check(s),
        (Constraint::Min(bound, _), Value::Number(n)) => n.as_f64().is_some_and(|v| v >= *bound),
        (Constraint::Max(bound, _), Value::Number(n)) => n.as_f64().is_some_and(|v| v <= *bound),
        (Constraint::MinItems(count, _), Value::Array(items)) => items.len() >= *count,
        (Constraint::NotBeforeNow(_), Value::String(s)) => parse_date(s).is_some_and(|d| d >= Utc::now()),
        // Constraint does not apply to this type
        _ => true,
    }
}

fn compare(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(a), Value::Number(b)) => a.as_f64()?.partial_cmp(&b.as_f64()?),
        (Value::String(a), Value::String(b)) => Some(parse_date(a)?.cmp(&parse_date(b)?)),
        _ => None,
    }
}

fn parse_date(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|d| d.with_timezone(&Utc))
}

fn mismatch(expected: &str, received: &Value) -> String {
    format!("expected {}, received {}", expected, json_type(received))
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
