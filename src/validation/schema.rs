//! Rule registry and compiled schemas

use super::rule::{DefaultValue, SharedRule};
use std::collections::{HashMap, HashSet};
use thiserror::Error;

/// Faults in a schema definition, raised while compiling at startup
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SchemaError {
    #[error("rule `{0}` is already defined")]
    DuplicateRule(&'static str),

    #[error("unknown rule `{0}`")]
    UnknownRule(&'static str),

    #[error("field `{0}` is declared twice")]
    DuplicateField(&'static str),

    #[error("field `{field}` defaults from `{from}`, which is not declared before it")]
    UnresolvedDefault {
        field: &'static str,
        from: &'static str,
    },

    #[error("cross-field check references undeclared field `{0}`")]
    UnknownCheckField(&'static str),
}

/// Shared rule definitions, keyed by name
///
/// Schemas hold clones of the `Arc`, never copies of the rule.
#[derive(Debug, Default)]
pub struct RuleRegistry {
    rules: HashMap<&'static str, SharedRule>,
}

impl RuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn define(&mut self, name: &'static str, rule: SharedRule) -> Result<(), SchemaError> {
        if self.rules.contains_key(name) {
            return Err(SchemaError::DuplicateRule(name));
        }
        self.rules.insert(name, rule);
        Ok(())
    }

    pub fn get(&self, name: &'static str) -> Result<SharedRule, SchemaError> {
        self.rules.get(name).cloned().ok_or(SchemaError::UnknownRule(name))
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// Whether a field keeps the presence declared by its rule
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    AsDeclared,
    Optional,
}

/// One field of a rule set: the input key and the registry rule it uses
#[derive(Debug, Clone, Copy)]
pub struct FieldDecl {
    pub name: &'static str,
    pub rule: &'static str,
    pub presence: Presence,
}

impl FieldDecl {
    pub const fn new(name: &'static str, rule: &'static str) -> Self {
        Self {
            name,
            rule,
            presence: Presence::AsDeclared,
        }
    }

    /// Embed a rule but allow the field to be absent
    pub const fn optional(name: &'static str, rule: &'static str) -> Self {
        Self {
            name,
            rule,
            presence: Presence::Optional,
        }
    }
}

/// Checks between two coerced fields, run after the per-field pass
#[derive(Debug, Clone, Copy)]
pub enum CrossCheck {
    /// `field` must not be less than `than` (numbers or dates)
    NotLess {
        field: &'static str,
        than: &'static str,
        message: &'static str,
    },
}

/// Declarative description of a schema
#[derive(Debug, Clone, Copy)]
pub struct RuleSet {
    pub name: &'static str,
    pub fields: &'static [FieldDecl],
    pub checks: &'static [CrossCheck],
    /// Reject input keys the schema does not declare
    pub closed: bool,
}

impl RuleSet {
    pub const fn open(name: &'static str, fields: &'static [FieldDecl]) -> Self {
        Self {
            name,
            fields,
            checks: &[],
            closed: false,
        }
    }

    pub const fn closed(mut self) -> Self {
        self.closed = true;
        self
    }

    pub const fn with_checks(mut self, checks: &'static [CrossCheck]) -> Self {
        self.checks = checks;
        self
    }
}

#[derive(Debug, Clone)]
pub struct Field {
    pub name: &'static str,
    pub rule: SharedRule,
    pub required: bool,
}

/// Executable schema produced by [`Schema::compile`]
#[derive(Debug, Clone)]
pub struct Schema {
    pub(crate) name: &'static str,
    pub(crate) fields: Vec<Field>,
    pub(crate) checks: Vec<CrossCheck>,
    pub(crate) closed: bool,
}

impl Schema {
    /// Resolve a rule set against the registry
    pub fn compile(registry: &RuleRegistry, set: &RuleSet) -> Result<Self, SchemaError> {
        let mut seen = HashSet::new();
        let mut fields = Vec::with_capacity(set.fields.len());

        for decl in set.fields {
            if !seen.insert(decl.name) {
                return Err(SchemaError::DuplicateField(decl.name));
            }

            let rule = registry.get(decl.rule)?;

            if let Some(DefaultValue::SameAs(from)) = &rule.default {
                if !fields.iter().any(|f: &Field| f.name == *from) {
                    return Err(SchemaError::UnresolvedDefault {
                        field: decl.name,
                        from: *from,
                    });
                }
            }

            let required = rule.required && decl.presence == Presence::AsDeclared;
            fields.push(Field {
                name: decl.name,
                rule,
                required,
            });
        }

        for check in set.checks {
            let CrossCheck::NotLess { field, than, .. } = *check;
            for name in [field, than] {
                if !seen.contains(name) {
                    return Err(SchemaError::UnknownCheckField(name));
                }
            }
        }

        Ok(Self {
            name: set.name,
            fields,
            checks: set.checks.to_vec(),
            closed: set.closed,
        })
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }
}
