//! Declared shapes: the static annotation table a target structure exposes.
//!
//! Static shapes come from `#[derive(Validate)]`; dynamic shapes are built
//! with [`ShapeDeclaration::new`] or loaded from schema documents.

use crate::value::{FieldKind, FieldValue};
use std::fmt;

/// Read access to a candidate object's fields by identifier.
pub trait FieldSource {
    /// Value of the field named `ident`, or `None` when the shape has no
    /// such field.
    fn field_value(&self, ident: &str) -> Option<FieldValue<'_>>;
}

/// A statically declared shape.
pub trait Shape: FieldSource + 'static {
    /// Annotation table for the shape. Must be deterministic.
    fn declaration() -> ShapeDeclaration;
}

/// One `(name, param)` pair as written at the declaration site.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleSpec {
    /// Rule name.
    pub name: Box<str>,
    /// Raw parameter text, if any.
    pub param: Option<Box<str>>,
}

impl RuleSpec {
    /// Create a rule spec.
    pub fn new(name: impl Into<Box<str>>, param: Option<&str>) -> Self {
        Self {
            name: name.into(),
            param: param.map(Into::into),
        }
    }

    /// Parse `name` or `name=param` (surrounding whitespace trimmed).
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        match raw.split_once('=') {
            Some((name, param)) => Self::new(name.trim(), Some(param.trim())),
            None => Self::new(raw.trim(), None),
        }
    }
}

impl fmt::Display for RuleSpec {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.param {
            Some(param) => write!(formatter, "{}={param}", self.name),
            None => formatter.write_str(&self.name),
        }
    }
}

/// Declared metadata for one field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDeclaration {
    /// Identifier on the target structure.
    pub ident: Box<str>,
    /// External name override.
    pub wire_name: Option<Box<str>>,
    /// Field kind.
    pub kind: FieldKind,
    /// True when the field type can hold "no value" by itself.
    pub nullable: bool,
    /// Rules in declaration order.
    pub rules: Vec<RuleSpec>,
}

impl FieldDeclaration {
    /// Start a field declaration without rules.
    pub fn new(ident: impl Into<Box<str>>, kind: FieldKind) -> Self {
        Self {
            ident: ident.into(),
            wire_name: None,
            kind,
            nullable: false,
            rules: Vec::new(),
        }
    }

    /// Mark whether the field type has its own "no value" state.
    #[must_use]
    pub const fn nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }

    /// Set the external name.
    #[must_use]
    pub fn wire_name(mut self, wire_name: impl Into<Box<str>>) -> Self {
        self.wire_name = Some(wire_name.into());
        self
    }

    /// Append a rule.
    #[must_use]
    pub fn rule(mut self, name: impl Into<Box<str>>, param: Option<&str>) -> Self {
        self.rules.push(RuleSpec::new(name, param));
        self
    }

    /// External name: explicit wire name, else the identifier.
    #[must_use]
    pub fn external_name(&self) -> &str {
        self.wire_name.as_deref().unwrap_or(&self.ident)
    }
}

/// Declared metadata for a whole shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShapeDeclaration {
    /// Shape name used in diagnostics.
    pub name: Box<str>,
    /// Fields in declaration order.
    pub fields: Vec<FieldDeclaration>,
}

impl ShapeDeclaration {
    /// Start an empty shape.
    pub fn new(name: impl Into<Box<str>>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    /// Append a field.
    #[must_use]
    pub fn field(mut self, field: FieldDeclaration) -> Self {
        self.fields.push(field);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rule_spec_parses_optional_param() {
        assert_eq!(RuleSpec::parse("required"), RuleSpec::new("required", None));
        assert_eq!(RuleSpec::parse(" min = 8 "), RuleSpec::new("min", Some("8")));
        assert_eq!(
            RuleSpec::parse("one_of=a b=c"),
            RuleSpec::new("one_of", Some("a b=c"))
        );
        assert_eq!(RuleSpec::parse("min=8").to_string(), "min=8");
    }

    #[test]
    fn external_name_defaults_to_identifier() {
        let plain = FieldDeclaration::new("email", FieldKind::Text);
        let renamed = FieldDeclaration::new("confirm_password", FieldKind::Text)
            .wire_name("confirmPassword");

        assert_eq!(plain.external_name(), "email");
        assert_eq!(renamed.external_name(), "confirmPassword");
    }
}
