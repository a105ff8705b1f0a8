//! Validation engine: full and partial evaluation over resolved shapes.

use crate::annotation::{FieldAnnotation, ResolvedShape, resolve};
use crate::cache::ShapeCache;
use crate::error::{CheckError, ConfigurationError};
use crate::registry::RuleRegistry;
use crate::rules::RuleInput;
use crate::shape::{FieldDeclaration, FieldSource, RuleSpec, Shape, ShapeDeclaration};
use crate::value::{FieldKind, FieldValue};
use payload_guard_shared::Validated;
use std::any::TypeId;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Message recorded when partial validation names a field the shape lacks.
pub const FIELD_NOT_FOUND: &str = "field not found";

/// Why a field entry exists in a [`FieldErrors`] map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    /// A declared rule rejected the value.
    Rule {
        /// Name of the first failing rule.
        rule: Box<str>,
    },
    /// Partial validation named a field that is not on the shape.
    UnknownField,
    /// A request-level check outside the declarative rules failed.
    Custom,
}

/// One field's failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldFailure {
    message: String,
    kind: FailureKind,
}

impl FieldFailure {
    /// Failure produced by a rule.
    pub fn rule(rule: &str, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            kind: FailureKind::Rule { rule: rule.into() },
        }
    }

    /// Usage failure for a field missing from the shape.
    #[must_use]
    pub fn unknown_field() -> Self {
        Self {
            message: FIELD_NOT_FOUND.to_owned(),
            kind: FailureKind::UnknownField,
        }
    }

    /// Failure from a custom request-level check.
    pub fn custom(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            kind: FailureKind::Custom,
        }
    }

    /// Rendered message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Failure kind.
    #[must_use]
    pub const fn kind(&self) -> &FailureKind {
        &self.kind
    }
}

/// External field name → first failure. Iterates in key order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors {
    entries: BTreeMap<String, FieldFailure>,
}

impl FieldErrors {
    /// Empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a failure unless the field already has one. Returns true when
    /// the entry was inserted.
    pub fn insert(&mut self, field: impl Into<String>, failure: FieldFailure) -> bool {
        match self.entries.entry(field.into()) {
            std::collections::btree_map::Entry::Vacant(slot) => {
                slot.insert(failure);
                true
            },
            std::collections::btree_map::Entry::Occupied(_) => false,
        }
    }

    /// Failure recorded for `field`.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&FieldFailure> {
        self.entries.get(field)
    }

    /// Message recorded for `field`.
    #[must_use]
    pub fn message(&self, field: &str) -> Option<&str> {
        self.get(field).map(FieldFailure::message)
    }

    /// Whether `field` has an entry.
    #[must_use]
    pub fn contains(&self, field: &str) -> bool {
        self.entries.contains_key(field)
    }

    /// Number of failed fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true when no field failed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldFailure)> {
        self.entries
            .iter()
            .map(|(field, failure)| (field.as_str(), failure))
    }

    /// Field → message map.
    #[must_use]
    pub fn messages(&self) -> BTreeMap<String, String> {
        self.entries
            .iter()
            .map(|(field, failure)| (field.clone(), failure.message.clone()))
            .collect()
    }

    /// Whether any entry is a usage error rather than a value failure.
    #[must_use]
    pub fn has_unknown_fields(&self) -> bool {
        self.entries
            .values()
            .any(|failure| failure.kind == FailureKind::UnknownField)
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.entries.is_empty() {
            return formatter.write_str("validation failed");
        }
        for (index, (field, failure)) in self.entries.iter().enumerate() {
            if index > 0 {
                formatter.write_str("; ")?;
            }
            write!(formatter, "{field}: {}", failure.message)?;
        }
        Ok(())
    }
}

impl std::error::Error for FieldErrors {}

/// Outcome of a validation run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// Every evaluated field passed.
    Valid,
    /// At least one field failed.
    Invalid(FieldErrors),
}

impl Verdict {
    /// `Valid` for an empty map, `Invalid` otherwise.
    #[must_use]
    pub fn from_errors(errors: FieldErrors) -> Self {
        if errors.is_empty() {
            Self::Valid
        } else {
            Self::Invalid(errors)
        }
    }

    /// Returns true for `Valid`.
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        matches!(self, Self::Valid)
    }

    /// Field errors, when invalid.
    #[must_use]
    pub const fn errors(&self) -> Option<&FieldErrors> {
        match self {
            Self::Valid => None,
            Self::Invalid(errors) => Some(errors),
        }
    }

    /// Convert to a `Result`.
    pub fn into_result(self) -> Result<(), FieldErrors> {
        match self {
            Self::Valid => Ok(()),
            Self::Invalid(errors) => Err(errors),
        }
    }
}

/// Which fields to evaluate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection<'a> {
    /// Every field on the shape.
    All,
    /// Only the named fields (external names, then identifiers). An empty
    /// list selects every field.
    Only(&'a [&'a str]),
}

/// Validation engine bound to one registry.
#[derive(Debug)]
pub struct Validator {
    registry: Arc<RuleRegistry>,
    cache: ShapeCache,
}

impl Validator {
    /// Engine owning `registry`.
    #[must_use]
    pub fn new(registry: RuleRegistry) -> Self {
        Self::with_shared_registry(Arc::new(registry))
    }

    /// Engine sharing an existing registry.
    #[must_use]
    pub fn with_shared_registry(registry: Arc<RuleRegistry>) -> Self {
        Self {
            registry,
            cache: ShapeCache::new(),
        }
    }

    /// Registry used for resolution.
    #[must_use]
    pub fn registry(&self) -> &RuleRegistry {
        &self.registry
    }

    /// Resolve and cache the annotations of `T`. Call at startup so that
    /// configuration errors abort before any request is served.
    pub fn prepare<T: Shape>(&self) -> Result<Arc<ResolvedShape>, ConfigurationError> {
        self.cache
            .get_or_try_insert_with(TypeId::of::<T>(), || resolve(&T::declaration(), &self.registry))
    }

    /// Resolve a dynamic declaration. Not cached.
    pub fn resolve(&self, declaration: &ShapeDeclaration) -> Result<ResolvedShape, ConfigurationError> {
        resolve(declaration, &self.registry)
    }

    /// Full validation.
    pub fn validate<T: Shape>(&self, object: &T) -> Result<Verdict, ConfigurationError> {
        let shape = self.prepare::<T>()?;
        Ok(self.validate_with(&shape, object, Selection::All))
    }

    /// Partial validation over `fields`. Unknown names are reported as
    /// [`FailureKind::UnknownField`]; an empty list validates everything.
    pub fn validate_partial<T: Shape>(
        &self,
        object: &T,
        fields: &[&str],
    ) -> Result<Verdict, ConfigurationError> {
        let shape = self.prepare::<T>()?;
        Ok(self.validate_with(&shape, object, Selection::Only(fields)))
    }

    /// Full validation, returning the unchanged object as proof on success.
    pub fn check<T: Shape>(&self, object: T) -> Result<Validated<T>, CheckError> {
        match self.validate(&object)? {
            Verdict::Valid => Ok(Validated::new(object)),
            Verdict::Invalid(errors) => Err(CheckError::Invalid(errors)),
        }
    }

    /// Evaluate a resolved shape against any field source.
    #[must_use]
    pub fn validate_with(
        &self,
        shape: &ResolvedShape,
        source: &dyn FieldSource,
        selection: Selection<'_>,
    ) -> Verdict {
        let mut errors = FieldErrors::new();
        match selection {
            Selection::Only(names) if !names.is_empty() => {
                for name in names {
                    match shape.field_by_name(name) {
                        Some(field) => {
                            if let Some(failure) = evaluate_field(field, source) {
                                errors.insert(&*field.wire_name, failure);
                            }
                        },
                        None => {
                            errors.insert(*name, FieldFailure::unknown_field());
                        },
                    }
                }
            },
            Selection::All | Selection::Only(_) => {
                for field in shape.fields() {
                    if let Some(failure) = evaluate_field(field, source) {
                        errors.insert(&*field.wire_name, failure);
                    }
                }
            },
        }

        tracing::debug!(
            shape = shape.name(),
            failed = errors.len(),
            partial = matches!(selection, Selection::Only(names) if !names.is_empty()),
            "validated object"
        );
        Verdict::from_errors(errors)
    }

    /// Check a single value against rule specs, keyed under `name`.
    /// Cross-field rules are rejected since there is no enclosing object.
    pub fn check_value(
        &self,
        name: &str,
        kind: FieldKind,
        value: FieldValue<'_>,
        rules: &[RuleSpec],
    ) -> Result<Verdict, ConfigurationError> {
        let mut field = FieldDeclaration::new(name, kind);
        field.rules = rules.to_vec();
        let shape = self.resolve(&ShapeDeclaration::new("value").field(field))?;
        Ok(self.validate_with(&shape, &SingleValue { name, value }, Selection::All))
    }
}

struct SingleValue<'a> {
    name: &'a str,
    value: FieldValue<'a>,
}

impl FieldSource for SingleValue<'_> {
    fn field_value(&self, ident: &str) -> Option<FieldValue<'_>> {
        (ident == self.name).then_some(self.value)
    }
}

fn evaluate_field(field: &FieldAnnotation, source: &dyn FieldSource) -> Option<FieldFailure> {
    let value = source.field_value(&field.ident).unwrap_or(FieldValue::Absent);
    if field.optional && value.is_empty() {
        return None;
    }

    field.rules.iter().find_map(|bound| {
        let input = RuleInput {
            value,
            param: &bound.param,
            object: source,
        };
        (!bound.rule.check(&input)).then(|| {
            FieldFailure::rule(
                bound.rule.name(),
                bound
                    .rule
                    .template()
                    .render(&field.wire_name, &bound.display_param, &value),
            )
        })
    })
}
