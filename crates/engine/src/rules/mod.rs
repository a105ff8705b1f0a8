//! Rule definitions: predicate, parameter shape, applicable kinds and
//! message template.

pub mod builtin;
pub mod service;

use crate::shape::FieldSource;
use crate::value::{FieldKind, FieldValue, Number};
use std::fmt;
use std::sync::Arc;

pub use service::{PasswordPolicy, RulePolicies, UsernamePolicy};

/// Rule predicate. Must be pure and must not panic.
pub type Predicate = Arc<dyn Fn(&RuleInput<'_>) -> bool + Send + Sync>;

/// Everything a predicate may observe.
pub struct RuleInput<'a> {
    /// Value of the field under check.
    pub value: FieldValue<'a>,
    /// Parsed rule parameter.
    pub param: &'a RuleParam,
    /// The whole candidate object, for cross-field rules.
    pub object: &'a dyn FieldSource,
}

/// Parameter shape a rule accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    /// No parameter allowed.
    None,
    /// Numeric bound. Must be a non-negative integer on sized and `Any` kinds.
    Bound,
    /// Whitespace-separated literal set.
    Words,
    /// Reference to another field compared for equality.
    Field,
    /// Reference to another field compared by order (numeric kinds only).
    OrderedField,
    /// Free-form text.
    Text,
}

/// Resolved rule parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum RuleParam {
    /// No parameter.
    None,
    /// Numeric bound.
    Number(Number),
    /// Literal set.
    Words(Vec<Box<str>>),
    /// Referenced field.
    Field {
        /// Identifier used to read the value.
        ident: Box<str>,
        /// External name used in messages.
        wire: Box<str>,
    },
    /// Free-form text.
    Text(Box<str>),
}

impl RuleParam {
    /// Numeric bound, if any.
    #[must_use]
    pub const fn number(&self) -> Option<Number> {
        match self {
            Self::Number(number) => Some(*number),
            _ => None,
        }
    }

    /// Literal set, empty for other parameter kinds.
    #[must_use]
    pub fn words(&self) -> &[Box<str>] {
        match self {
            Self::Words(words) => words,
            _ => &[],
        }
    }

    /// Value of the referenced field on `object`.
    #[must_use]
    pub fn referenced<'o>(&self, object: &'o dyn FieldSource) -> Option<FieldValue<'o>> {
        match self {
            Self::Field { ident, .. } => object.field_value(ident),
            _ => None,
        }
    }
}

/// Message template with `{field}`, `{param}` and `{unit}` placeholders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageTemplate(Box<str>);

impl MessageTemplate {
    /// Fallback used when a rule declares no template.
    pub const DEFAULT: &'static str = "{field} is invalid";

    /// Wrap a template string.
    pub fn new(template: impl Into<Box<str>>) -> Self {
        Self(template.into())
    }

    /// Raw template text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Render for one failure. `unit` follows the failing value: " characters"
    /// for text, " items" for lists, nothing otherwise.
    #[must_use]
    pub fn render(&self, field: &str, param: &str, value: &FieldValue<'_>) -> String {
        let unit = match value {
            FieldValue::Text(_) => FieldKind::Text.unit_suffix(),
            FieldValue::List(_) => FieldKind::List.unit_suffix(),
            _ => "",
        };
        self.0
            .replace("{field}", field)
            .replace("{param}", param)
            .replace("{unit}", unit)
    }
}

impl Default for MessageTemplate {
    fn default() -> Self {
        Self::new(Self::DEFAULT)
    }
}

/// A named, immutable rule.
#[derive(Clone)]
pub struct Rule {
    name: Box<str>,
    kinds: Option<Vec<FieldKind>>,
    param: ParamKind,
    template: MessageTemplate,
    predicate: Predicate,
}

impl Rule {
    /// Create a rule that applies to every kind and takes no parameter.
    pub fn new<F>(name: impl Into<Box<str>>, predicate: F) -> Self
    where
        F: Fn(&RuleInput<'_>) -> bool + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            kinds: None,
            param: ParamKind::None,
            template: MessageTemplate::default(),
            predicate: Arc::new(predicate),
        }
    }

    /// Restrict the rule to the given kinds.
    #[must_use]
    pub fn applies_to(mut self, kinds: &[FieldKind]) -> Self {
        self.kinds = Some(kinds.to_vec());
        self
    }

    /// Declare the parameter shape.
    #[must_use]
    pub const fn param(mut self, param: ParamKind) -> Self {
        self.param = param;
        self
    }

    /// Set the message template.
    #[must_use]
    pub fn message(mut self, template: impl Into<Box<str>>) -> Self {
        self.template = MessageTemplate::new(template);
        self
    }

    /// Rule name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Parameter shape.
    #[must_use]
    pub const fn param_kind(&self) -> ParamKind {
        self.param
    }

    /// Message template.
    #[must_use]
    pub const fn template(&self) -> &MessageTemplate {
        &self.template
    }

    /// Kinds the rule is restricted to, `None` meaning all.
    #[must_use]
    pub fn kinds(&self) -> Option<&[FieldKind]> {
        self.kinds.as_deref()
    }

    /// Whether the rule can evaluate fields of `kind`. `Any` fields only
    /// take rules without a kind restriction.
    #[must_use]
    pub fn accepts(&self, kind: FieldKind) -> bool {
        self.kinds
            .as_ref()
            .is_none_or(|kinds| kinds.contains(&kind))
    }

    /// Run the predicate.
    #[must_use]
    pub fn check(&self, input: &RuleInput<'_>) -> bool {
        (self.predicate)(input)
    }
}

impl fmt::Debug for Rule {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("Rule")
            .field("name", &self.name)
            .field("kinds", &self.kinds)
            .field("param", &self.param)
            .field("template", &self.template)
            .finish_non_exhaustive()
    }
}
